//! Feed trait and HTTP/file implementation for fetching raw catalog records

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::error::FeedError;
use crate::config::{FETCH_TIMEOUT_MS, FeedConfig};

/// Trait for fetching the raw records of one feed
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the feed's JSON array without interpreting the records
    ///
    /// # Returns
    /// * `Ok(Vec<Value>)` - Records in feed order
    /// * `Err(FeedError)` - Network failure, non-2xx status, or a payload that is not a JSON array
    async fn fetch_records(&self, feed: &FeedConfig) -> Result<Vec<Value>, FeedError>;
}

/// Feed source that reads `http(s)://` URLs with reqwest and anything else from disk
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("extension-catalog")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Value, FeedError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Feed returned status {}: {}", status, url);
            return Err(FeedError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("Failed to parse feed response from {}: {}", url, e);
            FeedError::InvalidResponse(e.to_string())
        })
    }

    async fn fetch_local(path: &str) -> Result<Value, FeedError> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        debug!("Reading feed from file {}", path);

        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| FeedError::InvalidResponse(e.to_string()))
    }
}

impl Default for HttpFeedSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(FETCH_TIMEOUT_MS))
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_records(&self, feed: &FeedConfig) -> Result<Vec<Value>, FeedError> {
        let payload = if is_remote(&feed.url) {
            self.fetch_remote(&feed.url).await?
        } else {
            Self::fetch_local(&feed.url).await?
        };

        match payload {
            Value::Array(records) => Ok(records),
            other => Err(FeedError::InvalidResponse(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    fn feed(url: &str) -> FeedConfig {
        FeedConfig::new("Test", url, "https://github.com/test/repo")
    }

    #[tokio::test]
    async fn fetch_records_returns_array_items_in_order() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index.min.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"pkg": "a"}, {"pkg": "b"}]"#)
            .create_async()
            .await;

        let source = HttpFeedSource::default();
        let result = source
            .fetch_records(&feed(&format!("{}/index.min.json", server.url())))
            .await
            .unwrap();

        mock.assert_async().await;
        let pkgs: Vec<_> = result.iter().map(|r| r["pkg"].as_str().unwrap()).collect();
        assert_eq!(pkgs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fetch_records_returns_status_error_for_non_success() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index.min.json")
            .with_status(503)
            .create_async()
            .await;

        let source = HttpFeedSource::default();
        let result = source
            .fetch_records(&feed(&format!("{}/index.min.json", server.url())))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FeedError::Status(503))));
    }

    #[tokio::test]
    async fn fetch_records_returns_invalid_response_for_malformed_json() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index.min.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[{\"pkg\": ")
            .create_async()
            .await;

        let source = HttpFeedSource::default();
        let result = source
            .fetch_records(&feed(&format!("{}/index.min.json", server.url())))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FeedError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_records_rejects_non_array_payload() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index.min.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"extensions": []}"#)
            .create_async()
            .await;

        let source = HttpFeedSource::default();
        let result = source
            .fetch_records(&feed(&format!("{}/index.min.json", server.url())))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FeedError::InvalidResponse(msg)) if msg.contains("an object")));
    }

    #[tokio::test]
    async fn fetch_records_reads_local_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.min.json");
        std::fs::write(&path, r#"[{"pkg": "local"}]"#).unwrap();

        let source = HttpFeedSource::default();
        let result = source
            .fetch_records(&feed(path.to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["pkg"], "local");
    }

    #[tokio::test]
    async fn fetch_records_returns_io_error_for_missing_local_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let source = HttpFeedSource::default();
        let result = source.fetch_records(&feed(path.to_str().unwrap())).await;

        assert!(matches!(result, Err(FeedError::Io(_))));
    }
}
