//! Prober trait and implementations for checking whether a URL responds

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PROBE_TIMEOUT_MS;
use crate::probe::error::ProbeError;

/// Browser-like agent; some hosts refuse unknown clients
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Outcome of one liveness probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub live: bool,
    /// Upstream HTTP status, when one was observed
    pub status: Option<u16>,
}

impl ProbeResult {
    pub fn live(status: u16) -> Self {
        Self {
            live: true,
            status: Some(status),
        }
    }

    pub fn dead(status: Option<u16>) -> Self {
        Self {
            live: false,
            status,
        }
    }

    /// Badge text: `LIVE`, `DIE (521)` or `DIE`
    pub fn label(&self) -> String {
        match (self.live, self.status) {
            (true, _) => "LIVE".to_string(),
            (false, Some(status)) => format!("DIE ({status})"),
            (false, None) => "DIE".to_string(),
        }
    }
}

/// Trait for classifying a URL as reachable or unreachable
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probes a non-empty URL
    ///
    /// # Returns
    /// * `Ok(ProbeResult)` - The upstream answered (or the probe service judged it)
    /// * `Err(ProbeError)` - Transport or probe service failure
    async fn check(&self, url: &str) -> Result<ProbeResult, ProbeError>;
}

/// Response body of the `/proxy-check` service
#[derive(Debug, Deserialize)]
struct ProxyCheckResponse {
    live: bool,
    /// Numeric status, or a text marker such as "Connection Failed"
    #[serde(default)]
    status: Value,
}

/// Prober delegating to a `GET /proxy-check?url=...` service
pub struct ProxyProber {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyProber {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("extension-catalog")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Prober for ProxyProber {
    async fn check(&self, url: &str) -> Result<ProbeResult, ProbeError> {
        let endpoint = format!("{}/proxy-check", self.base_url);
        let request_url = reqwest::Url::parse_with_params(&endpoint, &[("url", url)])
            .map_err(|e| ProbeError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let response = self.client.get(request_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Probe service returned status {} for {}", status, url);
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body: ProxyCheckResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse probe service response: {}", e);
            ProbeError::InvalidResponse(e.to_string())
        })?;

        let upstream_status = body.status.as_u64().and_then(|s| u16::try_from(s).ok());

        Ok(ProbeResult {
            live: body.live,
            status: upstream_status,
        })
    }
}

/// Prober issuing the request itself
///
/// Live means the target answered with a status in `200..400`.
pub struct DirectProber {
    client: reqwest::Client,
}

impl DirectProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(BROWSER_USER_AGENT)
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

impl Default for DirectProber {
    fn default() -> Self {
        Self::new(Duration::from_millis(PROBE_TIMEOUT_MS))
    }
}

#[async_trait::async_trait]
impl Prober for DirectProber {
    async fn check(&self, url: &str) -> Result<ProbeResult, ProbeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        debug!("Probe {} answered {}", url, status);

        if (200..400).contains(&status) {
            Ok(ProbeResult::live(status))
        } else {
            Ok(ProbeResult::dead(Some(status)))
        }
    }
}
