//! Feed test utilities

use mockito::{Mock, ServerGuard};
use serde_json::{Value, json};

/// Minimal index record with one source per entry of `source_urls`
pub fn record(pkg: &str, lang: &str, version: &str, source_urls: &[&str]) -> Value {
    let sources: Vec<Value> = source_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "id": i.to_string(),
                "name": format!("{pkg} #{i}"),
                "baseUrl": url,
                "lang": lang,
            })
        })
        .collect();

    json!({
        "pkg": pkg,
        "name": format!("Tachiyomi: {pkg}"),
        "lang": lang,
        "version": version,
        "nsfw": 0,
        "apk": format!("{pkg}-v{version}.apk"),
        "sources": sources,
    })
}

/// Serve `records` as a JSON array at `path`
pub async fn serve_feed(server: &mut ServerGuard, path: &str, records: Vec<Value>) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(Value::Array(records).to_string())
        .create_async()
        .await
}

/// Answer `path` with `status` and an empty body
pub async fn serve_status(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .create_async()
        .await
}
