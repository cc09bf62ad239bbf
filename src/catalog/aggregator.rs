//! Multi-feed aggregation with per-feed failure isolation and deduplication

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::error::{FeedError, LoadError};
use crate::catalog::feed::FeedSource;
use crate::catalog::types::{Extension, RepoOrigin};
use crate::catalog::version::is_newer;
use crate::config::FeedConfig;

/// Predicate deciding which decoded records enter the catalog
pub type RecordFilter = Arc<dyn Fn(&Extension) -> bool + Send + Sync>;

/// Outcome of fetching a single feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Number of raw records the feed returned
    Fetched { records: usize },
    /// The feed was skipped; carries the error message
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub name: String,
    pub outcome: FeedOutcome,
}

/// Deduplicated, filtered merge of all feeds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    extensions: Vec<Extension>,
    reports: Vec<FeedReport>,
}

impl Catalog {
    pub fn new(extensions: Vec<Extension>, reports: Vec<FeedReport>) -> Self {
        Self {
            extensions,
            reports,
        }
    }

    /// Extensions in first-occurrence order
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Total number of sources across all extensions
    pub fn source_count(&self) -> usize {
        self.extensions.iter().map(|ext| ext.sources.len()).sum()
    }

    pub fn feed_reports(&self) -> &[FeedReport] {
        &self.reports
    }

    pub fn find(&self, pkg: &str) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.pkg == pkg)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Fetches all configured feeds concurrently and merges them into a [`Catalog`]
pub struct FeedAggregator {
    source: Arc<dyn FeedSource>,
    filter: RecordFilter,
}

impl FeedAggregator {
    /// Aggregator keeping only records whose `lang` equals `target_language`
    pub fn new(source: Arc<dyn FeedSource>, target_language: &str) -> Self {
        let target = target_language.to_string();
        Self::with_filter(source, move |ext: &Extension| ext.lang == target)
    }

    /// Aggregator with a custom record predicate
    pub fn with_filter<F>(source: Arc<dyn FeedSource>, filter: F) -> Self
    where
        F: Fn(&Extension) -> bool + Send + Sync + 'static,
    {
        Self {
            source,
            filter: Arc::new(filter),
        }
    }

    /// Load every feed and build the merged catalog
    ///
    /// All fetches are started before any is awaited. A failing feed contributes
    /// no records and is reported in [`Catalog::feed_reports`]; only an invalid
    /// feed configuration fails the whole load.
    pub async fn load(&self, feeds: &[FeedConfig]) -> Result<Catalog, LoadError> {
        validate_feeds(feeds)?;

        let results = join_all(feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        let mut reports = Vec::with_capacity(feeds.len());
        let mut records = Vec::new();

        // Results come back in feed order, independent of completion order
        for (feed, result) in feeds.iter().zip(results) {
            match result {
                Ok(raw) => {
                    reports.push(FeedReport {
                        name: feed.name.clone(),
                        outcome: FeedOutcome::Fetched { records: raw.len() },
                    });
                    records.extend(decode_records(feed, &raw));
                }
                Err(e) => {
                    reports.push(FeedReport {
                        name: feed.name.clone(),
                        outcome: FeedOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        let extensions = dedupe(records.into_iter().filter(|ext| (self.filter)(ext)));

        info!(
            "Loaded {} extensions from {} feeds",
            extensions.len(),
            feeds.len()
        );

        Ok(Catalog::new(extensions, reports))
    }

    async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<Value>, FeedError> {
        debug!("Fetching feed {} from {}", feed.name, feed.url);
        self.source
            .fetch_records(feed)
            .await
            .inspect(|raw| debug!("Feed {} returned {} records", feed.name, raw.len()))
            .inspect_err(|e| warn!("Error loading feed {}: {}", feed.name, e))
    }
}

fn validate_feeds(feeds: &[FeedConfig]) -> Result<(), LoadError> {
    for (index, feed) in feeds.iter().enumerate() {
        if feed.name.trim().is_empty() {
            return Err(LoadError::InvalidFeed {
                index,
                reason: "name is empty".to_string(),
            });
        }
        if feed.url.trim().is_empty() {
            return Err(LoadError::InvalidFeed {
                index,
                reason: format!("url of feed {} is empty", feed.name),
            });
        }
    }
    Ok(())
}

/// Decode one feed's records, stamping each with the feed's origin
fn decode_records(feed: &FeedConfig, raw: &[Value]) -> Vec<Extension> {
    let origin = RepoOrigin::new(&feed.name, &feed.github_url);
    let decoded: Vec<Extension> = raw
        .iter()
        .filter_map(|value| Extension::from_value(value, &origin))
        .collect();

    let skipped = raw.len() - decoded.len();
    if skipped > 0 {
        debug!(
            "Skipped {} records without a usable pkg in feed {}",
            skipped, feed.name
        );
    }

    decoded
}

/// Keep one record per `pkg`, preferring strictly newer versions.
///
/// A replaced record keeps the position of the first occurrence.
fn dedupe(records: impl IntoIterator<Item = Extension>) -> Vec<Extension> {
    let mut unique: IndexMap<String, Extension> = IndexMap::new();

    for ext in records {
        match unique.get_mut(&ext.pkg) {
            Some(existing) => {
                if is_newer(&ext.version, &existing.version) {
                    debug!(
                        "Replacing {} {} ({}) with {} ({})",
                        ext.pkg,
                        existing.version,
                        existing.repo_origin.repo_name,
                        ext.version,
                        ext.repo_origin.repo_name
                    );
                    *existing = ext;
                }
            }
            None => {
                unique.insert(ext.pkg.clone(), ext);
            }
        }
    }

    unique.into_values().collect()
}
