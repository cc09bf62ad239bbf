//! Catalog layer: feed aggregation, deduplication and querying
//!
//! This module fetches extension listings from several feeds, merges them into
//! one canonical set keyed by package name, and derives filtered and sorted
//! views over that set.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ FeedSource  │────▶│ Aggregator  │────▶│   Session   │
//! │  (fetch)    │     │(merge/dedup)│     │ (canonical  │
//! └─────────────┘     └─────────────┘     │  + query)   │
//!                            │            └─────────────┘
//!                            ▼                   │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Version   │     │    Query    │
//!                     │ (is_newer)  │     │(filter/sort)│
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`aggregator`]: Concurrent multi-feed load with per-feed failure isolation
//! - [`error`]: Error types for feed fetching and catalog loading
//! - [`feed`]: Feed trait and the HTTP/file implementation
//! - [`query`]: Filter and sort engine producing the view
//! - [`session`]: State container owning the canonical set and query state
//! - [`types`]: Extension and source records decoded from untrusted JSON
//! - [`version`]: Dotted numeric version comparison

pub mod aggregator;
pub mod error;
pub mod feed;
pub mod query;
pub mod session;
pub mod types;
pub mod version;
