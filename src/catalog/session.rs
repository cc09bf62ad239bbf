//! Session state: canonical catalog plus the query and sort state over it

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};

use crate::catalog::aggregator::{Catalog, FeedAggregator};
use crate::catalog::error::LoadError;
use crate::catalog::query::{self, NsfwFilter, Query, SortField, SortState};
use crate::catalog::types::Extension;
use crate::config::FeedConfig;
use crate::probe::board::ProbeBoard;

/// Shown in place of the result count when loading fails
pub const LOAD_FAILED_MESSAGE: &str = "Không thể tải dữ liệu. Vui lòng thử lại.";

/// Shown when the view has no rows
pub const NO_RESULTS_MESSAGE: &str = "Không tìm thấy extension nào.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loaded,
    Failed(String),
}

/// What the front end should present for the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing loaded yet
    NotLoaded,
    /// Fatal load error, distinct from an empty result
    Failed(String),
    /// Loaded, but the view has no rows
    Empty,
    Results { shown: usize, total: usize },
}

impl ViewStatus {
    /// Localized status line
    pub fn message(&self) -> String {
        match self {
            ViewStatus::NotLoaded => String::new(),
            ViewStatus::Failed(_) => LOAD_FAILED_MESSAGE.to_string(),
            ViewStatus::Empty => NO_RESULTS_MESSAGE.to_string(),
            ViewStatus::Results { shown, total } => {
                format!("Hiển thị {shown} trong tổng số {total} extensions")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    /// Rows in the current view
    pub shown: usize,
    /// Extensions in the canonical set
    pub total: usize,
    /// Sources across the canonical set
    pub sources: usize,
}

/// Owns everything a front end needs between user actions.
///
/// Every state change bumps [`Session::generation`] and moves the probe board
/// along with it, so probe results started against an older view are dropped.
#[derive(Debug, Default)]
pub struct Session {
    catalog: Catalog,
    query: Query,
    sort: SortState,
    load_state: LoadState,
    generation: u64,
    probes: Arc<Mutex<ProbeBoard>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canonical set with a fresh load of `feeds`
    ///
    /// On failure the previous catalog is kept and the session records the
    /// error so it can be presented instead of the stale result.
    pub async fn load(
        &mut self,
        aggregator: &FeedAggregator,
        feeds: &[FeedConfig],
    ) -> Result<&Catalog, LoadError> {
        self.bump();
        match aggregator.load(feeds).await {
            Ok(catalog) => {
                info!(
                    "Session loaded {} extensions with {} sources",
                    catalog.extension_count(),
                    catalog.source_count()
                );
                self.catalog = catalog;
                self.load_state = LoadState::Loaded;
                Ok(&self.catalog)
            }
            Err(e) => {
                error!("Data loading error: {}", e);
                self.load_state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Install an already built catalog
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.load_state = LoadState::Loaded;
        self.bump();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Counter bumped on every change that affects the view
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Probe slots for the current view
    pub fn probe_board(&self) -> Arc<Mutex<ProbeBoard>> {
        Arc::clone(&self.probes)
    }

    pub fn set_query_text(&mut self, text: &str) {
        self.query.text = text.to_string();
        self.bump();
    }

    pub fn set_language(&mut self, language: Option<String>) {
        self.query.language = language.filter(|l| !l.is_empty());
        self.bump();
    }

    pub fn set_nsfw(&mut self, nsfw: NsfwFilter) {
        self.query.nsfw = nsfw;
        self.bump();
    }

    pub fn clear_query(&mut self) {
        self.query = Query::default();
        self.bump();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.bump();
    }

    /// Header-click semantics: same field flips direction, new field sorts ascending
    pub fn sort_by(&mut self, field: SortField) {
        self.sort = self.sort.select(field);
        self.bump();
    }

    /// Recompute the view from the canonical set
    pub fn view(&self) -> Vec<&Extension> {
        query::apply(self.catalog.extensions(), &self.query, self.sort)
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            shown: self.view().len(),
            total: self.catalog.extension_count(),
            sources: self.catalog.source_count(),
        }
    }

    pub fn status(&self) -> ViewStatus {
        match &self.load_state {
            LoadState::Idle => ViewStatus::NotLoaded,
            LoadState::Failed(message) => ViewStatus::Failed(message.clone()),
            LoadState::Loaded => {
                let shown = self.view().len();
                if shown == 0 {
                    ViewStatus::Empty
                } else {
                    ViewStatus::Results {
                        shown,
                        total: self.catalog.extension_count(),
                    }
                }
            }
        }
    }

    pub fn find(&self, pkg: &str) -> Option<&Extension> {
        self.catalog.find(pkg)
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sync(self.generation);
    }
}
