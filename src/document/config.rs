//! Configuration for document stores and bulk sweeps.

use serde::{Deserialize, Serialize};

/// Rows fetched per page by `update_where` / `delete_where`.
pub const SWEEP_PAGE_SIZE: usize = 512;

/// Rows returned by a query that does not set `take`.
pub const DEFAULT_PAGE_SIZE: usize = 128;

/// Upper bound on rows returned by any single query.
pub const MAX_PAGE_SIZE: usize = 1024;

/// When committed writes become visible to queries.
///
/// Loads by id always see the latest committed document; only queries go
/// through the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    /// The index is updated as part of every commit.
    #[default]
    Immediate,
    /// Index updates queue up until a query waits for non-stale results or
    /// the store is explicitly asked to catch up.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStoreConfig {
    pub indexing: IndexingMode,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Treat every query as if it asked for non-stale results.
    pub always_wait_for_non_stale_results: bool,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        DocumentStoreConfig {
            indexing: IndexingMode::Immediate,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            always_wait_for_non_stale_results: false,
        }
    }
}

impl DocumentStoreConfig {
    pub fn with_indexing(mut self, indexing: IndexingMode) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn always_wait_for_non_stale_results(mut self) -> Self {
        self.always_wait_for_non_stale_results = true;
        self
    }

    /// Rows a query asking for `requested` will actually get at most.
    pub fn effective_take(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    pub page_size: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            page_size: SWEEP_PAGE_SIZE,
        }
    }
}

impl SweepOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
