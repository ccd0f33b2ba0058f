//! Document-store backend: view models as documents in an
//! eventually-consistent store.
//!
//! Every view model is one document whose id is its storage identifier
//! (`namespace/key`). Loads by id are always current; queries run against
//! an index that may lag behind recent commits unless they ask for
//! non-stale results.
//!
//! ## Example
//!
//! ```ignore
//! use viewmodels::document::{self, EmbeddedDocumentStore};
//!
//! let repo = document::repository(EmbeddedDocumentStore::new());
//! repo.add("woftam", PlayerCard::new("woftam"))?;
//! repo.update_where(|c: &PlayerCard| c.score == 0, |c| c.score = 1)?;
//! ```

mod config;
mod embedded;
mod reader;
mod writer;

use crate::error::StoreError;
use crate::query::Query;
use crate::repository::SplitRepository;
use crate::view_model::ViewModel;

pub use config::{
    DocumentStoreConfig, IndexingMode, SweepOptions, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    SWEEP_PAGE_SIZE,
};
pub use embedded::{EmbeddedDocumentStore, EmbeddedSession};
pub use reader::DocumentViewModelReader;
pub use writer::DocumentViewModelWriter;

/// A document returned by a query, with its id and committed version.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<T> {
    pub id: String,
    pub version: u64,
    pub data: T,
}

/// Entry point to a document database.
pub trait DocumentStore: Send + Sync {
    type Session: DocumentSession;

    /// Open a new unit of work. Sessions are never shared between calls.
    fn open_session(&self) -> Result<Self::Session, StoreError>;
}

/// A unit of work against a document store.
///
/// `store` and `delete` only record changes; nothing is visible to other
/// sessions until `save_changes` commits them together.
pub trait DocumentSession {
    /// When enabled, `save_changes` rejects a write whose document changed
    /// since this session last saw it. A document the session never loaded
    /// is expected not to exist.
    fn set_optimistic_concurrency(&mut self, enabled: bool);

    /// Load the latest committed document, or this session's pending copy.
    fn load<T: ViewModel>(&mut self, id: &str) -> Result<Option<T>, StoreError>;

    fn store<T: ViewModel>(&mut self, id: &str, entity: &T) -> Result<(), StoreError>;

    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Query the documents of `T`'s namespace through the index.
    ///
    /// The store applies its own result cap on top of `query.take`.
    fn query<T: ViewModel>(&mut self, query: &Query<'_, T>) -> Result<Vec<Document<T>>, StoreError>;

    /// Commit every recorded change atomically.
    fn save_changes(&mut self) -> Result<(), StoreError>;
}

/// Reader and writer over one document store.
pub type DocumentViewModelRepository<S> =
    SplitRepository<DocumentViewModelReader<S>, DocumentViewModelWriter<S>>;

/// Build a reader/writer pair over `store`.
pub fn repository<S: DocumentStore + Clone>(store: S) -> DocumentViewModelRepository<S> {
    SplitRepository::new(
        DocumentViewModelReader::new(store.clone()),
        DocumentViewModelWriter::new(store),
    )
}
