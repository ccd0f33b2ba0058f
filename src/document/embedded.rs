//! EmbeddedDocumentStore - in-process document store with a lagging index.
//!
//! Documents are kept as serialized JSON bytes plus a version taken from a
//! store-wide counter, so a deleted and re-created document never reuses a
//! version. Queries read a separate index that, in
//! [`IndexingMode::Deferred`], only catches up when asked to.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::identity::SEPARATOR;
use crate::query::Query;
use crate::view_model::ViewModel;

use super::{Document, DocumentSession, DocumentStore, DocumentStoreConfig, IndexingMode};

#[derive(Clone)]
struct StoredDocument {
    bytes: Vec<u8>,
    version: u64,
}

enum IndexUpdate {
    Put { id: String, document: StoredDocument },
    Remove { id: String },
}

#[derive(Default)]
struct StoreState {
    /// Authoritative committed documents, used by loads.
    documents: HashMap<String, StoredDocument>,
    /// What queries see. Ordered by id so paging is stable.
    index: BTreeMap<String, StoredDocument>,
    pending: VecDeque<IndexUpdate>,
    last_version: u64,
}

impl StoreState {
    fn catch_up_index(&mut self) -> usize {
        let applied = self.pending.len();
        while let Some(update) = self.pending.pop_front() {
            match update {
                IndexUpdate::Put { id, document } => {
                    self.index.insert(id, document);
                }
                IndexUpdate::Remove { id } => {
                    self.index.remove(&id);
                }
            }
        }
        applied
    }

    fn version_of(&self, id: &str) -> u64 {
        self.documents.get(id).map_or(0, |document| document.version)
    }

    fn indexed<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<Document<T>>, StoreError> {
        let prefix = format!("{}{}", T::NAMESPACE, SEPARATOR);
        let mut rows = Vec::new();

        for (id, stored) in self.index.range(prefix.clone()..) {
            if !id.starts_with(&prefix) {
                break;
            }
            let data: T = decode(&stored.bytes)?;
            if query.matches(&data) {
                rows.push(Document {
                    id: id.clone(),
                    version: stored.version,
                    data,
                });
            }
        }

        Ok(rows)
    }
}

/// In-process, eventually-consistent document store for tests and local runs.
///
/// Clone-friendly via Arc; clones share storage.
#[derive(Clone, Default)]
pub struct EmbeddedDocumentStore {
    config: Arc<DocumentStoreConfig>,
    state: Arc<RwLock<StoreState>>,
}

impl EmbeddedDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DocumentStoreConfig) -> Self {
        EmbeddedDocumentStore {
            config: Arc::new(config),
            state: Arc::default(),
        }
    }

    pub fn config(&self) -> &DocumentStoreConfig {
        &self.config
    }

    /// Apply every queued index update. Returns how many were applied.
    pub fn wait_for_indexing(&self) -> Result<usize, StoreError> {
        let applied = self.write()?.catch_up_index();
        if applied > 0 {
            tracing::trace!(applied, "index caught up");
        }
        Ok(applied)
    }

    /// Committed writes not yet visible to queries.
    pub fn pending_index_updates(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.pending.len())
    }

    /// Committed documents across all namespaces.
    pub fn document_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.documents.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::LockPoisoned("document read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::LockPoisoned("document write"))
    }
}

impl DocumentStore for EmbeddedDocumentStore {
    type Session = EmbeddedSession;

    fn open_session(&self) -> Result<EmbeddedSession, StoreError> {
        Ok(EmbeddedSession {
            store: self.clone(),
            optimistic_concurrency: false,
            known_versions: HashMap::new(),
            changes: HashMap::new(),
        })
    }
}

enum PendingChange {
    Store(Vec<u8>),
    Delete,
}

/// Unit of work against an [`EmbeddedDocumentStore`].
pub struct EmbeddedSession {
    store: EmbeddedDocumentStore,
    optimistic_concurrency: bool,
    /// Version of each document as this session last saw it.
    known_versions: HashMap<String, u64>,
    changes: HashMap<String, PendingChange>,
}

impl EmbeddedSession {
    /// Changes recorded but not yet saved.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }
}

impl DocumentSession for EmbeddedSession {
    fn set_optimistic_concurrency(&mut self, enabled: bool) {
        self.optimistic_concurrency = enabled;
    }

    fn load<T: ViewModel>(&mut self, id: &str) -> Result<Option<T>, StoreError> {
        if let Some(change) = self.changes.get(id) {
            return match change {
                PendingChange::Store(bytes) => decode(bytes).map(Some),
                PendingChange::Delete => Ok(None),
            };
        }

        let (entity, version) = {
            let state = self.store.read()?;
            match state.documents.get(id) {
                Some(stored) => (decode::<T>(&stored.bytes)?, stored.version),
                None => return Ok(None),
            }
        };

        self.known_versions.insert(id.to_string(), version);
        Ok(Some(entity))
    }

    fn store<T: ViewModel>(&mut self, id: &str, entity: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(entity).map_err(|e| StoreError::Serde(e.to_string()))?;
        self.changes.insert(id.to_string(), PendingChange::Store(bytes));
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.changes.insert(id.to_string(), PendingChange::Delete);
        Ok(())
    }

    fn query<T: ViewModel>(&mut self, query: &Query<'_, T>) -> Result<Vec<Document<T>>, StoreError> {
        let config = &self.store.config;
        let wait = query.waits_for_non_stale_results() || config.always_wait_for_non_stale_results;
        let take = config.effective_take(query.take_count());

        let mut rows = if wait {
            let mut state = self.store.write()?;
            state.catch_up_index();
            state.indexed(query)?
        } else {
            self.store.read()?.indexed(query)?
        };

        if query.is_ordered() {
            rows.sort_by(|a, b| query.compare(&a.data, &b.data));
        }

        let page: Vec<Document<T>> = rows
            .into_iter()
            .skip(query.skip_count())
            .take(take)
            .collect();

        for document in &page {
            self.known_versions
                .insert(document.id.clone(), document.version);
        }

        Ok(page)
    }

    fn save_changes(&mut self) -> Result<(), StoreError> {
        if self.changes.is_empty() {
            return Ok(());
        }

        let mut state = self.store.write()?;

        if self.optimistic_concurrency {
            for id in self.changes.keys() {
                let expected = self.known_versions.get(id).copied().unwrap_or(0);
                let actual = state.version_of(id);
                if expected != actual {
                    return Err(StoreError::Conflict {
                        id: id.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }

        let committed = self.changes.len();
        for (id, change) in self.changes.drain() {
            match change {
                PendingChange::Store(bytes) => {
                    state.last_version += 1;
                    let document = StoredDocument {
                        bytes,
                        version: state.last_version,
                    };
                    self.known_versions.insert(id.clone(), document.version);
                    state.documents.insert(id.clone(), document.clone());
                    state.pending.push_back(IndexUpdate::Put { id, document });
                }
                PendingChange::Delete => {
                    self.known_versions.remove(&id);
                    if state.documents.remove(&id).is_some() {
                        state.pending.push_back(IndexUpdate::Remove { id });
                    }
                }
            }
        }

        if self.store.config.indexing == IndexingMode::Immediate {
            state.catch_up_index();
        }

        tracing::trace!(committed, "document session saved");
        Ok(())
    }
}

fn decode<T: ViewModel>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serde(e.to_string()))
}
