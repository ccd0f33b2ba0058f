use crate::error::RepositoryError;
use crate::identity::{make_identifier, validate_key};
use crate::query::Query;
use crate::repository::ViewModelReader;
use crate::view_model::ViewModel;

use super::{DocumentSession, DocumentStore};

/// Reads view models from a document store.
///
/// `query` exposes the store's own query surface: results come from the
/// store's index (stale unless the query waits for non-stale results) and
/// are capped by the store, so callers page with `skip`/`take`.
#[derive(Debug, Clone)]
pub struct DocumentViewModelReader<S> {
    store: S,
}

impl<S: DocumentStore> DocumentViewModelReader<S> {
    pub fn new(store: S) -> Self {
        DocumentViewModelReader { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: DocumentStore> ViewModelReader for DocumentViewModelReader<S> {
    fn get_by_key<T: ViewModel>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        validate_key(key)?;

        let mut session = self.store.open_session()?;
        Ok(session.load::<T>(&make_identifier::<T>(key))?)
    }

    fn query<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError> {
        let mut session = self.store.open_session()?;
        let documents = session.query(query)?;
        Ok(documents.into_iter().map(|document| document.data).collect())
    }
}
