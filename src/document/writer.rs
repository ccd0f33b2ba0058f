use crate::error::{RepositoryError, StoreError};
use crate::identity::{make_identifier, validate_key};
use crate::query::Query;
use crate::repository::ViewModelWriter;
use crate::view_model::ViewModel;

use super::{Document, DocumentSession, DocumentStore, SweepOptions};

/// Writes view models to a document store.
///
/// Single-key operations run in their own session and commit together.
/// `update_where` and `delete_where` sweep the matching documents page by
/// page inside one session and commit once at the end:
///
/// 1. query the predicate with `wait_for_non_stale_results`, skipping the
///    rows already seen, taking `page_size` rows;
/// 2. update and store, or delete, every returned row;
/// 3. advance the offset by the rows returned, stop on an empty page;
/// 4. save changes.
///
/// Offset paging visits each row once because nothing the sweep does is
/// visible to its own queries before the final commit. It assumes the
/// action does not make non-matching documents match and that each
/// non-stale checkpoint reflects every earlier commit; if either fails,
/// rows can be skipped or seen twice.
#[derive(Debug, Clone)]
pub struct DocumentViewModelWriter<S> {
    store: S,
    options: SweepOptions,
}

impl<S: DocumentStore> DocumentViewModelWriter<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, SweepOptions::default())
    }

    pub fn with_options(store: S, options: SweepOptions) -> Self {
        DocumentViewModelWriter { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    fn sweep<T, P, A>(&self, predicate: &P, mut apply: A) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        A: FnMut(&mut S::Session, Document<T>) -> Result<(), StoreError>,
    {
        let page_size = self.options.page_size.max(1);
        let mut session = self.store.open_session()?;
        let mut offset = 0;

        loop {
            let query = Query::new()
                .filter(predicate)
                .wait_for_non_stale_results()
                .skip(offset)
                .take(page_size);
            let page = session.query(&query)?;
            if page.is_empty() {
                break;
            }

            let rows = page.len();
            for document in page {
                apply(&mut session, document)?;
            }
            offset += rows;

            tracing::trace!(namespace = T::NAMESPACE, rows, offset, "sweep page processed");
        }

        session.save_changes()?;
        Ok(offset)
    }
}

impl<S: DocumentStore> ViewModelWriter for DocumentViewModelWriter<S> {
    fn add<T: ViewModel>(&self, key: &str, entity: T) -> Result<(), RepositoryError> {
        validate_key(key)?;

        let id = make_identifier::<T>(key);
        let mut session = self.store.open_session()?;
        session.set_optimistic_concurrency(true);
        session.store(&id, &entity)?;

        match session.save_changes() {
            Ok(()) => {
                tracing::debug!(id = %id, "view model document added");
                Ok(())
            }
            Err(conflict @ StoreError::Conflict { .. }) => {
                tracing::warn!(id = %id, error = %conflict, "duplicate view model key");
                Err(RepositoryError::DuplicateKey {
                    key: key.to_string(),
                    cause: Some(conflict),
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    fn update<T, F>(&self, key: &str, update: F) -> Result<(), RepositoryError>
    where
        T: ViewModel,
        F: FnOnce(&mut T),
    {
        validate_key(key)?;

        let id = make_identifier::<T>(key);
        let mut session = self.store.open_session()?;
        let Some(mut entity) = session.load::<T>(&id)? else {
            return Err(RepositoryError::not_found(key));
        };

        update(&mut entity);
        session.store(&id, &entity)?;
        session.save_changes()?;

        tracing::debug!(id = %id, "view model document updated");
        Ok(())
    }

    fn update_where<T, P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync,
    {
        let updated = self.sweep(&predicate, |session, mut document: Document<T>| {
            update(&mut document.data);
            session.store(&document.id, &document.data)
        })?;

        tracing::debug!(namespace = T::NAMESPACE, updated, "view model documents updated by predicate");
        Ok(updated)
    }

    fn delete<T: ViewModel>(&self, key: &str) -> Result<(), RepositoryError> {
        validate_key(key)?;

        let id = make_identifier::<T>(key);
        let mut session = self.store.open_session()?;
        if session.load::<T>(&id)?.is_none() {
            return Err(RepositoryError::not_found(key));
        }

        session.delete(&id)?;
        session.save_changes()?;

        tracing::debug!(id = %id, "view model document deleted");
        Ok(())
    }

    fn delete_where<T, P>(&self, predicate: P) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
    {
        let removed = self.sweep(&predicate, |session, document: Document<T>| {
            session.delete(&document.id)
        })?;

        tracing::debug!(namespace = T::NAMESPACE, removed, "view model documents deleted by predicate");
        Ok(removed)
    }
}
