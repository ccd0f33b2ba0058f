use std::sync::Arc;

use rayon::prelude::*;

use crate::error::RepositoryError;
use crate::identity::validate_key;
use crate::partition::{
    delete_entry, delete_matching, matching_entries, update_entry, update_handle, Partition,
};
use crate::repository::ViewModelWriter;
use crate::view_model::ViewModel;

use super::{downcast, partition, StateContainer};

/// Writes view models into a shared state container.
///
/// `update_where` runs the update action on all matches in parallel; the
/// action must be safe to run concurrently on distinct view models.
pub struct StateViewModelWriter<C> {
    container: Arc<C>,
}

impl<C> Clone for StateViewModelWriter<C> {
    fn clone(&self) -> Self {
        StateViewModelWriter {
            container: Arc::clone(&self.container),
        }
    }
}

impl<C: StateContainer> StateViewModelWriter<C> {
    pub fn new(container: Arc<C>) -> Self {
        StateViewModelWriter { container }
    }

    pub fn container(&self) -> &Arc<C> {
        &self.container
    }

    fn partition<T: ViewModel>(&self) -> Result<Option<Arc<Partition<T>>>, RepositoryError> {
        partition::<T, _>(self.container.as_ref())
    }
}

impl<C: StateContainer> ViewModelWriter for StateViewModelWriter<C> {
    fn add<T: ViewModel>(&self, key: &str, entity: T) -> Result<(), RepositoryError> {
        validate_key(key)?;

        // Step 1: partition exists ? use it : create it.
        let partition = match self.partition::<T>()? {
            Some(existing) => existing,
            None => {
                let created = Arc::new(Partition::<T>::new());
                downcast::<T>(self.container.set_if_absent(T::NAMESPACE, created))?
            }
        };

        // Step 2: key exists ? fail : insert.
        if !partition.insert_if_absent(key, entity)? {
            return Err(RepositoryError::duplicate_key(key));
        }

        tracing::debug!(namespace = T::NAMESPACE, key, "view model added to shared state");
        Ok(())
    }

    fn update<T, F>(&self, key: &str, update: F) -> Result<(), RepositoryError>
    where
        T: ViewModel,
        F: FnOnce(&mut T),
    {
        validate_key(key)?;

        update_entry(self.partition::<T>()?.as_deref(), key, update)?;
        tracing::debug!(namespace = T::NAMESPACE, key, "view model updated in shared state");
        Ok(())
    }

    fn update_where<T, P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync,
    {
        let matched = matching_entries(self.partition::<T>()?.as_deref(), &predicate)?;

        // Unordered; the first failure stops scheduling of the rest.
        matched
            .par_iter()
            .try_for_each(|(_, handle)| update_handle(handle, &update))?;

        tracing::debug!(
            namespace = T::NAMESPACE,
            updated = matched.len(),
            "view models updated in parallel"
        );
        Ok(matched.len())
    }

    fn delete<T: ViewModel>(&self, key: &str) -> Result<(), RepositoryError> {
        validate_key(key)?;

        delete_entry(self.partition::<T>()?.as_deref(), key)?;

        tracing::debug!(namespace = T::NAMESPACE, key, "view model removed from shared state");
        Ok(())
    }

    fn delete_where<T, P>(&self, predicate: P) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
    {
        let removed = delete_matching(self.partition::<T>()?.as_deref(), &predicate)?;

        tracing::debug!(
            namespace = T::NAMESPACE,
            removed,
            "view models removed from shared state by predicate"
        );
        Ok(removed)
    }
}
