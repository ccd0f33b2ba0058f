//! InMemoryViewModelRepository - process-local, thread-safe view model storage.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::RepositoryError;
use crate::identity::validate_key;
use crate::partition::{
    delete_entry, delete_matching, get_entry, matching_entries, query_entries, update_entry,
    update_handle, Partition,
};
use crate::query::Query;
use crate::repository::{ViewModelReader, ViewModelWriter};
use crate::view_model::ViewModel;

type Partitions = HashMap<&'static str, Arc<dyn Any + Send + Sync>>;

/// In-memory repository backed by a two-level map: namespace to partition,
/// then key to entity.
///
/// `add` and `delete` are linearizable: of N threads racing to add the same
/// key exactly one succeeds. `update`, `update_where` and `query` each work
/// on one point-in-time read of the partition and see no global snapshot.
///
/// Clone-friendly via Arc; clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryViewModelRepository {
    partitions: Arc<RwLock<Partitions>>,
}

impl InMemoryViewModelRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of view models stored for type `T`.
    pub fn count<T: ViewModel>(&self) -> Result<usize, RepositoryError> {
        match self.partition::<T>()? {
            Some(partition) => partition.len(),
            None => Ok(0),
        }
    }

    fn partition<T: ViewModel>(&self) -> Result<Option<Arc<Partition<T>>>, RepositoryError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        partitions
            .get(T::NAMESPACE)
            .cloned()
            .map(downcast::<T>)
            .transpose()
    }

    fn partition_or_create<T: ViewModel>(&self) -> Result<Arc<Partition<T>>, RepositoryError> {
        if let Some(existing) = self.partition::<T>()? {
            return Ok(existing);
        }

        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?;
        let entry = partitions
            .entry(T::NAMESPACE)
            .or_insert_with(|| Arc::new(Partition::<T>::new()))
            .clone();
        downcast::<T>(entry)
    }
}

fn downcast<T: ViewModel>(
    partition: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<Partition<T>>, RepositoryError> {
    partition
        .downcast::<Partition<T>>()
        .map_err(|_| RepositoryError::NamespaceConflict {
            namespace: T::NAMESPACE,
        })
}

impl ViewModelReader for InMemoryViewModelRepository {
    fn get_by_key<T: ViewModel>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        validate_key(key)?;
        get_entry(self.partition::<T>()?.as_deref(), key)
    }

    fn query<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError> {
        query_entries(self.partition::<T>()?.as_deref(), query)
    }
}

impl ViewModelWriter for InMemoryViewModelRepository {
    fn add<T: ViewModel>(&self, key: &str, entity: T) -> Result<(), RepositoryError> {
        validate_key(key)?;

        let partition = self.partition_or_create::<T>()?;
        if !partition.insert_if_absent(key, entity)? {
            return Err(RepositoryError::duplicate_key(key));
        }

        tracing::debug!(namespace = T::NAMESPACE, key, "view model added");
        Ok(())
    }

    fn update<T, F>(&self, key: &str, update: F) -> Result<(), RepositoryError>
    where
        T: ViewModel,
        F: FnOnce(&mut T),
    {
        validate_key(key)?;

        update_entry(self.partition::<T>()?.as_deref(), key, update)?;
        tracing::debug!(namespace = T::NAMESPACE, key, "view model updated");
        Ok(())
    }

    fn update_where<T, P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync,
    {
        let matched = matching_entries(self.partition::<T>()?.as_deref(), &predicate)?;
        for (_, handle) in &matched {
            update_handle(handle, &update)?;
        }

        tracing::debug!(
            namespace = T::NAMESPACE,
            updated = matched.len(),
            "view models updated by predicate"
        );
        Ok(matched.len())
    }

    fn delete<T: ViewModel>(&self, key: &str) -> Result<(), RepositoryError> {
        validate_key(key)?;

        delete_entry(self.partition::<T>()?.as_deref(), key)?;
        tracing::debug!(namespace = T::NAMESPACE, key, "view model deleted");
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
            "view models deleted by predicate"
        );
        Ok(removed)
    }
}
