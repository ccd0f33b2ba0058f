//! Shared-state backend: view models kept in a container owned by the host.
//!
//! The host (a web runtime's application state, a per-session bag, ...)
//! owns a string-keyed container of opaque values. The reader and writer
//! borrow it through the [`StateContainer`] capability and keep one
//! partition map per declared type under the type's namespace.
//!
//! The backend makes each call internally consistent but offers no
//! atomicity across calls: another collaborator that replaces or removes a
//! partition entry in the container while a call is running is not guarded
//! against. Synchronizing such outside writers is the caller's job.

mod reader;
mod writer;

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RepositoryError;
use crate::partition::Partition;
use crate::repository::SplitRepository;
use crate::view_model::ViewModel;

pub use reader::StateViewModelReader;
pub use writer::StateViewModelWriter;

/// An opaque value stored in a state container.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// String-keyed container of opaque values, owned outside the repository.
pub trait StateContainer: Send + Sync {
    fn get(&self, key: &str) -> Option<StateValue>;

    /// Replace whatever is stored under `key`.
    fn set(&self, key: &str, value: StateValue);

    /// Store `value` unless `key` is occupied. Returns the value now stored.
    fn set_if_absent(&self, key: &str, value: StateValue) -> StateValue;

    fn remove(&self, key: &str) -> Option<StateValue>;
}

/// Default process-wide state container.
///
/// Clone-friendly via Arc; clones share the same entries.
#[derive(Clone, Default)]
pub struct ApplicationState {
    items: Arc<RwLock<HashMap<String, StateValue>>>,
}

impl ApplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Entries are plain Arcs, so a poisoned lock still guards consistent data.
impl StateContainer for ApplicationState {
    fn get(&self, key: &str) -> Option<StateValue> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    fn set(&self, key: &str, value: StateValue) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value);
    }

    fn set_if_absent(&self, key: &str, value: StateValue) -> StateValue {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.entry(key.to_string()).or_insert(value).clone()
    }

    fn remove(&self, key: &str) -> Option<StateValue> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key)
    }
}

impl<C: StateContainer + ?Sized> StateContainer for Arc<C> {
    fn get(&self, key: &str) -> Option<StateValue> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: StateValue) {
        (**self).set(key, value)
    }

    fn set_if_absent(&self, key: &str, value: StateValue) -> StateValue {
        (**self).set_if_absent(key, value)
    }

    fn remove(&self, key: &str) -> Option<StateValue> {
        (**self).remove(key)
    }
}

/// Reader and writer over one shared container.
pub type StateViewModelRepository<C> =
    SplitRepository<StateViewModelReader<C>, StateViewModelWriter<C>>;

/// Build a reader/writer pair sharing `container`.
pub fn repository<C: StateContainer>(container: Arc<C>) -> StateViewModelRepository<C> {
    SplitRepository::new(
        StateViewModelReader::new(Arc::clone(&container)),
        StateViewModelWriter::new(container),
    )
}

/// Look up the partition of `T`, if one was ever created in `container`.
pub(crate) fn partition<T, C>(container: &C) -> Result<Option<Arc<Partition<T>>>, RepositoryError>
where
    T: ViewModel,
    C: StateContainer + ?Sized,
{
    container.get(T::NAMESPACE).map(downcast::<T>).transpose()
}

pub(crate) fn downcast<T: ViewModel>(value: StateValue) -> Result<Arc<Partition<T>>, RepositoryError> {
    value
        .downcast::<Partition<T>>()
        .map_err(|_| RepositoryError::NamespaceConflict {
            namespace: T::NAMESPACE,
        })
}
