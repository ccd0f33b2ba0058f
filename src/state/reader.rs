use std::sync::Arc;

use crate::error::RepositoryError;
use crate::identity::validate_key;
use crate::partition::{get_entry, query_entries};
use crate::query::Query;
use crate::repository::ViewModelReader;
use crate::view_model::ViewModel;

use super::{partition, StateContainer};

/// Reads view models out of a shared state container.
pub struct StateViewModelReader<C> {
    container: Arc<C>,
}

impl<C> Clone for StateViewModelReader<C> {
    fn clone(&self) -> Self {
        StateViewModelReader {
            container: Arc::clone(&self.container),
        }
    }
}

impl<C: StateContainer> StateViewModelReader<C> {
    pub fn new(container: Arc<C>) -> Self {
        StateViewModelReader { container }
    }

    pub fn container(&self) -> &Arc<C> {
        &self.container
    }
}

impl<C: StateContainer> ViewModelReader for StateViewModelReader<C> {
    fn get_by_key<T: ViewModel>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        validate_key(key)?;
        get_entry(partition::<T, _>(self.container.as_ref())?.as_deref(), key)
    }

    fn query<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError> {
        query_entries(partition::<T, _>(self.container.as_ref())?.as_deref(), query)
    }
}
