//! The reader/writer contract every backend implements.

use std::marker::PhantomData;

use crate::error::RepositoryError;
use crate::query::Query;
use crate::view_model::ViewModel;

/// Read access to view models.
pub trait ViewModelReader {
    /// Get a view model by key. Returns `None` if absent, including when the
    /// key is only present under a different declared type.
    fn get_by_key<T: ViewModel>(&self, key: &str) -> Result<Option<T>, RepositoryError>;

    /// Run a query over all view models of type `T`.
    fn query<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError>;
}

/// Write access to view models.
pub trait ViewModelWriter {
    /// Insert a new view model. Fails with `DuplicateKey` if the key is taken.
    fn add<T: ViewModel>(&self, key: &str, entity: T) -> Result<(), RepositoryError>;

    /// Run `update` exactly once against the stored view model.
    fn update<T, F>(&self, key: &str, update: F) -> Result<(), RepositoryError>
    where
        T: ViewModel,
        F: FnOnce(&mut T);

    /// Run `update` against every view model matching `predicate`.
    /// Returns how many view models were updated.
    fn update_where<T, P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync;

    /// Remove a view model. Fails with `EntityNotFound` if absent.
    fn delete<T: ViewModel>(&self, key: &str) -> Result<(), RepositoryError>;

    /// Remove every view model matching `predicate`. Returns how many were removed.
    fn delete_where<T, P>(&self, predicate: P) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync;
}

/// Full repository: both capabilities.
pub trait ViewModelRepository: ViewModelReader + ViewModelWriter {}

impl<T> ViewModelRepository for T where T: ViewModelReader + ViewModelWriter {}

/// A reader and a writer bound to the same backend, used as one repository.
///
/// Backends whose reads and writes are separate types (shared state,
/// document store) are combined with this.
#[derive(Debug, Clone)]
pub struct SplitRepository<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> SplitRepository<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        SplitRepository { reader, writer }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: ViewModelReader, W> ViewModelReader for SplitRepository<R, W> {
    fn get_by_key<T: ViewModel>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        self.reader.get_by_key(key)
    }

    fn query<T: ViewModel>(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError> {
        self.reader.query(query)
    }
}

impl<R, W: ViewModelWriter> ViewModelWriter for SplitRepository<R, W> {
    fn add<T: ViewModel>(&self, key: &str, entity: T) -> Result<(), RepositoryError> {
        self.writer.add(key, entity)
    }

    fn update<T, F>(&self, key: &str, update: F) -> Result<(), RepositoryError>
    where
        T: ViewModel,
        F: FnOnce(&mut T),
    {
        self.writer.update(key, update)
    }

    fn update_where<T, P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync,
    {
        self.writer.update_where(predicate, update)
    }

    fn delete<T: ViewModel>(&self, key: &str) -> Result<(), RepositoryError> {
        self.writer.delete::<T>(key)
    }

    fn delete_where<T, P>(&self, predicate: P) -> Result<usize, RepositoryError>
    where
        T: ViewModel,
        P: Fn(&T) -> bool + Send + Sync,
    {
        self.writer.delete_where(predicate)
    }
}

/// Typed accessor binding the declared type once.
///
/// Provides short method names by delegating to the contract traits.
pub struct ViewModels<'a, R: ?Sized, T> {
    repository: &'a R,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, R: ViewModelRepository + ?Sized, T: ViewModel> ViewModels<'a, R, T> {
    pub fn new(repository: &'a R) -> Self {
        ViewModels {
            repository,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        self.repository.get_by_key(key)
    }

    pub fn query(&self, query: &Query<'_, T>) -> Result<Vec<T>, RepositoryError> {
        self.repository.query(query)
    }

    /// Every view model of the type, subject to the backend's result cap.
    pub fn all(&self) -> Result<Vec<T>, RepositoryError> {
        self.repository.query(&Query::new())
    }

    pub fn add(&self, key: &str, entity: T) -> Result<(), RepositoryError> {
        self.repository.add(key, entity)
    }

    pub fn update<F: FnOnce(&mut T)>(&self, key: &str, update: F) -> Result<(), RepositoryError> {
        self.repository.update(key, update)
    }

    pub fn update_where<P, F>(&self, predicate: P, update: F) -> Result<usize, RepositoryError>
    where
        P: Fn(&T) -> bool + Send + Sync,
        F: Fn(&mut T) + Send + Sync,
    {
        self.repository.update_where(predicate, update)
    }

    pub fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.repository.delete::<T>(key)
    }

    pub fn delete_where<P>(&self, predicate: P) -> Result<usize, RepositoryError>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        self.repository.delete_where(predicate)
    }
}

/// Extension trait for typed access on any repository.
pub trait ViewModelsExt: ViewModelRepository {
    fn view_models<T: ViewModel>(&self) -> ViewModels<'_, Self, T> {
        ViewModels::new(self)
    }
}

impl<R: ViewModelRepository> ViewModelsExt for R {}
