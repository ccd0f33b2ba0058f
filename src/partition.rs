//! Partition - the per-type map shared by the in-process backends.
//!
//! Entities live behind `Arc<RwLock<T>>` handles so that update closures
//! mutate the stored value itself rather than a copy, and so that a handle
//! can be used after the partition lock has been released.
//!
//! An update action runs while its entity's write lock is held. Reading or
//! updating that same entity from inside the action, on the same thread,
//! fails with `ReentrantUpdate` instead of blocking.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::RepositoryError;
use crate::query::Query;

pub(crate) type Handle<T> = Arc<RwLock<T>>;

thread_local! {
    /// Handles whose update action is running on this thread.
    static UPDATING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

fn handle_id<T>(handle: &Handle<T>) -> usize {
    Arc::as_ptr(handle) as *const () as usize
}

fn ensure_not_updating<T>(handle: &Handle<T>) -> Result<(), RepositoryError> {
    let id = handle_id(handle);
    if UPDATING.with(|updating| updating.borrow().contains(&id)) {
        return Err(RepositoryError::ReentrantUpdate);
    }
    Ok(())
}

/// Marks a handle as being updated on this thread until dropped.
struct UpdateScope(usize);

impl UpdateScope {
    fn enter<T>(handle: &Handle<T>) -> Self {
        let id = handle_id(handle);
        UPDATING.with(|updating| updating.borrow_mut().push(id));
        UpdateScope(id)
    }
}

impl Drop for UpdateScope {
    fn drop(&mut self) {
        UPDATING.with(|updating| {
            let mut updating = updating.borrow_mut();
            if let Some(position) = updating.iter().rposition(|id| *id == self.0) {
                updating.remove(position);
            }
        });
    }
}

/// Clone the current value behind a handle.
pub(crate) fn read_handle<T: Clone>(handle: &Handle<T>) -> Result<T, RepositoryError> {
    ensure_not_updating(handle)?;
    let entity = handle
        .read()
        .map_err(|_| RepositoryError::LockPoisoned("entity read"))?;
    Ok(entity.clone())
}

pub(crate) fn test_handle<T, P>(handle: &Handle<T>, predicate: &P) -> Result<bool, RepositoryError>
where
    P: Fn(&T) -> bool + ?Sized,
{
    ensure_not_updating(handle)?;
    let entity = handle
        .read()
        .map_err(|_| RepositoryError::LockPoisoned("entity read"))?;
    Ok(predicate(&entity))
}

/// Run `update` against the value behind a handle, holding its write lock.
pub(crate) fn update_handle<T, F>(handle: &Handle<T>, update: F) -> Result<(), RepositoryError>
where
    F: FnOnce(&mut T),
{
    ensure_not_updating(handle)?;
    let mut entity = handle
        .write()
        .map_err(|_| RepositoryError::LockPoisoned("entity write"))?;
    let _scope = UpdateScope::enter(handle);
    update(&mut entity);
    Ok(())
}

/// All entities of one declared type, keyed by caller key.
pub(crate) struct Partition<T> {
    entries: RwLock<HashMap<String, Handle<T>>>,
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Partition<T> {
    pub(crate) fn new() -> Self {
        Partition {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<Handle<T>>, RepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("partition read"))?;
        Ok(entries.get(key).cloned())
    }

    /// Insert unless the key is occupied. Check and insert happen under one
    /// write lock, so of two racing inserts exactly one returns `true`.
    pub(crate) fn insert_if_absent(&self, key: &str, entity: T) -> Result<bool, RepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("partition write"))?;
        match entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(entity)));
                Ok(true)
            }
        }
    }

    pub(crate) fn remove(&self, key: &str) -> Result<Option<Handle<T>>, RepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("partition write"))?;
        Ok(entries.remove(key))
    }

    /// Remove each key whose current handle is the one given. Keys that were
    /// deleted and re-added since `matched` was taken are left alone.
    pub(crate) fn remove_matched(
        &self,
        matched: &[(String, Handle<T>)],
    ) -> Result<usize, RepositoryError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("partition write"))?;

        let mut removed = 0;
        for (key, handle) in matched {
            let same = entries
                .get(key)
                .map_or(false, |current| Arc::ptr_eq(current, handle));
            if same {
                entries.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Point-in-time copy of the key/handle pairs.
    pub(crate) fn snapshot(&self) -> Result<Vec<(String, Handle<T>)>, RepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("partition read"))?;
        Ok(entries
            .iter()
            .map(|(key, handle)| (key.clone(), Arc::clone(handle)))
            .collect())
    }

    /// Snapshot entries and keep those whose entity matches `predicate`.
    /// The predicate runs after the partition lock is released.
    pub(crate) fn matching<P>(&self, predicate: &P) -> Result<Vec<(String, Handle<T>)>, RepositoryError>
    where
        P: Fn(&T) -> bool + ?Sized,
    {
        let mut matched = Vec::new();
        for (key, handle) in self.snapshot()? {
            if test_handle(&handle, predicate)? {
                matched.push((key, handle));
            }
        }
        Ok(matched)
    }

    /// Clone every value currently stored.
    pub(crate) fn values(&self) -> Result<Vec<T>, RepositoryError>
    where
        T: Clone,
    {
        self.snapshot()?
            .iter()
            .map(|(_, handle)| read_handle(handle))
            .collect()
    }

    pub(crate) fn len(&self) -> Result<usize, RepositoryError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("partition read"))?;
        Ok(entries.len())
    }
}

// Contract operations over a partition that may not exist yet. Both
// in-process backends delegate here once they have looked the partition up.

pub(crate) fn get_entry<T: Clone>(
    partition: Option<&Partition<T>>,
    key: &str,
) -> Result<Option<T>, RepositoryError> {
    let Some(partition) = partition else {
        return Ok(None);
    };
    match partition.get(key)? {
        Some(handle) => read_handle(&handle).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn query_entries<T: Clone>(
    partition: Option<&Partition<T>>,
    query: &Query<'_, T>,
) -> Result<Vec<T>, RepositoryError> {
    let values = match partition {
        Some(partition) => partition.values()?,
        None => Vec::new(),
    };
    Ok(query.apply(values))
}

pub(crate) fn update_entry<T, F>(
    partition: Option<&Partition<T>>,
    key: &str,
    update: F,
) -> Result<(), RepositoryError>
where
    F: FnOnce(&mut T),
{
    let handle = match partition {
        Some(partition) => partition.get(key)?,
        None => None,
    };
    let Some(handle) = handle else {
        return Err(RepositoryError::not_found(key));
    };
    update_handle(&handle, update)
}

/// Entries currently matching `predicate`, empty when the partition is missing.
pub(crate) fn matching_entries<T, P>(
    partition: Option<&Partition<T>>,
    predicate: &P,
) -> Result<Vec<(String, Handle<T>)>, RepositoryError>
where
    P: Fn(&T) -> bool + ?Sized,
{
    match partition {
        Some(partition) => partition.matching(predicate),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn delete_entry<T>(
    partition: Option<&Partition<T>>,
    key: &str,
) -> Result<(), RepositoryError> {
    let removed = match partition {
        Some(partition) => partition.remove(key)?,
        None => None,
    };
    match removed {
        Some(_) => Ok(()),
        None => Err(RepositoryError::not_found(key)),
    }
}

pub(crate) fn delete_matching<T, P>(
    partition: Option<&Partition<T>>,
    predicate: &P,
) -> Result<usize, RepositoryError>
where
    P: Fn(&T) -> bool + ?Sized,
{
    let Some(partition) = partition else {
        return Ok(0);
    };
    let matched = partition.matching(predicate)?;
    partition.remove_matched(&matched)
}
