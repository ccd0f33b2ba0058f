//! Typed key-value repositories for view models.
//!
//! A view model is stored under a caller-chosen key inside its type's
//! namespace. Every backend implements the same [`ViewModelReader`] and
//! [`ViewModelWriter`] contract:
//!
//! - [`InMemoryViewModelRepository`]: process-local concurrent maps.
//! - [`state`]: partitions kept in a shared application-state container.
//! - [`document`]: documents in an eventually-consistent document store.

// The derive emits `::viewmodels::ViewModel`, which must also resolve here.
extern crate self as viewmodels;

mod error;
mod identity;
mod memory;
mod partition;
mod query;
mod repository;
mod view_model;

#[cfg(feature = "document")]
pub mod document;
#[cfg(feature = "state")]
pub mod state;

pub use error::{RepositoryError, StoreError};
pub use identity::{is_valid_namespace, make_identifier, validate_key, Identifier, SEPARATOR};
pub use memory::InMemoryViewModelRepository;
pub use query::Query;
pub use repository::{
    SplitRepository, ViewModelReader, ViewModelRepository, ViewModelWriter, ViewModels,
    ViewModelsExt,
};
pub use view_model::ViewModel;

// Derive macro, shares the trait's name.
pub use viewmodels_macros::ViewModel;
