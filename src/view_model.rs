//! The `ViewModel` trait: what a type must provide to be stored.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored in a view model repository.
///
/// The key is supplied by the caller on every call; a view model does not
/// have to carry its own id. `NAMESPACE` partitions storage so that two
/// types can use the same key without colliding.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, ViewModel)]
/// struct PlayerCard {
///     pub name: String,
///     pub score: u32,
/// }
/// ```
pub trait ViewModel: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Globally unique, restart-stable name of this type's partition.
    ///
    /// # Requirements
    ///
    /// - Not empty and free of `/`. Document ids are `NAMESPACE/key` and are
    ///   split at the first `/`; the derive rejects violations at compile
    ///   time and debug builds panic on them in [`Identifier::of`].
    /// - Distinct for every implementing type, including each concrete
    ///   instantiation of a generic type. Two types sharing a namespace
    ///   collide in every backend.
    /// - Stable. Document-store backends use it as the prefix of every
    ///   document id, so changing it orphans previously stored documents.
    ///
    /// [`Identifier::of`]: crate::Identifier::of
    const NAMESPACE: &'static str;
}
