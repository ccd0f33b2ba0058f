//! Storage identifiers: `namespace + "/" + key`.

use std::fmt;

use crate::error::RepositoryError;
use crate::view_model::ViewModel;

pub const SEPARATOR: char = '/';

/// Rejects keys that can never address an entity.
///
/// Runs before any backend is touched.
pub fn validate_key(key: &str) -> Result<(), RepositoryError> {
    if key.is_empty() {
        return Err(RepositoryError::InvalidArgument {
            argument: "key",
            reason: "key must not be an empty string",
        });
    }
    Ok(())
}

/// Whether `namespace` can prefix a document id and be parsed back out.
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty() && !namespace.contains(SEPARATOR)
}

/// The `(declared type, key)` pair that addresses one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    namespace: String,
    key: String,
}

impl Identifier {
    /// Identifier of `key` under the namespace of `T`.
    ///
    /// Debug builds panic when `T::NAMESPACE` is empty or contains `/`.
    pub fn of<T: ViewModel>(key: &str) -> Self {
        debug_assert!(
            is_valid_namespace(T::NAMESPACE),
            "ViewModel::NAMESPACE {:?} must be non-empty and free of '{}'",
            T::NAMESPACE,
            SEPARATOR
        );
        Identifier {
            namespace: T::NAMESPACE.to_string(),
            key: key.to_string(),
        }
    }

    /// Splits a stored document id at its first `/`.
    ///
    /// Keys may themselves contain `/`; namespaces may not.
    pub fn parse(id: &str) -> Option<Self> {
        let (namespace, key) = id.split_once(SEPARATOR)?;
        if namespace.is_empty() || key.is_empty() {
            return None;
        }
        Some(Identifier {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, SEPARATOR, self.key)
    }
}

/// Document id for `key` under the namespace of `T`.
pub fn make_identifier<T: ViewModel>(key: &str) -> String {
    Identifier::of::<T>(key).to_string()
}
