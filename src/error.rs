use std::error::Error;
use std::fmt;

/// Errors raised by a document store or one of its sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency violation detected at commit time.
    ///
    /// A version of `0` means "document does not exist".
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },
    /// The stored bytes could not be (de)serialized.
    Serde(String),
    /// The store could not be reached or rejected the request.
    Transport(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "optimistic concurrency conflict on document {} (expected version {}, actual {})",
                id, expected, actual
            ),
            StoreError::Serde(message) => write!(f, "document serialization error: {}", message),
            StoreError::Transport(message) => write!(f, "document store transport error: {}", message),
            StoreError::LockPoisoned(operation) => {
                write!(f, "document store lock poisoned during {}", operation)
            }
        }
    }
}

impl Error for StoreError {}

/// Errors surfaced by view model readers and writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A caller-supplied argument was rejected before storage was touched.
    InvalidArgument {
        argument: &'static str,
        reason: &'static str,
    },
    /// `add` found the identifier already occupied.
    ///
    /// `cause` holds the store conflict the duplicate was derived from, when
    /// the backend detects duplicates through optimistic concurrency.
    DuplicateKey {
        key: String,
        cause: Option<StoreError>,
    },
    /// `update` or `delete` found no entity under the identifier.
    EntityNotFound { key: String },
    /// Two distinct Rust types declared the same namespace.
    NamespaceConflict { namespace: &'static str },
    LockPoisoned(&'static str),
    /// An `update` action touched the entity it is updating through the
    /// repository, which would otherwise wait on itself forever.
    ReentrantUpdate,
    /// Document store failure, passed through untranslated.
    Store(StoreError),
}

impl RepositoryError {
    pub fn duplicate_key(key: &str) -> Self {
        RepositoryError::DuplicateKey {
            key: key.to_string(),
            cause: None,
        }
    }

    pub fn not_found(key: &str) -> Self {
        RepositoryError::EntityNotFound {
            key: key.to_string(),
        }
    }

    /// The key attached to a `DuplicateKey` or `EntityNotFound` error.
    pub fn key(&self) -> Option<&str> {
        match self {
            RepositoryError::DuplicateKey { key, .. } | RepositoryError::EntityNotFound { key } => {
                Some(key)
            }
            _ => None,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, RepositoryError::DuplicateKey { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::EntityNotFound { .. })
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::InvalidArgument { argument, reason } => {
                write!(f, "invalid argument `{}`: {}", argument, reason)
            }
            RepositoryError::DuplicateKey { key, .. } => {
                write!(f, "attempt to insert key '{}' failed: key already exists", key)
            }
            RepositoryError::EntityNotFound { key } => {
                write!(f, "no entity found with key '{}'", key)
            }
            RepositoryError::NamespaceConflict { namespace } => write!(
                f,
                "namespace '{}' is declared by more than one view model type",
                namespace
            ),
            RepositoryError::LockPoisoned(operation) => {
                write!(f, "repository lock poisoned during {}", operation)
            }
            RepositoryError::ReentrantUpdate => write!(
                f,
                "view model accessed through the repository from inside its own update action"
            ),
            RepositoryError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl Error for RepositoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RepositoryError::DuplicateKey {
                cause: Some(cause), ..
            } => Some(cause),
            RepositoryError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        RepositoryError::Store(err)
    }
}
