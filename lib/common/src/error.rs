use quadcache_model::SparqlSyntaxError;
use std::error::Error;
use std::io;

/// An error raised by a [QuadStore](crate::QuadStore) (queries, reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The store does not support the operation at all.
    #[error("The operation is not supported by this store: {0}")]
    Unsupported(String),
    /// The store does not (yet) support a part of the given query.
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
    /// The query given to the store could not be parsed.
    #[error(transparent)]
    Query(#[from] SparqlSyntaxError),
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Creates a [StorageError::Unsupported] for the operation `operation`.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported(operation.into())
    }
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::Unsupported(_) | StorageError::NotImplemented(_) => {
                Self::new(io::ErrorKind::Unsupported, error)
            }
            StorageError::Query(error) => Self::new(io::ErrorKind::InvalidInput, error),
            StorageError::Other(error) => Self::other(error),
        }
    }
}
