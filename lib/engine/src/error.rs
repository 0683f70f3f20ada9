use crate::cache::CacheBackendError;
use quadcache_common::StorageError;
use std::time::Duration;

/// An error raised by the [QueryCache](crate::QueryCache).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryCacheError {
    /// A query missed the cache and there is no successor store that could evaluate it.
    #[error("The query is not cached and no successor store is configured")]
    StoreNotConfigured,
    /// The operation must be delegated to a successor store but none is configured.
    #[error("The operation {0} requires a successor store but none is configured")]
    UnsupportedOperation(&'static str),
    /// A statement has no graph and no graph was given. Pattern keys are always scoped to a graph.
    #[error("The statement {0} has no graph and no graph was provided")]
    MissingGraph(String),
    /// The successor did not answer in time. Nothing has been cached.
    #[error("The successor store did not respond within {0:?}")]
    Timeout(Duration),
    /// A value in the key-value cache does not have the expected shape.
    #[error("The cache entry {0} is corrupted")]
    CorruptedEntry(String),
    /// An error from the key-value cache.
    #[error(transparent)]
    Backend(#[from] CacheBackendError),
    /// An error from the successor store.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<QueryCacheError> for StorageError {
    #[inline]
    fn from(error: QueryCacheError) -> Self {
        match error {
            QueryCacheError::Storage(error) => error,
            QueryCacheError::UnsupportedOperation(operation) => {
                StorageError::unsupported(operation)
            }
            error => StorageError::Other(Box::new(error)),
        }
    }
}
