//! The query cache of [quadcache](https://docs.rs/quadcache/).
//!
//! The [QueryCache] caches the results of SPARQL queries in a [KeyValueCache] and keeps an index
//! from graphs and triple patterns to the cached queries that depend on them. Mutations invalidate
//! all dependent queries before they are forwarded to the successor store.

pub mod cache;
mod config;
mod entry;
mod error;
mod log;
mod metadata;
mod pattern_key;
mod quad_store;
mod query_cache;
mod statement_query;

pub use cache::{CacheBackendError, CacheKey, CacheValue, KeyValueCache, MemKeyValueCache};
pub use config::QueryCacheConfig;
pub use entry::QueryCacheEntry;
pub use error::QueryCacheError;
pub use log::CacheLogEntry;
pub use metadata::QueryMetadata;
pub use pattern_key::{
    build_pattern_keys, pattern_keys_for_statement, GraphKey, PatternKey, KEY_SEPARATOR, WILDCARD,
};
pub use query_cache::QueryCache;
pub use statement_query::{ask_query, select_query};
