//! The key-value cache that holds cached query results and the invalidation indices.

mod memory;

use crate::entry::QueryCacheEntry;
use crate::pattern_key::{GraphKey, PatternKey, KEY_SEPARATOR};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub use memory::MemKeyValueCache;

/// A key of the [KeyValueCache].
///
/// The three variants are separate namespaces. A query string can never collide with a pattern
/// key, even if an IRI contains the separator of the rendered keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheKey {
    /// The cached entry of a query.
    Query(String),
    /// The queries that depend on a graph.
    Graph(GraphKey),
    /// The queries that registered a pattern key.
    Pattern(PatternKey),
}

impl CacheKey {
    /// Encodes this key as an unambiguous string, for backends that only accept string keys.
    ///
    /// Every component is prefixed with its length in bytes, so no choice of IRIs or query strings
    /// can produce the same encoding for two different keys.
    pub fn encode(&self) -> String {
        fn component(out: &mut String, value: Option<&str>) {
            match value {
                None => out.push('*'),
                Some(value) => {
                    out.push_str(&value.len().to_string());
                    out.push(':');
                    out.push_str(value);
                }
            }
        }

        fn graph(out: &mut String, graph: &GraphKey) {
            match graph {
                GraphKey::Default => out.push('d'),
                GraphKey::AnyNamed => out.push('a'),
                GraphKey::Named(name) => {
                    out.push('n');
                    component(out, Some(name));
                }
            }
        }

        let mut out = String::new();
        match self {
            CacheKey::Query(query) => {
                out.push('q');
                component(&mut out, Some(query));
            }
            CacheKey::Graph(key) => {
                out.push('g');
                graph(&mut out, key);
            }
            CacheKey::Pattern(key) => {
                out.push('p');
                graph(&mut out, &key.graph);
                component(&mut out, key.subject.as_deref());
                component(&mut out, key.predicate.as_deref());
                component(&mut out, key.object.as_deref());
            }
        }
        out
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Query(query) => write!(f, "query{KEY_SEPARATOR}{query}"),
            CacheKey::Graph(graph) => write!(f, "graph{KEY_SEPARATOR}{graph}"),
            CacheKey::Pattern(pattern) => write!(f, "pattern{KEY_SEPARATOR}{pattern}"),
        }
    }
}

/// A value of the [KeyValueCache].
#[derive(Clone, Debug, PartialEq)]
pub enum CacheValue {
    /// A cached query result. Stored under [CacheKey::Query].
    Entry(Arc<QueryCacheEntry>),
    /// The set of query strings of an index entry. Stored under [CacheKey::Graph] and
    /// [CacheKey::Pattern].
    Queries(BTreeSet<String>),
}

/// An error of a [KeyValueCache] implementation.
#[derive(Debug, thiserror::Error)]
#[error("The key-value cache failed: {0}")]
pub struct CacheBackendError(#[source] pub Box<dyn std::error::Error + Send + Sync + 'static>);

impl CacheBackendError {
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(error.into())
    }
}

/// The backing storage of the [QueryCache](crate::QueryCache).
///
/// Implementations only need to provide atomic single-key operations. The query cache serializes
/// all read-modify-write sequences on index entries itself.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns the value of `key`, or [None] if it is not present.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>, CacheBackendError>;

    /// Sets the value of `key`, replacing any previous value.
    async fn set(&self, key: CacheKey, value: CacheValue) -> Result<(), CacheBackendError>;

    /// Removes `key`. Removing a key that is not present is not an error.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheBackendError>;
}
