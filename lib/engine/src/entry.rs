use crate::metadata::QueryMetadata;
use crate::pattern_key::{GraphKey, PatternKey};
use quadcache_common::QueryResults;
use std::collections::BTreeSet;

/// The cached result of a single query together with the keys it depends on.
///
/// The entry is the source of truth for its back-references: every graph in `graphs` has a graph
/// index entry that lists `query`, and so does every key in `pattern_keys`.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryCacheEntry {
    /// The query string. Identifies the entry.
    pub query: String,
    /// The materialized result of the query.
    pub result: QueryResults,
    /// The graphs the query depends on.
    pub graphs: BTreeSet<GraphKey>,
    /// The pattern keys the query depends on.
    pub pattern_keys: BTreeSet<PatternKey>,
}

impl QueryCacheEntry {
    pub fn new(metadata: QueryMetadata, result: QueryResults) -> Self {
        Self {
            query: metadata.query,
            result,
            graphs: metadata.graphs,
            pattern_keys: metadata.pattern_keys,
        }
    }
}
