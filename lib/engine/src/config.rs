use std::num::NonZeroUsize;

/// Holds the configuration of a [QueryCache](crate::QueryCache).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryCacheConfig {
    /// Whether the successor evaluates the default graph as the union of all graphs. If enabled,
    /// statements in named graphs also invalidate queries over the default graph.
    pub union_default_graph: bool,
    /// The maximum number of cached queries. Once exceeded, the oldest entries are invalidated.
    /// [None] never evicts entries.
    pub max_entries: Option<NonZeroUsize>,
    /// Whether operations are recorded in the diagnostics log.
    pub log_operations: bool,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            union_default_graph: false,
            max_entries: None,
            log_operations: true,
        }
    }
}

impl QueryCacheConfig {
    #[must_use]
    pub fn with_union_default_graph(mut self, union_default_graph: bool) -> Self {
        self.union_default_graph = union_default_graph;
        self
    }

    #[must_use]
    pub fn with_max_entries(mut self, max_entries: NonZeroUsize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    #[must_use]
    pub fn with_log_operations(mut self, log_operations: bool) -> Self {
        self.log_operations = log_operations;
        self
    }
}
