use crate::pattern_key::GraphKey;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// An operation recorded in the diagnostics log of a [QueryCache](crate::QueryCache).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheLogEntry {
    /// A query was answered from the cache.
    Hit { query: String },
    /// A query was not cached and was forwarded to the successor.
    Miss { query: String },
    /// A query could not be analysed and was forwarded without caching its result.
    Bypass { query: String },
    /// A result was saved.
    Saved {
        query: String,
        graphs: Vec<GraphKey>,
        pattern_keys: usize,
    },
    /// A cached query was invalidated.
    Invalidated { query: String },
    /// A cached query was evicted because the cache exceeded its capacity.
    Evicted { query: String },
    /// Statements were added or removed, or a graph was dropped.
    Mutation {
        operation: &'static str,
        invalidated: usize,
    },
}

impl Display for CacheLogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheLogEntry::Hit { query } => write!(f, "hit: {query}"),
            CacheLogEntry::Miss { query } => write!(f, "miss: {query}"),
            CacheLogEntry::Bypass { query } => write!(f, "bypass: {query}"),
            CacheLogEntry::Saved {
                query,
                graphs,
                pattern_keys,
            } => {
                write!(f, "saved: {query} (graphs: ")?;
                for (i, graph) in graphs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{graph}")?;
                }
                write!(f, ", {pattern_keys} pattern keys)")
            }
            CacheLogEntry::Invalidated { query } => write!(f, "invalidated: {query}"),
            CacheLogEntry::Evicted { query } => write!(f, "evicted: {query}"),
            CacheLogEntry::Mutation {
                operation,
                invalidated,
            } => write!(f, "{operation}: {invalidated} queries invalidated"),
        }
    }
}

/// The in-process log of the operations of one cache instance.
#[derive(Debug)]
pub(crate) struct CacheLog {
    enabled: bool,
    entries: Mutex<Vec<CacheLogEntry>>,
}

impl CacheLog {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn record(&self, entry: impl FnOnce() -> CacheLogEntry) {
        if !self.enabled {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry());
    }

    pub(crate) fn entries(&self) -> Vec<CacheLogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
