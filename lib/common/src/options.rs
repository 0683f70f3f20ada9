use std::time::Duration;

/// Options for evaluating a query or executing an operation against a
/// [QuadStore](crate::QuadStore).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// An upper bound for the time spent waiting for a store. [None] waits indefinitely.
    pub timeout: Option<Duration>,
}

impl QueryOptions {
    /// Returns a copy of these options with the given timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
