use crate::error::StorageError;
use crate::{QueryOptions, QueryResults};
use async_trait::async_trait;
use quadcache_model::{GraphName, NamedOrBlankNode, Quad, Statement, StatementPattern};
use std::fmt::{Display, Formatter};

/// A store that holds an [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset)
/// and can answer [SPARQL](https://www.w3.org/TR/sparql11-query/) queries over it.
///
/// Stores can be chained: a store may answer some operations itself and delegate the rest to a
/// successor that implements the same trait.
///
/// # Graphs
///
/// Operations that take an optional `graph` use it in favor of the graph of the given statements
/// or patterns. For reading operations, a pattern without any graph matches statements of every
/// graph.
#[async_trait]
pub trait QuadStore: Send + Sync {
    /// Evaluates the SPARQL query `query`.
    async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<QueryResults, StorageError>;

    /// Adds `statements` to the store.
    async fn add_statements(
        &self,
        statements: &[Statement],
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<(), StorageError>;

    /// Removes all statements that match `pattern` and returns how many were removed.
    async fn delete_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<usize, StorageError>;

    /// Returns all statements that match `pattern`.
    async fn get_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<Vec<Quad>, StorageError>;

    /// Returns whether at least one statement matches `pattern`.
    async fn has_matching_statement(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<bool, StorageError>;

    /// Returns the list of named graphs in the store.
    async fn graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError>;

    /// Creates an empty named graph. Returns `false` if the graph already existed.
    async fn create_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, StorageError>;

    /// Removes the named graph and all of its statements. Returns `false` if the graph did not
    /// exist.
    async fn drop_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, StorageError>;

    /// Describes the store.
    async fn description(&self) -> Result<StoreDescription, StorageError>;
}

/// A short, human-readable description of a [QuadStore].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreDescription {
    /// The name of the store implementation.
    pub name: String,
    /// The number of statements, if known.
    pub statement_count: Option<usize>,
    /// The description of the successor of a chained store.
    pub successor: Option<Box<StoreDescription>>,
}

impl StoreDescription {
    /// Creates a new description of a store without a successor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statement_count: None,
            successor: None,
        }
    }

    /// Returns a copy of this description with the given statement count.
    #[must_use]
    pub fn with_statement_count(mut self, count: usize) -> Self {
        self.statement_count = Some(count);
        self
    }

    /// Returns a copy of this description that is chained in front of `successor`.
    #[must_use]
    pub fn with_successor(mut self, successor: StoreDescription) -> Self {
        self.successor = Some(Box::new(successor));
        self
    }
}

impl Display for StoreDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(count) = self.statement_count {
            write!(f, " ({count} statements)")?;
        }
        if let Some(successor) = &self.successor {
            write!(f, " -> {successor}")?;
        }
        Ok(())
    }
}
