use crate::memory::eval::{construct, projected_variables, Evaluator};
use async_trait::async_trait;
use quadcache_common::{QuadStore, QueryOptions, QueryResults, StorageError, StoreDescription};
use quadcache_model::{
    Dataset, GraphName, GraphNameRef, NamedOrBlankNode, Quad, Statement, StatementPattern,
};
use rustc_hash::FxHashSet;
use spargebra::Query;
use tokio::sync::RwLock;

/// An in-memory [QuadStore] backed by an [oxrdf Dataset](Dataset).
///
/// Named graphs exist as long as they contain statements or were created explicitly with
/// [QuadStore::create_graph].
///
/// # Example
///
/// ```
/// # use quadcache_common::{QuadStore, QueryOptions};
/// # use quadcache_model::{NamedNode, Statement};
/// # use quadcache_storage::MemQuadStore;
/// # tokio_test::block_on(async {
/// let store = MemQuadStore::new();
/// let ex = NamedNode::new("http://example.com")?;
/// store
///     .add_statements(&[Statement::new(ex.clone(), ex.clone(), ex)], None, &QueryOptions::default())
///     .await?;
///
/// let result = store.query("ASK { ?s ?p ?o }", &QueryOptions::default()).await?;
/// assert_eq!(result.boolean(), Some(true));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemQuadStore {
    state: RwLock<MemQuadStoreState>,
}

#[derive(Debug, Default)]
struct MemQuadStoreState {
    dataset: Dataset,
    created_graphs: FxHashSet<NamedOrBlankNode>,
}

impl MemQuadStoreState {
    fn named_graphs(&self) -> Vec<NamedOrBlankNode> {
        let mut graphs = self.created_graphs.clone();
        for quad in &self.dataset {
            match quad.graph_name {
                GraphNameRef::NamedNode(node) => {
                    graphs.insert(node.into_owned().into());
                }
                GraphNameRef::BlankNode(node) => {
                    graphs.insert(node.into_owned().into());
                }
                GraphNameRef::DefaultGraph => {}
            }
        }

        let mut graphs = graphs.into_iter().collect::<Vec<_>>();
        graphs.sort_unstable_by_key(ToString::to_string);
        graphs
    }

    fn matching(&self, pattern: &StatementPattern, graph: Option<&GraphName>) -> Vec<Quad> {
        self.dataset
            .iter()
            .filter(|quad| pattern.matches(*quad, graph))
            .map(|quad| quad.into_owned())
            .collect()
    }
}

impl MemQuadStore {
    /// Creates a new empty [MemQuadStore].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of statements in the store.
    pub async fn len(&self) -> usize {
        self.state.read().await.dataset.len()
    }

    /// Returns true if the store contains no statements.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.dataset.is_empty()
    }
}

#[async_trait]
impl QuadStore for MemQuadStore {
    async fn query(
        &self,
        query: &str,
        _options: &QueryOptions,
    ) -> Result<QueryResults, StorageError> {
        let query = Query::parse(query, None)?;
        let state = self.state.read().await;
        let named_graphs = state.named_graphs();

        match &query {
            Query::Select {
                dataset, pattern, ..
            } => {
                let evaluator = Evaluator::new(&state.dataset, dataset.as_ref(), &named_graphs);
                let solutions = evaluator.evaluate(pattern)?;
                let variables = projected_variables(pattern, &solutions);
                let rows = solutions
                    .iter()
                    .map(|solution| {
                        variables
                            .iter()
                            .map(|variable| solution.get(variable).cloned())
                            .collect()
                    })
                    .collect::<Vec<_>>();
                Ok(QueryResults::from_rows(variables, rows))
            }
            Query::Ask {
                dataset, pattern, ..
            } => {
                let evaluator = Evaluator::new(&state.dataset, dataset.as_ref(), &named_graphs);
                Ok(QueryResults::Boolean(!evaluator.evaluate(pattern)?.is_empty()))
            }
            Query::Construct {
                template,
                dataset,
                pattern,
                ..
            } => {
                let evaluator = Evaluator::new(&state.dataset, dataset.as_ref(), &named_graphs);
                let solutions = evaluator.evaluate(pattern)?;
                Ok(QueryResults::Graph(construct(template, &solutions)))
            }
            Query::Describe { .. } => Err(StorageError::NotImplemented(String::from(
                "DESCRIBE queries",
            ))),
        }
    }

    async fn add_statements(
        &self,
        statements: &[Statement],
        graph: Option<&GraphName>,
        _options: &QueryOptions,
    ) -> Result<(), StorageError> {
        let default_graph = GraphName::DefaultGraph;
        let mut state = self.state.write().await;
        for statement in statements {
            let graph = graph
                .or(statement.graph_name.as_ref())
                .unwrap_or(&default_graph);
            if let Some(quad) = statement.to_quad(Some(graph)) {
                state.dataset.insert(&quad);
            }
        }
        Ok(())
    }

    async fn delete_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        _options: &QueryOptions,
    ) -> Result<usize, StorageError> {
        let mut state = self.state.write().await;
        let matching = state.matching(pattern, graph);
        for quad in &matching {
            state.dataset.remove(quad);
        }
        Ok(matching.len())
    }

    async fn get_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        _options: &QueryOptions,
    ) -> Result<Vec<Quad>, StorageError> {
        Ok(self.state.read().await.matching(pattern, graph))
    }

    async fn has_matching_statement(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        _options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .dataset
            .iter()
            .any(|quad| pattern.matches(quad, graph)))
    }

    async fn graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        Ok(self.state.read().await.named_graphs())
    }

    async fn create_graph(
        &self,
        graph: &NamedOrBlankNode,
        _options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        if state.named_graphs().contains(graph) {
            return Ok(false);
        }
        Ok(state.created_graphs.insert(graph.clone()))
    }

    async fn drop_graph(
        &self,
        graph: &NamedOrBlankNode,
        _options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        let existed = state.named_graphs().contains(graph);

        let graph_name = GraphName::from(graph.clone());
        let quads = state
            .dataset
            .iter()
            .filter(|quad| quad.graph_name == graph_name.as_ref())
            .map(|quad| quad.into_owned())
            .collect::<Vec<_>>();
        for quad in &quads {
            state.dataset.remove(quad);
        }
        state.created_graphs.remove(graph);

        Ok(existed)
    }

    async fn description(&self) -> Result<StoreDescription, StorageError> {
        let len = self.state.read().await.dataset.len();
        Ok(StoreDescription::new("MemQuadStore").with_statement_count(len))
    }
}
