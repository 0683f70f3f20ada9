//! A ready-to-use [QueryCache] in front of an in-memory store.
//!
//! The entry point of the module is the [`CachedStore`] struct.

use quadcache_common::{QuadStore, QueryOptions, QueryResults};
use quadcache_engine::{CacheLogEntry, QueryCache, QueryCacheConfig, QueryCacheError};
use quadcache_model::{
    GraphName, GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef,
    Statement, StatementPattern, SubjectRef, TermRef,
};
use quadcache_storage::MemQuadStore;
use std::sync::Arc;

/// An [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) store whose query
/// results are cached.
///
/// All operations go through a [QueryCache] that is chained in front of a [MemQuadStore]. Updates
/// invalidate the cached results they may affect before they reach the store.
///
/// Usage example:
/// ```
/// use quadcache::model::*;
/// use quadcache::store::CachedStore;
///
/// # tokio_test::block_on(async {
/// let store = CachedStore::default();
///
/// // insertion
/// let ex = NamedNode::new("http://example.com")?;
/// let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
/// store.insert(&quad).await?;
///
/// // quad filter
/// let results = store.quads_for_pattern(None, None, None, None).await?;
/// assert_eq!(vec![quad], results);
///
/// // SPARQL query
/// let results = store.query("SELECT ?s WHERE { ?s ?p ?o }").await?;
/// assert_eq!(results.solutions().unwrap()[0].get("s"), Some(&ex.into()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct CachedStore {
    cache: Arc<QueryCache>,
    backend: Arc<MemQuadStore>,
}

impl Default for CachedStore {
    fn default() -> Self {
        Self::new(QueryCacheConfig::default())
    }
}

impl CachedStore {
    /// Creates a [CachedStore] with an empty [MemQuadStore] as backing store.
    pub fn new(config: QueryCacheConfig) -> Self {
        let backend = Arc::new(MemQuadStore::new());
        let cache = QueryCache::in_memory(config)
            .with_successor(Arc::clone(&backend) as Arc<dyn QuadStore>);
        Self {
            cache: Arc::new(cache),
            backend,
        }
    }

    /// Returns a reference to the underlying [QueryCache].
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Returns a reference to the backing store. Changes made directly to the backing store are
    /// not visible to cached queries.
    pub fn backend(&self) -> &MemQuadStore {
        &self.backend
    }

    /// Returns the operations of the cache recorded in this session.
    pub fn log(&self) -> Vec<CacheLogEntry> {
        self.cache.log()
    }

    /// Executes a [SPARQL](https://www.w3.org/TR/sparql11-query/) query.
    ///
    /// Usage example:
    /// ```
    /// use quadcache::model::*;
    /// use quadcache::store::CachedStore;
    ///
    /// # tokio_test::block_on(async {
    /// let store = CachedStore::default();
    /// let ex = NamedNode::new("http://example.com")?;
    /// store.insert(&Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph)).await?;
    ///
    /// // The second evaluation is answered from the cache.
    /// let first = store.query("SELECT ?s WHERE { ?s ?p ?o }").await?;
    /// let second = store.query("SELECT ?s WHERE { ?s ?p ?o }").await?;
    /// assert_eq!(first, second);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn query(&self, query: &str) -> Result<QueryResults, QueryCacheError> {
        self.query_opt(query, QueryOptions::default()).await
    }

    /// Executes a [SPARQL](https://www.w3.org/TR/sparql11-query/) query with some options.
    pub async fn query_opt(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<QueryResults, QueryCacheError> {
        self.cache.query(query, &options).await
    }

    /// Retrieves quads with a filter on each quad component.
    ///
    /// A [None] graph matches the quads of every graph.
    pub async fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, QueryCacheError> {
        let pattern = StatementPattern::new(
            subject.map(SubjectRef::into_owned),
            predicate.map(NamedNodeRef::into_owned),
            object.map(TermRef::into_owned),
        );
        let graph_name = graph_name.map(GraphNameRef::into_owned);
        self.cache
            .get_matching_statements(&pattern, graph_name.as_ref(), &QueryOptions::default())
            .await
    }

    /// Checks if this store contains a given quad.
    pub async fn contains<'a>(
        &self,
        quad: impl Into<QuadRef<'a>>,
    ) -> Result<bool, QueryCacheError> {
        let quad = quad.into().into_owned();
        self.cache
            .has_matching_statement(
                &StatementPattern::from(quad),
                None,
                &QueryOptions::default(),
            )
            .await
    }

    /// Returns the number of quads in the store.
    pub async fn len(&self) -> usize {
        self.backend.len().await
    }

    /// Returns if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.backend.is_empty().await
    }

    /// Adds a quad to this store.
    pub async fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<(), QueryCacheError> {
        self.extend([quad.into().into_owned()]).await
    }

    /// Adds a set of quads to this store.
    pub async fn extend(
        &self,
        quads: impl IntoIterator<Item = impl Into<Quad>>,
    ) -> Result<(), QueryCacheError> {
        let statements = quads
            .into_iter()
            .map(|quad| Statement::from(quad.into()))
            .collect::<Vec<_>>();
        self.cache
            .add_statements(&statements, None, &QueryOptions::default())
            .await
    }

    /// Removes a quad from this store.
    ///
    /// Returns `true` if the quad was in the store and has been removed.
    ///
    /// Usage example:
    /// ```
    /// use quadcache::model::*;
    /// use quadcache::store::CachedStore;
    ///
    /// # tokio_test::block_on(async {
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph);
    ///
    /// let store = CachedStore::default();
    /// store.insert(quad).await?;
    /// assert!(store.contains(quad).await?);
    /// assert!(store.remove(quad).await?);
    /// assert!(!store.remove(quad).await?);
    ///
    /// assert!(!store.contains(quad).await?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, QueryCacheError> {
        let quad = quad.into().into_owned();
        let removed = self
            .cache
            .delete_matching_statements(
                &StatementPattern::from(quad),
                None,
                &QueryOptions::default(),
            )
            .await?;
        Ok(removed > 0)
    }

    /// Returns all the named graphs of the store.
    pub async fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, QueryCacheError> {
        self.cache.graphs().await
    }

    /// Inserts a graph into this store.
    ///
    /// Returns `true` if the graph was not already in the store.
    pub async fn insert_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedOrBlankNodeRef<'a>>,
    ) -> Result<bool, QueryCacheError> {
        let graph_name = graph_name.into().into_owned();
        self.cache
            .create_graph(&graph_name, &QueryOptions::default())
            .await
    }

    /// Removes a graph and all of its quads from this store.
    ///
    /// Returns `true` if the graph was in the store and has been removed.
    pub async fn remove_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedOrBlankNodeRef<'a>>,
    ) -> Result<bool, QueryCacheError> {
        let graph_name = graph_name.into().into_owned();
        self.cache
            .drop_graph(&graph_name, &QueryOptions::default())
            .await
    }

    /// Removes all the quads of a graph from this store. The graph itself is kept.
    pub async fn clear_graph<'a>(
        &self,
        graph_name: impl Into<GraphNameRef<'a>>,
    ) -> Result<usize, QueryCacheError> {
        let graph_name = GraphName::from(graph_name.into());
        self.cache
            .delete_matching_statements(
                &StatementPattern::default(),
                Some(&graph_name),
                &QueryOptions::default(),
            )
            .await
    }
}
