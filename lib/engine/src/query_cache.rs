use crate::cache::{CacheKey, CacheValue, KeyValueCache, MemKeyValueCache};
use crate::config::QueryCacheConfig;
use crate::entry::QueryCacheEntry;
use crate::log::{CacheLog, CacheLogEntry};
use crate::metadata::QueryMetadata;
use crate::pattern_key::{pattern_keys_for_statement, GraphKey};
use crate::statement_query::{ask_query, select_query};
use crate::QueryCacheError;
use quadcache_common::{QuadStore, QueryOptions, QueryResults, StorageError, StoreDescription};
use quadcache_model::{GraphName, NamedOrBlankNode, Quad, Statement, StatementPattern};
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, trace, warn};

/// A store that caches the results of SPARQL queries and invalidates them when the statements
/// they depend on change.
///
/// The cache sits in front of a successor [QuadStore] that answers every query the cache cannot
/// answer itself. Mutations are forwarded to the successor after all cached queries that may be
/// affected have been invalidated. As [QueryCache] implements [QuadStore] itself, caches can be
/// chained.
///
/// # Invalidation
///
/// Each cached query registers a set of [pattern keys](crate::PatternKey), one for every triple
/// pattern it reads, and the graphs they are scoped to. A statement invalidates a query if any of the pattern keys
/// derived from the statement is registered by the query. This is conservative: a query may be
/// invalidated by a statement that does not actually change its result, but a statement that does
/// change the result always invalidates the query.
///
/// # Concurrency
///
/// Cache hits never wait. Updates of the index entries are serialized. Mutations exclude cache
/// misses for the duration of the invalidation and the delegated operation, so a result that was
/// computed before a mutation has been applied is never cached after its invalidation.
pub struct QueryCache<C: KeyValueCache = MemKeyValueCache> {
    cache: C,
    successor: Option<Arc<dyn QuadStore>>,
    config: QueryCacheConfig,
    log: CacheLog,
    writer: Mutex<WriterState>,
    mutation_gate: RwLock<()>,
}

/// State owned by the single index writer.
#[derive(Default)]
struct WriterState {
    generation: u64,
    /// The cached queries in insertion order, tagged with the generation they were saved in.
    /// Entries whose generation is no longer live are skipped. Used for bounded eviction.
    order: VecDeque<(u64, String)>,
    live: FxHashMap<String, u64>,
}

impl WriterState {
    fn push(&mut self, query: String) {
        self.generation += 1;
        self.live.insert(query.clone(), self.generation);
        self.order.push_back((self.generation, query));
    }

    fn remove(&mut self, query: &str) {
        if self.live.remove(query).is_some() && self.order.len() > 2 * self.live.len() + 16 {
            let live = &self.live;
            self.order
                .retain(|(generation, query)| live.get(query) == Some(generation));
        }
    }

    /// Removes the oldest live query from the order and returns it.
    fn pop_oldest(&mut self) -> Option<String> {
        while let Some((generation, query)) = self.order.pop_front() {
            if self.live.get(&query) == Some(&generation) {
                self.live.remove(&query);
                return Some(query);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}

impl QueryCache<MemKeyValueCache> {
    /// Creates a new [QueryCache] that is backed by a [MemKeyValueCache].
    pub fn in_memory(config: QueryCacheConfig) -> Self {
        Self::new(MemKeyValueCache::new(), config)
    }
}

impl<C: KeyValueCache> QueryCache<C> {
    /// Creates a new [QueryCache] without a successor.
    pub fn new(cache: C, config: QueryCacheConfig) -> Self {
        let log = CacheLog::new(config.log_operations);
        Self {
            cache,
            successor: None,
            config,
            log,
            writer: Mutex::new(WriterState::default()),
            mutation_gate: RwLock::new(()),
        }
    }

    /// Returns a copy of this cache that delegates to `successor`.
    #[must_use]
    pub fn with_successor(mut self, successor: Arc<dyn QuadStore>) -> Self {
        self.successor = Some(successor);
        self
    }

    /// Sets the store that answers the queries that miss the cache.
    pub fn set_successor(&mut self, successor: Arc<dyn QuadStore>) {
        self.successor = Some(successor);
    }

    /// Returns the successor of this cache, if one is configured.
    pub fn successor(&self) -> Option<&Arc<dyn QuadStore>> {
        self.successor.as_ref()
    }

    /// Returns the key-value cache that backs this cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the configuration of this cache.
    pub fn config(&self) -> &QueryCacheConfig {
        &self.config
    }

    /// Returns the operations recorded in this session, in order.
    pub fn log(&self) -> Vec<CacheLogEntry> {
        self.log.entries()
    }

    /// Clears the recorded operations.
    pub fn clear_log(&self) {
        self.log.clear();
    }

    /// Returns the cached entry of `query`.
    pub async fn get_entry(
        &self,
        query: &str,
    ) -> Result<Option<Arc<QueryCacheEntry>>, QueryCacheError> {
        let key = CacheKey::Query(query.to_owned());
        match self.cache.get(&key).await? {
            None => Ok(None),
            Some(CacheValue::Entry(entry)) => Ok(Some(entry)),
            Some(CacheValue::Queries(_)) => Err(QueryCacheError::CorruptedEntry(key.to_string())),
        }
    }

    /// Returns the queries that are registered for the graph or pattern `key`.
    pub async fn dependent_queries(
        &self,
        key: &CacheKey,
    ) -> Result<BTreeSet<String>, QueryCacheError> {
        match self.cache.get(key).await? {
            None => Ok(BTreeSet::new()),
            Some(CacheValue::Queries(queries)) => Ok(queries),
            Some(CacheValue::Entry(_)) => Err(QueryCacheError::CorruptedEntry(key.to_string())),
        }
    }

    /// Evaluates `query`.
    ///
    /// Cached results are returned without accessing the successor. Otherwise, the query is
    /// evaluated by the successor and its result is cached. Queries that cannot be parsed are
    /// forwarded to the successor but their results are never cached.
    pub async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<QueryResults, QueryCacheError> {
        if let Some(result) = self.cached_result(query).await? {
            return Ok(result);
        }

        let successor = self
            .successor
            .as_ref()
            .ok_or(QueryCacheError::StoreNotConfigured)?;
        let metadata = match QueryMetadata::parse(query) {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!("Forwarding query that cannot be analysed without caching: {error}");
                self.log.record(|| CacheLogEntry::Bypass {
                    query: query.to_owned(),
                });
                return with_timeout(options, successor.query(query, options)).await;
            }
        };

        let _gate = self.mutation_gate.read().await;
        let result = with_timeout(options, successor.query(query, options)).await?;
        self.save_result(metadata, result.clone()).await?;
        Ok(result)
    }

    /// Caches `result` as the result of the query described by `metadata`.
    ///
    /// A previous entry of the same query is invalidated first.
    pub async fn save_result(
        &self,
        metadata: QueryMetadata,
        result: QueryResults,
    ) -> Result<(), QueryCacheError> {
        let mut writer = self.writer.lock().await;
        let query = metadata.query.clone();

        self.remove_entry(&mut writer, &query).await?;

        // The back-references are written before the entry. An entry is therefore never visible
        // without the index entries that invalidate it.
        for graph in &metadata.graphs {
            self.add_to_index(CacheKey::Graph(graph.clone()), &query)
                .await?;
        }
        for pattern_key in &metadata.pattern_keys {
            trace!("Registering pattern key {pattern_key}");
            self.add_to_index(CacheKey::Pattern(pattern_key.clone()), &query)
                .await?;
        }

        let entry = QueryCacheEntry::new(metadata, result);
        debug!(
            "Caching query with {} graphs and {} pattern keys",
            entry.graphs.len(),
            entry.pattern_keys.len()
        );
        self.log.record(|| CacheLogEntry::Saved {
            query: entry.query.clone(),
            graphs: entry.graphs.iter().cloned().collect(),
            pattern_keys: entry.pattern_keys.len(),
        });
        self.cache
            .set(CacheKey::Query(query.clone()), CacheValue::Entry(Arc::new(entry)))
            .await?;
        writer.push(query);

        self.evict(&mut writer).await
    }

    /// Removes the cached entry of `query` and every index entry that refers to it.
    ///
    /// Invalidating a query that is not cached does nothing.
    pub async fn invalidate_by_query(&self, query: &str) -> Result<(), QueryCacheError> {
        let mut writer = self.writer.lock().await;
        if self.remove_entry(&mut writer, query).await? {
            self.log.record(|| CacheLogEntry::Invalidated {
                query: query.to_owned(),
            });
        }
        Ok(())
    }

    /// Invalidates every cached query that depends on one of the concrete `statements` and returns
    /// the number of invalidated queries.
    ///
    /// `graph` takes precedence over the graphs of the statements. Fails with
    /// [QueryCacheError::MissingGraph] if a statement has no graph and no graph is given.
    ///
    /// Patterns with wildcards must be resolved to the statements they match first, as
    /// [Self::delete_matching_statements] does.
    pub async fn invalidate_by_triple_pattern(
        &self,
        statements: &[Statement],
        graph: Option<&GraphName>,
    ) -> Result<usize, QueryCacheError> {
        let mut pattern_keys = BTreeSet::new();
        for statement in statements {
            pattern_keys.extend(pattern_keys_for_statement(
                &StatementPattern::from(statement),
                graph,
                self.config.union_default_graph,
            )?);
        }

        let keys = pattern_keys
            .into_iter()
            .map(CacheKey::Pattern)
            .collect::<Vec<_>>();
        self.invalidate_dependents(&keys).await
    }

    /// Adds `statements` to the successor after invalidating all queries they may affect.
    pub async fn add_statements(
        &self,
        statements: &[Statement],
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<(), QueryCacheError> {
        let successor = self.require_successor("add_statements")?;

        let _gate = self.mutation_gate.write().await;
        let invalidated = self.invalidate_by_triple_pattern(statements, graph).await?;
        self.record_mutation("add_statements", invalidated);

        successor.add_statements(statements, graph, options).await?;
        Ok(())
    }

    /// Removes the statements matching `pattern` from the successor after invalidating all
    /// queries they may affect.
    ///
    /// Wildcards are resolved against the successor first, such that the concrete statements that
    /// are about to be removed are invalidated. Without any graph, the pattern is resolved against
    /// every graph instead of failing with [QueryCacheError::MissingGraph].
    pub async fn delete_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<usize, QueryCacheError> {
        let successor = self.require_successor("delete_matching_statements")?;

        let _gate = self.mutation_gate.write().await;
        let has_graph = graph.or(pattern.graph_name.as_ref()).is_some();
        let invalidated = if let (Some(statement), true) = (pattern.to_statement(), has_graph) {
            self.invalidate_by_triple_pattern(&[statement], graph)
                .await?
        } else {
            let matching = with_timeout(
                options,
                successor.get_matching_statements(pattern, graph, options),
            )
            .await?;
            let statements = matching
                .into_iter()
                .map(Statement::from)
                .collect::<Vec<_>>();
            self.invalidate_by_triple_pattern(&statements, None).await?
        };
        self.record_mutation("delete_matching_statements", invalidated);

        Ok(successor
            .delete_matching_statements(pattern, graph, options)
            .await?)
    }

    /// Returns the statements matching `pattern`. The result is cached like a query.
    pub async fn get_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<Vec<Quad>, QueryCacheError> {
        let Some(query) = select_query(pattern, graph) else {
            let successor = self.require_successor("get_matching_statements")?;
            return with_timeout(
                options,
                successor.get_matching_statements(pattern, graph, options),
            )
            .await;
        };

        if let Some(result) = self.cached_result(&query).await? {
            return result
                .into_quads()
                .map_err(|_| QueryCacheError::CorruptedEntry(query));
        }

        let successor = self.require_successor("get_matching_statements")?;

        let _gate = self.mutation_gate.read().await;
        let quads = with_timeout(
            options,
            successor.get_matching_statements(pattern, graph, options),
        )
        .await?;
        self.save_statement_query(&query, QueryResults::from_quads(quads.iter().cloned()))
            .await?;
        Ok(quads)
    }

    /// Returns whether a statement matches `pattern`. The result is cached like a query.
    pub async fn has_matching_statement(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<bool, QueryCacheError> {
        let Some(query) = ask_query(pattern, graph) else {
            let successor = self.require_successor("has_matching_statement")?;
            return with_timeout(
                options,
                successor.has_matching_statement(pattern, graph, options),
            )
            .await;
        };

        if let Some(result) = self.cached_result(&query).await? {
            return result
                .boolean()
                .ok_or(QueryCacheError::CorruptedEntry(query));
        }

        let successor = self.require_successor("has_matching_statement")?;

        let _gate = self.mutation_gate.read().await;
        let exists = with_timeout(
            options,
            successor.has_matching_statement(pattern, graph, options),
        )
        .await?;
        self.save_statement_query(&query, QueryResults::Boolean(exists))
            .await?;
        Ok(exists)
    }

    /// Returns the named graphs of the successor.
    pub async fn graphs(&self) -> Result<Vec<NamedOrBlankNode>, QueryCacheError> {
        Ok(self.require_successor("graphs")?.graphs().await?)
    }

    /// Creates a named graph in the successor after invalidating every query that depends on the
    /// graph or on the set of named graphs.
    pub async fn create_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, QueryCacheError> {
        let successor = self.require_successor("create_graph")?;
        let keys = [
            CacheKey::Graph(GraphKey::from(graph)),
            CacheKey::Graph(GraphKey::AnyNamed),
        ];

        let _gate = self.mutation_gate.write().await;
        let invalidated = self.invalidate_dependents(&keys).await?;
        self.record_mutation("create_graph", invalidated);

        Ok(successor.create_graph(graph, options).await?)
    }

    /// Drops a named graph in the successor after invalidating every query that depends on it.
    pub async fn drop_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, QueryCacheError> {
        let successor = self.require_successor("drop_graph")?;

        let mut keys = vec![
            CacheKey::Graph(GraphKey::from(graph)),
            CacheKey::Graph(GraphKey::AnyNamed),
        ];
        if self.config.union_default_graph {
            keys.push(CacheKey::Graph(GraphKey::Default));
        }

        let _gate = self.mutation_gate.write().await;
        let invalidated = self.invalidate_dependents(&keys).await?;
        self.record_mutation("drop_graph", invalidated);

        Ok(successor.drop_graph(graph, options).await?)
    }

    /// Describes this cache and its chain of successors.
    pub async fn description(&self) -> Result<StoreDescription, QueryCacheError> {
        let successor = self.require_successor("description")?;
        Ok(StoreDescription::new("QueryCache").with_successor(successor.description().await?))
    }

    async fn cached_result(&self, query: &str) -> Result<Option<QueryResults>, QueryCacheError> {
        let Some(entry) = self.get_entry(query).await? else {
            debug!("Cache miss");
            self.log.record(|| CacheLogEntry::Miss {
                query: query.to_owned(),
            });
            return Ok(None);
        };

        debug!("Cache hit");
        self.log.record(|| CacheLogEntry::Hit {
            query: query.to_owned(),
        });
        Ok(Some(entry.result.clone()))
    }

    async fn save_statement_query(
        &self,
        query: &str,
        result: QueryResults,
    ) -> Result<(), QueryCacheError> {
        match QueryMetadata::parse(query) {
            Ok(metadata) => self.save_result(metadata, result).await,
            Err(error) => {
                warn!("Not caching statement query: {error}");
                Ok(())
            }
        }
    }

    /// Invalidates every query listed under one of the index `keys`. Index entries that are left
    /// behind by interrupted saves are removed as well.
    async fn invalidate_dependents(&self, keys: &[CacheKey]) -> Result<usize, QueryCacheError> {
        let mut writer = self.writer.lock().await;
        let mut invalidated = 0;
        for key in keys {
            for query in self.dependent_queries(key).await? {
                if self.remove_entry(&mut writer, &query).await? {
                    trace!("Key {key} invalidates a cached query");
                    self.log.record(|| CacheLogEntry::Invalidated {
                        query: query.clone(),
                    });
                    invalidated += 1;
                }
            }
            self.cache.delete(key).await?;
        }
        Ok(invalidated)
    }

    /// Removes the entry of `query` and its back-references. Returns false if there was no entry.
    async fn remove_entry(
        &self,
        writer: &mut WriterState,
        query: &str,
    ) -> Result<bool, QueryCacheError> {
        let Some(entry) = self.get_entry(query).await? else {
            return Ok(false);
        };

        // The entry is deleted first. An interrupted removal can only leave dangling
        // back-references, which are harmless.
        self.cache.delete(&CacheKey::Query(query.to_owned())).await?;
        writer.remove(query);

        for graph in &entry.graphs {
            self.remove_from_index(CacheKey::Graph(graph.clone()), query)
                .await?;
        }
        for pattern_key in &entry.pattern_keys {
            self.remove_from_index(CacheKey::Pattern(pattern_key.clone()), query)
                .await?;
        }
        Ok(true)
    }

    async fn evict(&self, writer: &mut WriterState) -> Result<(), QueryCacheError> {
        let Some(max_entries) = self.config.max_entries else {
            return Ok(());
        };

        while writer.len() > max_entries.get() {
            let Some(oldest) = writer.pop_oldest() else {
                break;
            };
            if self.remove_entry(writer, &oldest).await? {
                debug!("Evicted query to stay within {max_entries} entries");
                self.log.record(|| CacheLogEntry::Evicted { query: oldest });
            }
        }
        Ok(())
    }

    async fn add_to_index(&self, key: CacheKey, query: &str) -> Result<(), QueryCacheError> {
        let mut queries = self.dependent_queries(&key).await?;
        if queries.insert(query.to_owned()) {
            self.cache.set(key, CacheValue::Queries(queries)).await?;
        }
        Ok(())
    }

    async fn remove_from_index(&self, key: CacheKey, query: &str) -> Result<(), QueryCacheError> {
        let mut queries = self.dependent_queries(&key).await?;
        if !queries.remove(query) {
            return Ok(());
        }

        if queries.is_empty() {
            self.cache.delete(&key).await?;
        } else {
            self.cache.set(key, CacheValue::Queries(queries)).await?;
        }
        Ok(())
    }

    fn require_successor(
        &self,
        operation: &'static str,
    ) -> Result<&Arc<dyn QuadStore>, QueryCacheError> {
        self.successor
            .as_ref()
            .ok_or(QueryCacheError::UnsupportedOperation(operation))
    }

    fn record_mutation(&self, operation: &'static str, invalidated: usize) {
        debug!("{operation} invalidated {invalidated} cached queries");
        self.log.record(|| CacheLogEntry::Mutation {
            operation,
            invalidated,
        });
    }
}

async fn with_timeout<T>(
    options: &QueryOptions,
    future: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, QueryCacheError> {
    let Some(timeout) = options.timeout else {
        return Ok(future.await?);
    };

    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| QueryCacheError::Timeout(timeout))?
        .map_err(QueryCacheError::from)
}
