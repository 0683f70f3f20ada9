use crate::cache::KeyValueCache;
use crate::QueryCache;
use async_trait::async_trait;
use quadcache_common::{QuadStore, QueryOptions, QueryResults, StorageError, StoreDescription};
use quadcache_model::{GraphName, NamedOrBlankNode, Quad, Statement, StatementPattern};

#[async_trait]
impl<C: KeyValueCache> QuadStore for QueryCache<C> {
    async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<QueryResults, StorageError> {
        Ok(QueryCache::query(self, query, options).await?)
    }

    async fn add_statements(
        &self,
        statements: &[Statement],
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<(), StorageError> {
        Ok(QueryCache::add_statements(self, statements, graph, options).await?)
    }

    async fn delete_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<usize, StorageError> {
        Ok(QueryCache::delete_matching_statements(self, pattern, graph, options).await?)
    }

    async fn get_matching_statements(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<Vec<Quad>, StorageError> {
        Ok(QueryCache::get_matching_statements(self, pattern, graph, options).await?)
    }

    async fn has_matching_statement(
        &self,
        pattern: &StatementPattern,
        graph: Option<&GraphName>,
        options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        Ok(QueryCache::has_matching_statement(self, pattern, graph, options).await?)
    }

    async fn graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        Ok(QueryCache::graphs(self).await?)
    }

    async fn create_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        Ok(QueryCache::create_graph(self, graph, options).await?)
    }

    async fn drop_graph(
        &self,
        graph: &NamedOrBlankNode,
        options: &QueryOptions,
    ) -> Result<bool, StorageError> {
        Ok(QueryCache::drop_graph(self, graph, options).await?)
    }

    async fn description(&self) -> Result<StoreDescription, StorageError> {
        Ok(QueryCache::description(self).await?)
    }
}
