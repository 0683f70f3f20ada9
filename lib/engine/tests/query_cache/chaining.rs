use crate::{ex, example_statement};
use insta::assert_snapshot;
use quadcache_common::{QuadStore, QueryOptions};
use quadcache_engine::{QueryCache, QueryCacheConfig, QueryCacheError};
use quadcache_model::{GraphName, NamedOrBlankNode, Statement};
use quadcache_storage::MemQuadStore;
use std::sync::Arc;

const QUERY: &str = "SELECT ?o WHERE { <http://example.com/s> <http://example.com/p> ?o }";

fn chained_caches() -> (Arc<QueryCache>, QueryCache) {
    let store = Arc::new(MemQuadStore::new());
    let inner = Arc::new(
        QueryCache::in_memory(QueryCacheConfig::default()).with_successor(store as Arc<dyn QuadStore>),
    );
    let outer = QueryCache::in_memory(QueryCacheConfig::default())
        .with_successor(Arc::clone(&inner) as Arc<dyn QuadStore>);
    (inner, outer)
}

#[tokio::test]
async fn test_description_follows_chain() {
    let (_, outer) = chained_caches();
    outer
        .add_statements(
            &[example_statement()],
            Some(&GraphName::DefaultGraph),
            &QueryOptions::default(),
        )
        .await
        .unwrap();

    let description = outer.description().await.unwrap();

    assert_snapshot!(description.to_string(), @"QueryCache -> QueryCache -> MemQuadStore (1 statements)");
}

#[tokio::test]
async fn test_description_without_successor() {
    let cache = QueryCache::in_memory(QueryCacheConfig::default());

    let error = cache.description().await.unwrap_err();

    assert!(matches!(
        error,
        QueryCacheError::UnsupportedOperation("description")
    ));
}

#[tokio::test]
async fn test_mutation_invalidates_every_cache_in_chain() {
    let (inner, outer) = chained_caches();
    let options = QueryOptions::default();
    outer
        .add_statements(
            &[example_statement()],
            Some(&GraphName::DefaultGraph),
            &options,
        )
        .await
        .unwrap();
    outer.query(QUERY, &options).await.unwrap();
    assert!(inner.get_entry(QUERY).await.unwrap().is_some());
    assert!(outer.get_entry(QUERY).await.unwrap().is_some());

    outer
        .add_statements(
            &[Statement::new(ex("s"), ex("p"), ex("o2"))],
            Some(&GraphName::DefaultGraph),
            &options,
        )
        .await
        .unwrap();

    assert!(inner.get_entry(QUERY).await.unwrap().is_none());
    assert!(outer.get_entry(QUERY).await.unwrap().is_none());
    let result = outer.query(QUERY, &options).await.unwrap();
    assert_eq!(result.solutions().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_chained_cache_delegates_graphs() {
    let (_, outer) = chained_caches();
    let graph = ex("g");
    let options = QueryOptions::default();

    assert!(outer.create_graph(&graph.clone().into(), &options).await.unwrap());
    assert!(!outer.create_graph(&graph.clone().into(), &options).await.unwrap());

    assert_eq!(outer.graphs().await.unwrap(), vec![NamedOrBlankNode::from(graph)]);
}
