use crate::{ex, Fixture, StubStore};
use futures::future::join_all;
use quadcache_common::QueryOptions;
use quadcache_engine::{CacheKey, GraphKey, QueryCache, QueryCacheConfig, QueryCacheError};
use quadcache_model::{GraphName, Literal, Statement};
use std::sync::Arc;
use std::time::Duration;

const QUERY: &str = "SELECT ?o WHERE { <http://example.com/s> <http://example.com/p> ?o }";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_and_mutations_stay_consistent() {
    let fixture = Fixture::default();

    let tasks = (0..32_i32).map(|i| {
        let cache = Arc::clone(&fixture.cache);
        tokio::spawn(async move {
            if i % 2 == 0 {
                let statement = Statement::new(ex("s"), ex("p"), Literal::from(i));
                cache
                    .add_statements(
                        &[statement],
                        Some(&GraphName::DefaultGraph),
                        &QueryOptions::default(),
                    )
                    .await
            } else {
                cache
                    .query(QUERY, &QueryOptions::default())
                    .await
                    .map(|_| ())
            }
        })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let result = fixture.query(QUERY).await;
    assert_eq!(result.solutions().map(<[_]>::len), Some(16));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_leave_single_index_entry() {
    let fixture = Fixture::default();

    let tasks = (0..16).map(|_| {
        let cache = Arc::clone(&fixture.cache);
        tokio::spawn(async move { cache.query(QUERY, &QueryOptions::default()).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert!(fixture.cache.get_entry(QUERY).await.unwrap().is_some());
    let dependents = fixture
        .cache
        .dependent_queries(&CacheKey::Graph(GraphKey::Default))
        .await
        .unwrap();
    assert_eq!(dependents.len(), 1);
    assert!(fixture.counter.reads() <= 16);
}

#[tokio::test]
async fn test_timed_out_query_is_not_cached() {
    let cache = QueryCache::in_memory(QueryCacheConfig::default())
        .with_successor(Arc::new(StubStore::slow(Duration::from_secs(30))));
    let options = QueryOptions::default().with_timeout(Duration::from_millis(10));

    let error = cache.query("ASK { ?s ?p ?o }", &options).await.unwrap_err();

    assert!(matches!(error, QueryCacheError::Timeout(_)));
    assert!(cache.cache().is_empty());
}
