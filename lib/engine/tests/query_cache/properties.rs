use crate::{ex, example_statement, graph, CountingStore, Fixture, StubStore};
use quadcache_common::{QuadStore, QueryOptions, QueryResults};
use quadcache_engine::{
    build_pattern_keys, CacheKey, CacheValue, GraphKey, QueryCache, QueryCacheConfig,
    QueryCacheError, QueryMetadata,
};
use quadcache_model::{GraphName, Literal, NamedNode, Statement};
use std::sync::Arc;

const QUERIES_OVER_S_P_O: [&str; 8] = [
    "SELECT * WHERE { ?s ?p ?o }",
    "SELECT * WHERE { <http://example.com/s> ?p ?o }",
    "SELECT * WHERE { ?s <http://example.com/p> ?o }",
    "SELECT * WHERE { ?s ?p <http://example.com/o> }",
    "SELECT * WHERE { <http://example.com/s> <http://example.com/p> ?o }",
    "SELECT * WHERE { <http://example.com/s> ?p <http://example.com/o> }",
    "SELECT * WHERE { ?s <http://example.com/p> <http://example.com/o> }",
    "ASK { <http://example.com/s> <http://example.com/p> <http://example.com/o> }",
];

#[tokio::test]
async fn test_saved_result_is_returned_without_store_access() {
    let fixture = Fixture::default();
    let query = "SELECT * WHERE { ?s ?p ?o }";
    let result = QueryResults::Boolean(false);

    fixture
        .cache
        .save_result(QueryMetadata::parse(query).unwrap(), result.clone())
        .await
        .unwrap();

    assert_eq!(fixture.query(query).await, result);
    assert_eq!(fixture.query(query).await, result);
    assert_eq!(fixture.counter.reads(), 0);
}

#[tokio::test]
async fn test_every_specificity_level_is_invalidated() {
    let fixture = Fixture::default();
    for query in QUERIES_OVER_S_P_O {
        fixture.query(query).await;
    }
    assert_eq!(fixture.counter.reads(), 8);

    let invalidated = fixture
        .cache
        .invalidate_by_triple_pattern(
            &[example_statement()],
            Some(&GraphName::DefaultGraph),
        )
        .await
        .unwrap();
    assert_eq!(invalidated, 8);

    for query in QUERIES_OVER_S_P_O {
        fixture.query(query).await;
    }
    assert_eq!(fixture.counter.reads(), 16);
}

#[tokio::test]
async fn test_unrelated_statement_keeps_entries() {
    let fixture = Fixture::default();
    for query in &QUERIES_OVER_S_P_O[1..] {
        fixture.query(query).await;
    }

    let unrelated = Statement::new(ex("other"), ex("other"), Literal::from(42));
    let invalidated = fixture
        .cache
        .invalidate_by_triple_pattern(&[unrelated], Some(&GraphName::DefaultGraph))
        .await
        .unwrap();

    assert_eq!(invalidated, 0);
    for query in &QUERIES_OVER_S_P_O[1..] {
        fixture.query(query).await;
    }
    assert_eq!(fixture.counter.reads(), 7);
}

#[tokio::test]
async fn test_invalidate_by_query_cleans_indices() {
    let fixture = Fixture::default();
    let query = "SELECT * WHERE { <http://example.com/s> ?p ?o . ?o <http://example.com/p> ?x }";
    let other = "SELECT * WHERE { ?o <http://example.com/p> ?x }";
    fixture.query(query).await;
    fixture.query(other).await;

    fixture.cache.invalidate_by_query(query).await.unwrap();

    for key in fixture.cache.cache().keys() {
        match fixture.cache.cache().peek(&key) {
            Some(CacheValue::Queries(queries)) => {
                assert!(!queries.contains(query), "{key} still refers to the query");
                assert!(!queries.is_empty(), "{key} is empty but was not removed");
            }
            Some(CacheValue::Entry(entry)) => assert_eq!(entry.query, other),
            None => unreachable!(),
        }
    }
    assert!(fixture.cache.get_entry(other).await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalidate_by_query_is_idempotent() {
    let fixture = Fixture::default();
    let query = "SELECT * WHERE { ?s <http://example.com/p> ?o }";
    fixture.query("ASK { ?s ?p ?o }").await;
    fixture.query(query).await;

    fixture.cache.invalidate_by_query(query).await.unwrap();
    let keys_after_once = fixture.cache.cache().keys();

    fixture.cache.invalidate_by_query(query).await.unwrap();
    assert_eq!(fixture.cache.cache().keys(), keys_after_once);
}

#[test]
fn test_pattern_key_counts() {
    let graph = GraphKey::named("http://example.com/g").unwrap();
    let bound = build_pattern_keys(Some("<s>"), Some("<p>"), Some("<o>"), &graph);
    let unbound = build_pattern_keys(None, None, None, &graph);

    assert_eq!(bound.len(), 8);
    assert_eq!(unbound.len(), 1);
    assert_eq!(unbound[0].to_string(), "<http://example.com/g>__.__*__.__*__.__*");
}

#[tokio::test]
async fn test_multi_graph_query_is_invalidated_by_either_graph() {
    let fixture = Fixture::default();
    let query = "SELECT ?s ?p ?o FROM <http://g1/> FROM <http://g2/> WHERE {?s ?p ?o}";
    let g2 = GraphName::NamedNode(NamedNode::new("http://g2/").unwrap());

    let before = fixture.query(query).await;
    assert_eq!(before.solutions().map(<[_]>::len), Some(0));
    for key in [
        GraphKey::named("http://g1/").unwrap(),
        GraphKey::named("http://g2/").unwrap(),
    ] {
        let pattern_key = build_pattern_keys(None, None, None, &key).remove(0);
        let queries = fixture
            .cache
            .dependent_queries(&CacheKey::Pattern(pattern_key))
            .await
            .unwrap();
        assert!(queries.contains(query));
    }

    fixture
        .cache
        .add_statements(&[example_statement()], Some(&g2), &QueryOptions::default())
        .await
        .unwrap();

    let after = fixture.query(query).await;
    assert_eq!(after.solutions().map(<[_]>::len), Some(1));
    assert_eq!(fixture.counter.reads(), 2);
}

#[tokio::test]
async fn test_end_to_end_with_stub_store() {
    let query = "ASK {<http://s/> <http://p/> <http://o/>}";

    let cache = QueryCache::in_memory(QueryCacheConfig::default());
    let error = cache
        .query(query, &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, QueryCacheError::StoreNotConfigured));

    let stub = Arc::new(CountingStore::new(
        Arc::new(StubStore::default()) as Arc<dyn QuadStore>
    ));
    let mut cache = cache;
    cache.set_successor(Arc::clone(&stub) as Arc<dyn QuadStore>);

    let first = cache.query(query, &QueryOptions::default()).await.unwrap();
    let second = cache.query(query, &QueryOptions::default()).await.unwrap();

    assert_eq!(first.boolean(), Some(true));
    assert_eq!(second.boolean(), Some(true));
    assert_eq!(stub.reads(), 1);
}

#[tokio::test]
async fn test_statement_in_named_graph_invalidates_graph_variable_query() {
    let fixture = Fixture::default();
    let query = "SELECT ?g WHERE { GRAPH ?g { ?s <http://example.com/p> ?o } }";
    fixture.query(query).await;

    fixture
        .cache
        .add_statements(
            &[example_statement()],
            Some(&graph("g")),
            &QueryOptions::default(),
        )
        .await
        .unwrap();

    let result = fixture.query(query).await;
    assert_eq!(result.solutions().map(<[_]>::len), Some(1));
    assert_eq!(fixture.counter.reads(), 2);
}

#[tokio::test]
async fn test_unparsable_query_is_forwarded_but_not_cached() {
    let stub = Arc::new(CountingStore::new(
        Arc::new(StubStore::default()) as Arc<dyn QuadStore>
    ));
    let cache = QueryCache::in_memory(QueryCacheConfig::default())
        .with_successor(Arc::clone(&stub) as Arc<dyn QuadStore>);

    for _ in 0..2 {
        let result = cache
            .query("NOT A SPARQL QUERY", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(result.boolean(), Some(true));
    }

    assert_eq!(stub.reads(), 2);
    assert!(cache.cache().is_empty());
}
