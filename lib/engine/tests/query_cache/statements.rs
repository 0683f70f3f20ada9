use crate::{ex, example_statement, graph, Fixture};
use quadcache_common::QueryOptions;
use quadcache_model::{BlankNode, GraphName, Statement, StatementPattern};

fn subject_pattern() -> StatementPattern {
    StatementPattern::new(Some(ex("s").into()), None, None)
}

#[tokio::test]
async fn test_get_matching_statements_is_cached() {
    let fixture = Fixture::default();
    let options = QueryOptions::default();
    fixture
        .add_behind_cache(&[example_statement()], Some(&GraphName::DefaultGraph))
        .await;

    for _ in 0..2 {
        let quads = fixture
            .cache
            .get_matching_statements(&subject_pattern(), None, &options)
            .await
            .unwrap();
        assert_eq!(quads.len(), 1);
    }
    assert_eq!(fixture.counter.reads(), 1);

    fixture
        .cache
        .add_statements(
            &[Statement::new(ex("s"), ex("q"), ex("o"))],
            Some(&graph("g")),
            &options,
        )
        .await
        .unwrap();

    let quads = fixture
        .cache
        .get_matching_statements(&subject_pattern(), None, &options)
        .await
        .unwrap();
    assert_eq!(quads.len(), 2);
    assert_eq!(fixture.counter.reads(), 2);
}

#[tokio::test]
async fn test_has_matching_statement_is_cached() {
    let fixture = Fixture::default();
    let options = QueryOptions::default();
    let pattern = StatementPattern::from(example_statement());

    for _ in 0..2 {
        let exists = fixture
            .cache
            .has_matching_statement(&pattern, Some(&graph("g")), &options)
            .await
            .unwrap();
        assert!(!exists);
    }
    assert_eq!(fixture.counter.reads(), 1);

    fixture
        .cache
        .add_statements(&[example_statement()], Some(&graph("g")), &options)
        .await
        .unwrap();

    let exists = fixture
        .cache
        .has_matching_statement(&pattern, Some(&graph("g")), &options)
        .await
        .unwrap();
    assert!(exists);
}

#[tokio::test]
async fn test_statement_in_other_graph_keeps_entry() {
    let fixture = Fixture::default();
    let options = QueryOptions::default();
    let pattern = StatementPattern::from(example_statement());
    fixture
        .cache
        .has_matching_statement(&pattern, Some(&graph("g")), &options)
        .await
        .unwrap();

    fixture
        .cache
        .add_statements(&[example_statement()], Some(&graph("h")), &options)
        .await
        .unwrap();
    fixture
        .cache
        .has_matching_statement(&pattern, Some(&graph("g")), &options)
        .await
        .unwrap();

    assert_eq!(fixture.counter.reads(), 1);
}

#[tokio::test]
async fn test_blank_node_patterns_bypass_cache() {
    let fixture = Fixture::default();
    let options = QueryOptions::default();
    let pattern = StatementPattern::new(Some(BlankNode::default().into()), None, None);

    for _ in 0..2 {
        fixture
            .cache
            .get_matching_statements(&pattern, None, &options)
            .await
            .unwrap();
    }

    assert_eq!(fixture.counter.reads(), 2);
    assert!(fixture.cache.cache().is_empty());
}
