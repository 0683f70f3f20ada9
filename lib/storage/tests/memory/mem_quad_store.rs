use crate::{ex, example_statement, example_statement_in_graph};
use insta::assert_snapshot;
use quadcache_common::{QuadStore, QueryOptions, QueryResults, StorageError};
use quadcache_model::{
    GraphName, Literal, NamedOrBlankNode, Statement, StatementPattern, Term, Triple,
};
use quadcache_storage::MemQuadStore;

async fn store_with(statements: &[Statement]) -> MemQuadStore {
    let store = MemQuadStore::new();
    store
        .add_statements(statements, None, &QueryOptions::default())
        .await
        .unwrap();
    store
}

async fn query(store: &MemQuadStore, query: &str) -> QueryResults {
    store.query(query, &QueryOptions::default()).await.unwrap()
}

#[tokio::test]
async fn test_add_statement_without_graph_uses_default_graph() {
    let store = store_with(&[example_statement()]).await;

    let quads = store
        .get_matching_statements(
            &StatementPattern::default(),
            Some(&GraphName::DefaultGraph),
            &QueryOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(quads.len(), 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_add_duplicate_statements_no_effect() {
    let store = store_with(&[example_statement(), example_statement()]).await;
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_explicit_graph_wins_over_statement_graph() {
    let store = MemQuadStore::new();
    let graph = GraphName::NamedNode(ex("other"));
    store
        .add_statements(
            &[example_statement_in_graph("graph")],
            Some(&graph),
            &QueryOptions::default(),
        )
        .await
        .unwrap();

    let graphs = store.graphs().await.unwrap();
    assert_eq!(graphs, vec![NamedOrBlankNode::NamedNode(ex("other"))]);
}

#[tokio::test]
async fn test_delete_matching_statements_with_wildcards() {
    let store = store_with(&[
        example_statement_in_graph("g1"),
        example_statement_in_graph("g2"),
        Statement::new(ex("other"), ex("predicate"), ex("object")),
    ])
    .await;

    let pattern = StatementPattern::new(Some(ex("subject").into()), None, None);
    let deleted = store
        .delete_matching_statements(&pattern, None, &QueryOptions::default())
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_has_matching_statement_respects_graph() {
    let store = store_with(&[example_statement_in_graph("g1")]).await;
    let pattern = StatementPattern::from(example_statement());

    let in_g1 = store
        .has_matching_statement(
            &pattern,
            Some(&GraphName::NamedNode(ex("g1"))),
            &QueryOptions::default(),
        )
        .await
        .unwrap();
    let in_default = store
        .has_matching_statement(
            &pattern,
            Some(&GraphName::DefaultGraph),
            &QueryOptions::default(),
        )
        .await
        .unwrap();

    assert!(in_g1);
    assert!(!in_default);
}

#[tokio::test]
async fn test_create_and_drop_graph() {
    let store = MemQuadStore::new();
    let graph = NamedOrBlankNode::NamedNode(ex("g"));

    assert!(store
        .create_graph(&graph, &QueryOptions::default())
        .await
        .unwrap());
    assert!(!store
        .create_graph(&graph, &QueryOptions::default())
        .await
        .unwrap());
    assert_eq!(store.graphs().await.unwrap(), vec![graph.clone()]);

    store
        .add_statements(&[example_statement_in_graph("g")], None, &QueryOptions::default())
        .await
        .unwrap();
    assert!(store
        .drop_graph(&graph, &QueryOptions::default())
        .await
        .unwrap());
    assert!(store.is_empty().await);
    assert!(store.graphs().await.unwrap().is_empty());
    assert!(!store
        .drop_graph(&graph, &QueryOptions::default())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_select_query() {
    let store = store_with(&[example_statement()]).await;

    let result = query(
        &store,
        "SELECT ?s ?o WHERE { ?s <http://example.com/predicate> ?o }",
    )
    .await;

    let solutions = result.solutions().unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get("s"), Some(&Term::from(ex("subject"))));
    assert_eq!(
        solutions[0].get("o"),
        Some(&Term::from(Literal::new_simple_literal("value")))
    );
}

#[tokio::test]
async fn test_select_from_merges_graphs() {
    let store = store_with(&[
        example_statement_in_graph("g1"),
        example_statement_in_graph("g2"),
        example_statement_in_graph("g3"),
    ])
    .await;

    let result = query(
        &store,
        "SELECT * FROM <http://example.com/g1> FROM <http://example.com/g2> WHERE { ?s ?p ?o }",
    )
    .await;

    assert_eq!(result.solutions().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn test_select_graph_variable() {
    let store = store_with(&[
        example_statement_in_graph("g1"),
        example_statement_in_graph("g2"),
        example_statement(),
    ])
    .await;

    let result = query(&store, "SELECT ?g WHERE { GRAPH ?g { ?s ?p ?o } }").await;
    assert_eq!(result.solutions().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_order_by_is_not_implemented() {
    let store = MemQuadStore::new();
    let error = store
        .query(
            "SELECT ?s WHERE { ?s ?p ?o } ORDER BY ?s",
            &QueryOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::NotImplemented(_)));
}

#[tokio::test]
async fn test_ask_query() {
    let store = store_with(&[example_statement()]).await;

    let result = query(&store, "ASK { <http://example.com/subject> ?p \"value\" }").await;
    assert_eq!(result.boolean(), Some(true));

    let result = query(&store, "ASK { <http://example.com/other> ?p ?o }").await;
    assert_eq!(result.boolean(), Some(false));
}

#[tokio::test]
async fn test_construct_query() {
    let store = store_with(&[Statement::new(ex("a"), ex("knows"), ex("b"))]).await;

    let result = query(
        &store,
        "CONSTRUCT { ?o <http://example.com/knownBy> ?s } WHERE { ?s <http://example.com/knows> ?o }",
    )
    .await;

    assert_eq!(
        result.triples(),
        Some([Triple::new(ex("b"), ex("knownBy"), ex("a"))].as_slice())
    );
}

#[tokio::test]
async fn test_union_and_slice() {
    let store = store_with(&[
        Statement::new(ex("a"), ex("p"), ex("x")),
        Statement::new(ex("b"), ex("q"), ex("y")),
    ])
    .await;

    let result = query(
        &store,
        "SELECT ?s WHERE { { ?s <http://example.com/p> ?o } UNION { ?s <http://example.com/q> ?o } }",
    )
    .await;
    assert_eq!(result.solutions().map(<[_]>::len), Some(2));

    let result = query(
        &store,
        "SELECT ?s WHERE { { ?s <http://example.com/p> ?o } UNION { ?s <http://example.com/q> ?o } } LIMIT 1",
    )
    .await;
    assert_eq!(result.solutions().map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn test_unsupported_algebra() {
    let store = MemQuadStore::new();
    let error = store
        .query(
            "SELECT ?s WHERE { ?s ?p ?o FILTER(?o > 1) }",
            &QueryOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::NotImplemented(_)));
}

#[tokio::test]
async fn test_invalid_query() {
    let store = MemQuadStore::new();
    let error = store
        .query("SELECT WHERE", &QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::Query(_)));
}

#[tokio::test]
async fn test_description() {
    let store = store_with(&[example_statement()]).await;
    let description = store.description().await.unwrap();
    assert_snapshot!(description.to_string(), @"MemQuadStore (1 statements)");
}
