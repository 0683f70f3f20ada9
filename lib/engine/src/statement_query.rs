//! SPARQL renderings of statement patterns.
//!
//! Statement reads are cached like any other query. The rendered query is the key of the cached
//! entry and the source of its dependencies. It is never sent to the successor.

use quadcache_model::{GraphName, StatementPattern};
use std::fmt::Display;

/// Renders an `ASK` query that holds iff a statement matches `pattern`.
///
/// Returns [None] if the pattern contains blank nodes, which have no SPARQL constant syntax.
pub fn ask_query(pattern: &StatementPattern, graph: Option<&GraphName>) -> Option<String> {
    let body = where_clause(pattern, graph)?;
    Some(format!("ASK WHERE {{ {body} }}"))
}

/// Renders a `SELECT` query that returns every statement matching `pattern` as
/// `?graph ?subject ?predicate ?object` solutions.
///
/// Returns [None] if the pattern contains blank nodes, which have no SPARQL constant syntax.
pub fn select_query(pattern: &StatementPattern, graph: Option<&GraphName>) -> Option<String> {
    let body = where_clause(pattern, graph)?;
    Some(format!(
        "SELECT ?graph ?subject ?predicate ?object WHERE {{ {body} }}"
    ))
}

fn where_clause(pattern: &StatementPattern, graph: Option<&GraphName>) -> Option<String> {
    if pattern.has_blank_node() || graph.is_some_and(GraphName::is_blank_node) {
        return None;
    }

    let triple = format!(
        "{} {} {}",
        position(pattern.subject.as_ref(), "?subject"),
        position(pattern.predicate.as_ref(), "?predicate"),
        position(pattern.object.as_ref(), "?object"),
    );
    let clause = match graph.or(pattern.graph_name.as_ref()) {
        None => format!("{{ {triple} }} UNION {{ GRAPH ?graph {{ {triple} }} }}"),
        Some(GraphName::DefaultGraph) => triple,
        Some(graph) => format!("GRAPH {graph} {{ {triple} }}"),
    };
    Some(clause)
}

fn position(term: Option<&impl Display>, variable: &str) -> String {
    term.map_or_else(|| variable.to_owned(), ToString::to_string)
}
