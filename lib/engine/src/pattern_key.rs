//! Keys of the pattern index.
//!
//! A [PatternKey] identifies a triple pattern within a graph scope where each position is either
//! a concrete term or a wildcard. Cached queries register one key per triple pattern they contain.
//! A statement satisfies all keys that can be derived from it by replacing any subset of its
//! terms with wildcards. Hence, a statement matches a query's pattern iff one of the statement's
//! keys is registered by the query.

use crate::QueryCacheError;
use quadcache_model::{GraphName, GraphNameRef, NamedOrBlankNode, StatementPattern};
use std::fmt::{Display, Formatter};

/// The separator used when rendering pattern keys.
pub const KEY_SEPARATOR: &str = "__.__";

/// The marker for a wildcard position when rendering pattern keys.
pub const WILDCARD: &str = "*";

/// The graph scope of a [PatternKey].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphKey {
    /// The default graph of the store.
    Default,
    /// A named graph, stored in N-Triples syntax (e.g., `<http://example.com/g>`).
    Named(String),
    /// Any named graph. This is the scope of `GRAPH ?g { ... }` patterns if the query does not
    /// restrict the set of named graphs.
    AnyNamed,
}

impl GraphKey {
    /// Creates a [GraphKey] for the named graph identified by `iri`.
    ///
    /// Fails if `iri` is empty since pattern keys cannot be computed without a graph.
    pub fn named(iri: &str) -> Result<Self, QueryCacheError> {
        if iri.is_empty() {
            return Err(QueryCacheError::MissingGraph(String::from("<>")));
        }
        Ok(Self::Named(format!("<{iri}>")))
    }

    /// Returns true iff this is the scope of a named graph (or any named graph).
    pub fn is_named(&self) -> bool {
        !matches!(self, Self::Default)
    }
}

impl From<GraphNameRef<'_>> for GraphKey {
    fn from(value: GraphNameRef<'_>) -> Self {
        match value {
            GraphNameRef::DefaultGraph => Self::Default,
            graph => Self::Named(graph.to_string()),
        }
    }
}

impl From<&GraphName> for GraphKey {
    fn from(value: &GraphName) -> Self {
        value.as_ref().into()
    }
}

impl From<&NamedOrBlankNode> for GraphKey {
    fn from(value: &NamedOrBlankNode) -> Self {
        Self::Named(value.to_string())
    }
}

impl Display for GraphKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphKey::Default => f.write_str("DEFAULT"),
            GraphKey::Named(name) => f.write_str(name),
            GraphKey::AnyNamed => f.write_str(WILDCARD),
        }
    }
}

/// A triple pattern scoped to a graph. [None] positions are wildcards, bound positions hold a term
/// in N-Triples syntax.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternKey {
    pub graph: GraphKey,
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
}

impl PatternKey {
    pub fn new(
        graph: GraphKey,
        subject: Option<String>,
        predicate: Option<String>,
        object: Option<String>,
    ) -> Self {
        Self {
            graph,
            subject,
            predicate,
            object,
        }
    }

    /// Returns the number of bound positions.
    pub fn specificity(&self) -> usize {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter(|position| position.is_some())
            .count()
    }
}

impl Display for PatternKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.graph)?;
        for position in [&self.subject, &self.predicate, &self.object] {
            f.write_str(KEY_SEPARATOR)?;
            f.write_str(position.as_deref().unwrap_or(WILDCARD))?;
        }
        Ok(())
    }
}

/// Which positions a key keeps bound, in the order `(s, p, o)`. Ordered from the most general to
/// the most specific key.
const SPECIFICITY_LEVELS: [(bool, bool, bool); 8] = [
    (false, false, false),
    (true, false, false),
    (false, true, false),
    (false, false, true),
    (true, true, false),
    (true, false, true),
    (false, true, true),
    (true, true, true),
];

/// Builds all pattern keys within `graph` that are satisfied by a triple with the given terms.
///
/// Terms are given in N-Triples syntax and [None] marks an unbound position. For `n` bound
/// positions, this returns `2^n` distinct keys, from `(graph, *, *, *)` up to the key that binds
/// every bound position.
pub fn build_pattern_keys(
    subject: Option<&str>,
    predicate: Option<&str>,
    object: Option<&str>,
    graph: &GraphKey,
) -> Vec<PatternKey> {
    SPECIFICITY_LEVELS
        .iter()
        .filter(|(s, p, o)| {
            (!s || subject.is_some()) && (!p || predicate.is_some()) && (!o || object.is_some())
        })
        .map(|(s, p, o)| {
            PatternKey::new(
                graph.clone(),
                subject.filter(|_| *s).map(str::to_owned),
                predicate.filter(|_| *p).map(str::to_owned),
                object.filter(|_| *o).map(str::to_owned),
            )
        })
        .collect()
}

/// Builds the pattern keys that must be invalidated if statements matching `pattern` are added or
/// removed.
///
/// The graph is resolved from `graph`, then from the graph of the pattern. If neither is given,
/// this fails with [QueryCacheError::MissingGraph]. Besides the keys for the graph itself, a
/// statement in a named graph also satisfies keys of the [GraphKey::AnyNamed] scope and, if
/// `union_default_graph` is set, of the [GraphKey::Default] scope.
pub fn pattern_keys_for_statement(
    pattern: &StatementPattern,
    graph: Option<&GraphName>,
    union_default_graph: bool,
) -> Result<Vec<PatternKey>, QueryCacheError> {
    let graph = graph
        .or(pattern.graph_name.as_ref())
        .ok_or_else(|| QueryCacheError::MissingGraph(pattern.to_string()))?;

    let subject = pattern.subject.as_ref().map(ToString::to_string);
    let predicate = pattern.predicate.as_ref().map(ToString::to_string);
    let object = pattern.object.as_ref().map(ToString::to_string);

    let graph = GraphKey::from(graph);
    let mut scopes = vec![graph.clone()];
    if graph.is_named() {
        scopes.push(GraphKey::AnyNamed);
        if union_default_graph {
            scopes.push(GraphKey::Default);
        }
    }

    Ok(scopes
        .iter()
        .flat_map(|scope| {
            build_pattern_keys(
                subject.as_deref(),
                predicate.as_deref(),
                object.as_deref(),
                scope,
            )
        })
        .collect())
}
