//! Extracts the dependencies of a SPARQL query.
//!
//! A cached result depends on every graph and triple pattern the query reads. The extraction walks
//! the query algebra and tracks the graphs that are active for each part of the query, similar to
//! how a query planner resolves the active graph of a `GRAPH` clause.

use crate::pattern_key::{GraphKey, PatternKey};
use quadcache_model::{SparqlSyntaxError, TermPattern, TriplePattern};
use spargebra::algebra::{
    AggregateExpression, Expression, GraphPattern, OrderExpression, PropertyPathExpression,
    QueryDataset,
};
use spargebra::term::NamedNodePattern;
use spargebra::Query;
use std::collections::BTreeSet;

/// A query string together with the keys its result depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMetadata {
    /// The query string. Used as the key of the cached entry.
    pub query: String,
    /// The graphs the query reads from.
    pub graphs: BTreeSet<GraphKey>,
    /// The triple patterns the query reads, scoped to the graphs they are evaluated against.
    pub pattern_keys: BTreeSet<PatternKey>,
}

impl QueryMetadata {
    /// Creates metadata from already decomposed triple patterns.
    ///
    /// Every pattern is registered under every graph in `graphs`. If `graphs` is empty, the
    /// patterns are registered under the default graph. Variables and blank nodes are wildcards.
    pub fn new(
        query: impl Into<String>,
        graphs: impl IntoIterator<Item = GraphKey>,
        patterns: &[TriplePattern],
    ) -> Self {
        let mut scopes = graphs.into_iter().collect::<Vec<_>>();
        scopes.dedup();
        if scopes.is_empty() {
            scopes.push(GraphKey::Default);
        }

        let mut collector = DependencyCollector::new(None, scopes);
        for pattern in patterns {
            collector.collect_triple_pattern(pattern);
        }
        collector.into_metadata(query.into())
    }

    /// Parses `query` and extracts the graphs and triple patterns it depends on.
    pub fn parse(query: &str) -> Result<Self, SparqlSyntaxError> {
        let parsed = Query::parse(query, None)?;
        let (dataset, pattern, is_describe) = match &parsed {
            Query::Select {
                dataset, pattern, ..
            }
            | Query::Construct {
                dataset, pattern, ..
            }
            | Query::Ask {
                dataset, pattern, ..
            } => (dataset.as_ref(), pattern, false),
            Query::Describe {
                dataset, pattern, ..
            } => (dataset.as_ref(), pattern, true),
        };

        let mut collector = DependencyCollector::new(dataset.cloned(), default_scopes(dataset));
        collector.collect_graph_pattern(pattern);
        if is_describe {
            // The description of a resource may contain any statement of the active graphs.
            collector.register(None, None, None);
        }
        Ok(collector.into_metadata(query.to_owned()))
    }
}

/// The graphs that are active outside any `GRAPH` clause.
fn default_scopes(dataset: Option<&QueryDataset>) -> Vec<GraphKey> {
    let Some(dataset) = dataset else {
        return vec![GraphKey::Default];
    };

    let scopes = dataset
        .default
        .iter()
        .chain(dataset.named.iter().flatten())
        .map(|graph| GraphKey::Named(graph.to_string()))
        .collect::<BTreeSet<_>>();
    if scopes.is_empty() {
        return vec![GraphKey::Default];
    }
    scopes.into_iter().collect()
}

struct DependencyCollector {
    dataset: Option<QueryDataset>,
    scopes: Vec<GraphKey>,
    graphs: BTreeSet<GraphKey>,
    pattern_keys: BTreeSet<PatternKey>,
}

impl DependencyCollector {
    fn new(dataset: Option<QueryDataset>, scopes: Vec<GraphKey>) -> Self {
        Self {
            dataset,
            scopes,
            graphs: BTreeSet::new(),
            pattern_keys: BTreeSet::new(),
        }
    }

    fn into_metadata(self, query: String) -> QueryMetadata {
        QueryMetadata {
            query,
            graphs: self.graphs,
            pattern_keys: self.pattern_keys,
        }
    }

    fn register(
        &mut self,
        subject: Option<String>,
        predicate: Option<String>,
        object: Option<String>,
    ) {
        for scope in &self.scopes {
            self.graphs.insert(scope.clone());
            self.pattern_keys.insert(PatternKey::new(
                scope.clone(),
                subject.clone(),
                predicate.clone(),
                object.clone(),
            ));
        }
    }

    fn collect_triple_pattern(&mut self, pattern: &TriplePattern) {
        let predicate = match &pattern.predicate {
            NamedNodePattern::NamedNode(node) => Some(node.to_string()),
            NamedNodePattern::Variable(_) => None,
        };
        self.register(
            term_key(&pattern.subject),
            predicate,
            term_key(&pattern.object),
        );
    }

    fn collect_graph_pattern(&mut self, pattern: &GraphPattern) {
        match pattern {
            GraphPattern::Bgp { patterns } => {
                for pattern in patterns {
                    self.collect_triple_pattern(pattern);
                }
            }
            GraphPattern::Path {
                subject,
                path,
                object,
            } => self.collect_path(subject, path, object),
            GraphPattern::Join { left, right }
            | GraphPattern::Union { left, right }
            | GraphPattern::Minus { left, right } => {
                self.collect_graph_pattern(left);
                self.collect_graph_pattern(right);
            }
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => {
                self.collect_graph_pattern(left);
                self.collect_graph_pattern(right);
                if let Some(expression) = expression {
                    self.collect_expression(expression);
                }
            }
            GraphPattern::Filter { expr, inner } => {
                self.collect_graph_pattern(inner);
                self.collect_expression(expr);
            }
            GraphPattern::Graph { name, inner } => {
                let scopes = match name {
                    NamedNodePattern::NamedNode(node) => vec![GraphKey::Named(node.to_string())],
                    NamedNodePattern::Variable(_) => match self
                        .dataset
                        .as_ref()
                        .and_then(|dataset| dataset.named.as_ref())
                    {
                        Some(named) if !named.is_empty() => named
                            .iter()
                            .map(|graph| GraphKey::Named(graph.to_string()))
                            .collect(),
                        _ => vec![GraphKey::AnyNamed],
                    },
                };

                // The set of matching graphs is a dependency even if the inner pattern is empty.
                self.graphs.extend(scopes.iter().cloned());
                let old_scopes = std::mem::replace(&mut self.scopes, scopes);
                if matches!(inner.as_ref(), GraphPattern::Bgp { patterns } if patterns.is_empty()) {
                    self.register(None, None, None);
                }
                self.collect_graph_pattern(inner);
                self.scopes = old_scopes;
            }
            GraphPattern::Extend {
                inner, expression, ..
            } => {
                self.collect_graph_pattern(inner);
                self.collect_expression(expression);
            }
            GraphPattern::OrderBy { inner, expression } => {
                self.collect_graph_pattern(inner);
                for expression in expression {
                    match expression {
                        OrderExpression::Asc(expression) | OrderExpression::Desc(expression) => {
                            self.collect_expression(expression);
                        }
                    }
                }
            }
            GraphPattern::Group {
                inner, aggregates, ..
            } => {
                self.collect_graph_pattern(inner);
                for (_, aggregate) in aggregates {
                    match aggregate {
                        AggregateExpression::CountSolutions { .. } => {}
                        AggregateExpression::FunctionCall { expr, .. } => {
                            self.collect_expression(expr);
                        }
                    }
                }
            }
            GraphPattern::Project { inner, .. }
            | GraphPattern::Distinct { inner }
            | GraphPattern::Reduced { inner }
            | GraphPattern::Slice { inner, .. }
            | GraphPattern::Service { inner, .. } => self.collect_graph_pattern(inner),
            GraphPattern::Values { .. } => {}
        }
    }

    fn collect_path(
        &mut self,
        subject: &TermPattern,
        path: &PropertyPathExpression,
        object: &TermPattern,
    ) {
        match path {
            PropertyPathExpression::NamedNode(predicate) => {
                self.register(
                    term_key(subject),
                    Some(predicate.to_string()),
                    term_key(object),
                );
            }
            PropertyPathExpression::Reverse(inner) => match inner.as_ref() {
                PropertyPathExpression::NamedNode(predicate) => {
                    self.register(
                        term_key(object),
                        Some(predicate.to_string()),
                        term_key(subject),
                    );
                }
                inner => self.collect_path_predicates(inner),
            },
            path => self.collect_path_predicates(path),
        }
    }

    /// Registers `(*, p, *)` for every predicate of a complex path. Paths that can match without
    /// any statement (zero-length paths) or that match negated property sets depend on every
    /// statement of the active graphs.
    fn collect_path_predicates(&mut self, path: &PropertyPathExpression) {
        match path {
            PropertyPathExpression::NamedNode(predicate) => {
                self.register(None, Some(predicate.to_string()), None);
            }
            PropertyPathExpression::Reverse(inner) | PropertyPathExpression::OneOrMore(inner) => {
                self.collect_path_predicates(inner);
            }
            PropertyPathExpression::Sequence(left, right)
            | PropertyPathExpression::Alternative(left, right) => {
                self.collect_path_predicates(left);
                self.collect_path_predicates(right);
            }
            PropertyPathExpression::ZeroOrMore(_)
            | PropertyPathExpression::ZeroOrOne(_)
            | PropertyPathExpression::NegatedPropertySet(_) => self.register(None, None, None),
        }
    }

    fn collect_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::NamedNode(_)
            | Expression::Literal(_)
            | Expression::Variable(_)
            | Expression::Bound(_) => {}
            Expression::Or(left, right)
            | Expression::And(left, right)
            | Expression::Equal(left, right)
            | Expression::SameTerm(left, right)
            | Expression::Greater(left, right)
            | Expression::GreaterOrEqual(left, right)
            | Expression::Less(left, right)
            | Expression::LessOrEqual(left, right)
            | Expression::Add(left, right)
            | Expression::Subtract(left, right)
            | Expression::Multiply(left, right)
            | Expression::Divide(left, right) => {
                self.collect_expression(left);
                self.collect_expression(right);
            }
            Expression::UnaryPlus(inner)
            | Expression::UnaryMinus(inner)
            | Expression::Not(inner) => self.collect_expression(inner),
            Expression::In(inner, list) => {
                self.collect_expression(inner);
                for expression in list {
                    self.collect_expression(expression);
                }
            }
            Expression::If(condition, then, otherwise) => {
                self.collect_expression(condition);
                self.collect_expression(then);
                self.collect_expression(otherwise);
            }
            Expression::Coalesce(list) | Expression::FunctionCall(_, list) => {
                for expression in list {
                    self.collect_expression(expression);
                }
            }
            Expression::Exists(pattern) => self.collect_graph_pattern(pattern),
        }
    }
}

/// Renders a bound term in N-Triples syntax. Variables and blank nodes of a query are wildcards.
fn term_key(term: &TermPattern) -> Option<String> {
    match term {
        TermPattern::Variable(_) | TermPattern::BlankNode(_) => None,
        term => Some(term.to_string()),
    }
}
