use quadcache_common::StorageError;
use quadcache_model::{
    BlankNode, Dataset, GraphName, NamedNodePattern, NamedNodeRef, NamedOrBlankNode, Subject,
    Term, TermPattern, TermRef, Triple, TriplePattern, TripleRef, Variable,
};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::algebra::{GraphPattern, QueryDataset};

/// A mapping from variables to terms.
pub(crate) type Solution = FxHashMap<Variable, Term>;

/// Evaluates graph patterns over a [Dataset].
///
/// Supports basic graph patterns, joins, unions, `GRAPH` clauses, projections, `DISTINCT`,
/// `REDUCED` and slices. Blank nodes in patterns are treated as variables.
pub(crate) struct Evaluator<'a> {
    dataset: &'a Dataset,
    /// The graphs that are merged into the default graph of the query.
    default_graph: Vec<GraphName>,
    /// The graphs that can be bound by `GRAPH ?g { ... }`.
    named_graphs: Vec<GraphName>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        dataset: &'a Dataset,
        query_dataset: Option<&QueryDataset>,
        store_graphs: &[NamedOrBlankNode],
    ) -> Self {
        let (default_graph, named_graphs) = match query_dataset {
            None => (
                vec![GraphName::DefaultGraph],
                store_graphs.iter().cloned().map(GraphName::from).collect(),
            ),
            Some(query_dataset) => (
                query_dataset
                    .default
                    .iter()
                    .cloned()
                    .map(GraphName::NamedNode)
                    .collect(),
                query_dataset
                    .named
                    .iter()
                    .flatten()
                    .cloned()
                    .map(GraphName::NamedNode)
                    .collect(),
            ),
        };
        Self {
            dataset,
            default_graph,
            named_graphs,
        }
    }

    pub(crate) fn evaluate(&self, pattern: &GraphPattern) -> Result<Vec<Solution>, StorageError> {
        self.evaluate_in(pattern, &self.default_graph)
    }

    fn evaluate_in(
        &self,
        pattern: &GraphPattern,
        active_graph: &[GraphName],
    ) -> Result<Vec<Solution>, StorageError> {
        match pattern {
            GraphPattern::Bgp { patterns } => {
                let triples = self.triples_in(active_graph);
                let mut solutions = vec![Solution::default()];
                for pattern in patterns {
                    solutions = solutions
                        .iter()
                        .flat_map(|solution| {
                            triples
                                .iter()
                                .filter_map(move |triple| bind_triple(solution, pattern, *triple))
                        })
                        .collect();
                }
                Ok(solutions)
            }
            GraphPattern::Join { left, right } => {
                let left = self.evaluate_in(left, active_graph)?;
                let right = self.evaluate_in(right, active_graph)?;
                Ok(join(&left, &right))
            }
            GraphPattern::Union { left, right } => {
                let mut solutions = self.evaluate_in(left, active_graph)?;
                solutions.extend(self.evaluate_in(right, active_graph)?);
                Ok(solutions)
            }
            GraphPattern::Graph { name, inner } => match name {
                NamedNodePattern::NamedNode(node) => {
                    self.evaluate_in(inner, &[GraphName::NamedNode(node.clone())])
                }
                NamedNodePattern::Variable(variable) => {
                    let mut solutions = Vec::new();
                    for graph in &self.named_graphs {
                        let Some(graph_term) = graph_term(graph) else {
                            continue;
                        };
                        for mut solution in self.evaluate_in(inner, std::slice::from_ref(graph))? {
                            if bind_variable(&mut solution, variable, graph_term.as_ref()) {
                                solutions.push(solution);
                            }
                        }
                    }
                    Ok(solutions)
                }
            },
            GraphPattern::Project { inner, variables } => {
                let mut solutions = self.evaluate_in(inner, active_graph)?;
                for solution in &mut solutions {
                    solution.retain(|variable, _| variables.contains(variable));
                }
                Ok(solutions)
            }
            GraphPattern::Distinct { inner } | GraphPattern::Reduced { inner } => {
                let mut distinct = Vec::new();
                for solution in self.evaluate_in(inner, active_graph)? {
                    if !distinct.contains(&solution) {
                        distinct.push(solution);
                    }
                }
                Ok(distinct)
            }
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => {
                let solutions = self.evaluate_in(inner, active_graph)?;
                Ok(solutions
                    .into_iter()
                    .skip(*start)
                    .take(length.unwrap_or(usize::MAX))
                    .collect())
            }
            pattern => Err(StorageError::NotImplemented(format!(
                "Evaluating the graph pattern {pattern}"
            ))),
        }
    }

    /// Returns the distinct triples of the merge of `graphs`.
    fn triples_in(&self, graphs: &[GraphName]) -> Vec<TripleRef<'a>> {
        let mut seen = FxHashSet::default();
        self.dataset
            .iter()
            .filter(|quad| graphs.iter().any(|graph| graph.as_ref() == quad.graph_name))
            .map(|quad| TripleRef::new(quad.subject, quad.predicate, quad.object))
            .filter(|triple| seen.insert(*triple))
            .collect()
    }
}

/// Returns the variables of the solutions of a `SELECT` query. Uses the projection if it exists.
pub(crate) fn projected_variables(pattern: &GraphPattern, solutions: &[Solution]) -> Vec<Variable> {
    match pattern {
        GraphPattern::Project { variables, .. } => variables.clone(),
        GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => projected_variables(inner, solutions),
        _ => {
            let mut variables = solutions
                .iter()
                .flat_map(|solution| solution.keys())
                .filter(|variable| !variable.as_str().starts_with(BLANK_NODE_PREFIX))
                .cloned()
                .collect::<FxHashSet<_>>()
                .into_iter()
                .collect::<Vec<_>>();
            variables.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
            variables
        }
    }
}

/// Instantiates the `CONSTRUCT` `template` for each solution. Blank nodes of the template are
/// fresh for every solution. Triples with unbound or invalid positions are skipped.
pub(crate) fn construct(template: &[TriplePattern], solutions: &[Solution]) -> Vec<Triple> {
    let mut seen = FxHashSet::default();
    let mut triples = Vec::new();
    for solution in solutions {
        let mut blank_nodes = FxHashMap::<BlankNode, BlankNode>::default();
        for pattern in template {
            let Some(triple) = instantiate(pattern, solution, &mut blank_nodes) else {
                continue;
            };
            if seen.insert(triple.clone()) {
                triples.push(triple);
            }
        }
    }
    triples
}

fn instantiate(
    pattern: &TriplePattern,
    solution: &Solution,
    blank_nodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Triple> {
    let subject = match instantiate_term(&pattern.subject, solution, blank_nodes)? {
        Term::NamedNode(node) => Subject::NamedNode(node),
        Term::BlankNode(node) => Subject::BlankNode(node),
        _ => return None,
    };
    let predicate = match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => node.clone(),
        NamedNodePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => node.clone(),
            _ => return None,
        },
    };
    let object = instantiate_term(&pattern.object, solution, blank_nodes)?;
    Some(Triple::new(subject, predicate, object))
}

fn instantiate_term(
    pattern: &TermPattern,
    solution: &Solution,
    blank_nodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
        TermPattern::BlankNode(node) => Some(
            blank_nodes
                .entry(node.clone())
                .or_default()
                .clone()
                .into(),
        ),
    }
}

const BLANK_NODE_PREFIX: &str = "_:";

/// Blank nodes of a pattern are bound like variables that can never be projected.
fn blank_node_variable(node: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("{BLANK_NODE_PREFIX}{}", node.as_str()))
}

fn bind_triple(
    solution: &Solution,
    pattern: &TriplePattern,
    triple: TripleRef<'_>,
) -> Option<Solution> {
    let mut solution = solution.clone();
    let bound = bind_term(&mut solution, &pattern.subject, triple.subject.into())
        && bind_predicate(&mut solution, &pattern.predicate, triple.predicate)
        && bind_term(&mut solution, &pattern.object, triple.object);
    bound.then_some(solution)
}

fn bind_predicate(
    solution: &mut Solution,
    pattern: &NamedNodePattern,
    predicate: NamedNodeRef<'_>,
) -> bool {
    match pattern {
        NamedNodePattern::NamedNode(node) => node.as_ref() == predicate,
        NamedNodePattern::Variable(variable) => {
            bind_variable(solution, variable, predicate.into())
        }
    }
}

fn bind_term(solution: &mut Solution, pattern: &TermPattern, term: TermRef<'_>) -> bool {
    match pattern {
        TermPattern::NamedNode(node) => TermRef::from(node.as_ref()) == term,
        TermPattern::Literal(literal) => TermRef::from(literal.as_ref()) == term,
        TermPattern::Variable(variable) => bind_variable(solution, variable, term),
        TermPattern::BlankNode(node) => {
            bind_variable(solution, &blank_node_variable(node), term)
        }
    }
}

fn bind_variable(solution: &mut Solution, variable: &Variable, term: TermRef<'_>) -> bool {
    match solution.get(variable) {
        Some(existing) => existing.as_ref() == term,
        None => {
            solution.insert(variable.clone(), term.into_owned());
            true
        }
    }
}

fn graph_term(graph: &GraphName) -> Option<Term> {
    match graph {
        GraphName::NamedNode(node) => Some(node.clone().into()),
        GraphName::BlankNode(node) => Some(node.clone().into()),
        GraphName::DefaultGraph => None,
    }
}

fn join(left: &[Solution], right: &[Solution]) -> Vec<Solution> {
    let mut solutions = Vec::new();
    for left in left {
        for right in right {
            let compatible = right
                .iter()
                .all(|(variable, term)| left.get(variable).map_or(true, |other| other == term));
            if compatible {
                let mut solution = left.clone();
                solution.extend(right.iter().map(|(v, t)| (v.clone(), t.clone())));
                solutions.push(solution);
            }
        }
    }
    solutions
}
