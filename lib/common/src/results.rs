//! Materialized results of [SPARQL queries](https://www.w3.org/TR/sparql11-query/).
//!
//! Contrary to a streaming result, a [QueryResults] can be cloned and kept around, which is
//! what a cache needs.

use crate::StorageError;
use quadcache_model::{
    GraphName, Quad, Subject, Term, Triple, Variable, VariableRef,
};
use sparesults::{QueryResultsFormat, QueryResultsSerializer, QuerySolution};
use std::io;
use std::io::Write;
use std::sync::{Arc, LazyLock};

/// The variables of a solution sequence that encodes quads.
pub static QUAD_VARIABLES: LazyLock<Arc<[Variable]>> = LazyLock::new(|| {
    Arc::new([
        Variable::new_unchecked("graph"),
        Variable::new_unchecked("subject"),
        Variable::new_unchecked("predicate"),
        Variable::new_unchecked("object"),
    ])
});

/// Results of a [SPARQL query](https://www.w3.org/TR/sparql11-query/).
#[derive(Debug, PartialEq)]
pub enum QueryResults {
    /// Results of a [SELECT](https://www.w3.org/TR/sparql11-query/#select) query.
    Solutions {
        variables: Arc<[Variable]>,
        solutions: Vec<QuerySolution>,
    },
    /// Result of a [ASK](https://www.w3.org/TR/sparql11-query/#ask) query.
    Boolean(bool),
    /// Results of a [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct) or
    /// [DESCRIBE](https://www.w3.org/TR/sparql11-query/#describe) query.
    Graph(Vec<Triple>),
}

impl QueryResults {
    /// Creates a solution sequence from rows of values. Each row must have one value per variable.
    pub fn from_rows(
        variables: impl Into<Arc<[Variable]>>,
        rows: impl IntoIterator<Item = Vec<Option<Term>>>,
    ) -> Self {
        let variables = variables.into();
        let solutions = rows
            .into_iter()
            .map(|row| QuerySolution::from((Arc::clone(&variables), row)))
            .collect();
        Self::Solutions {
            variables,
            solutions,
        }
    }

    /// Encodes `quads` as solutions over [QUAD_VARIABLES]. The default graph is encoded as an
    /// unbound `?graph`.
    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> Self {
        let rows = quads.into_iter().map(|quad| {
            let graph: Option<Term> = match quad.graph_name {
                GraphName::NamedNode(node) => Some(node.into()),
                GraphName::BlankNode(node) => Some(node.into()),
                GraphName::DefaultGraph => None,
            };
            vec![
                graph,
                Some(quad.subject.into()),
                Some(quad.predicate.into()),
                Some(quad.object),
            ]
        });
        Self::from_rows(Arc::clone(&QUAD_VARIABLES), rows)
    }

    /// Decodes quads from solutions over [QUAD_VARIABLES].
    ///
    /// This is the inverse of [Self::from_quads].
    pub fn into_quads(self) -> Result<Vec<Quad>, StorageError> {
        let Self::Solutions { solutions, .. } = self else {
            return Err(StorageError::Other(
                "Only solutions can be interpreted as quads".into(),
            ));
        };

        solutions
            .iter()
            .map(|solution| {
                let graph_name = match solution.get("graph") {
                    None => GraphName::DefaultGraph,
                    Some(Term::NamedNode(node)) => GraphName::NamedNode(node.clone()),
                    Some(Term::BlankNode(node)) => GraphName::BlankNode(node.clone()),
                    Some(term) => return Err(invalid_quad_component("graph", term)),
                };
                let subject = match solution.get("subject") {
                    Some(Term::NamedNode(node)) => Subject::NamedNode(node.clone()),
                    Some(Term::BlankNode(node)) => Subject::BlankNode(node.clone()),
                    term => return Err(missing_quad_component("subject", term)),
                };
                let predicate = match solution.get("predicate") {
                    Some(Term::NamedNode(node)) => node.clone(),
                    term => return Err(missing_quad_component("predicate", term)),
                };
                let object = match solution.get("object") {
                    Some(term) => term.clone(),
                    None => return Err(missing_quad_component("object", None)),
                };
                Ok(Quad::new(subject, predicate, object, graph_name))
            })
            .collect()
    }

    /// Returns the boolean value of an ASK result.
    pub fn boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the solutions of a SELECT result.
    pub fn solutions(&self) -> Option<&[QuerySolution]> {
        match self {
            Self::Solutions { solutions, .. } => Some(solutions),
            _ => None,
        }
    }

    /// Returns the triples of a CONSTRUCT or DESCRIBE result.
    pub fn triples(&self) -> Option<&[Triple]> {
        match self {
            Self::Graph(triples) => Some(triples),
            _ => None,
        }
    }

    /// Writes the query results as a [SPARQL results document](https://www.w3.org/TR/sparql11-results-json/).
    ///
    /// Graph results are written as solutions over `?subject ?predicate ?object`.
    pub fn write<W: Write>(&self, writer: W, format: QueryResultsFormat) -> io::Result<W> {
        let serializer = QueryResultsSerializer::from_format(format);
        match self {
            Self::Boolean(value) => serializer.serialize_boolean_to_writer(writer, *value),
            Self::Solutions {
                variables,
                solutions,
            } => {
                let mut serializer =
                    serializer.serialize_solutions_to_writer(writer, variables.to_vec())?;
                for solution in solutions {
                    serializer.serialize(solution)?;
                }
                serializer.finish()
            }
            Self::Graph(triples) => {
                let s = VariableRef::new_unchecked("subject");
                let p = VariableRef::new_unchecked("predicate");
                let o = VariableRef::new_unchecked("object");
                let mut serializer = serializer.serialize_solutions_to_writer(
                    writer,
                    vec![s.into_owned(), p.into_owned(), o.into_owned()],
                )?;
                for triple in triples {
                    let subject = Term::from(triple.subject.clone());
                    let predicate = Term::from(triple.predicate.clone());
                    serializer.serialize([
                        (s, subject.as_ref()),
                        (p, predicate.as_ref()),
                        (o, triple.object.as_ref()),
                    ])?;
                }
                serializer.finish()
            }
        }
    }
}

// QuerySolution is not Clone, so solutions are rebuilt from their values.
impl Clone for QueryResults {
    fn clone(&self) -> Self {
        match self {
            Self::Solutions {
                variables,
                solutions,
            } => Self::Solutions {
                variables: Arc::clone(variables),
                solutions: solutions
                    .iter()
                    .map(|solution| {
                        QuerySolution::from((Arc::clone(variables), solution.values().to_vec()))
                    })
                    .collect(),
            },
            Self::Boolean(value) => Self::Boolean(*value),
            Self::Graph(triples) => Self::Graph(triples.clone()),
        }
    }
}

impl From<bool> for QueryResults {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<Triple>> for QueryResults {
    fn from(value: Vec<Triple>) -> Self {
        Self::Graph(value)
    }
}

fn invalid_quad_component(component: &str, term: &Term) -> StorageError {
    StorageError::Other(format!("Invalid quad {component}: {term}").into())
}

fn missing_quad_component(component: &str, term: Option<&Term>) -> StorageError {
    match term {
        Some(term) => invalid_quad_component(component, term),
        None => StorageError::Other(format!("Missing quad {component}").into()),
    }
}
