use oxrdf::{GraphName, NamedNode, Quad, QuadRef, Subject, Term, Triple};
use std::fmt::{Display, Formatter};

/// A concrete RDF statement that may not (yet) be associated with a graph.
///
/// Statements built from a [Triple] carry no graph. The graph is then provided by the operation
/// that uses the statement (e.g., the graph argument of `add_statements`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Term,
    pub graph_name: Option<GraphName>,
}

impl Statement {
    /// Creates a new [Statement] without a graph.
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph_name: None,
        }
    }

    /// Returns a copy of this statement that is part of `graph_name`.
    #[must_use]
    pub fn in_graph(mut self, graph_name: impl Into<GraphName>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }

    /// Converts this statement into a [Quad]. `graph_name` takes precedence over the graph of the
    /// statement. Returns [None] if neither is available.
    pub fn to_quad(&self, graph_name: Option<&GraphName>) -> Option<Quad> {
        let graph_name = graph_name.or(self.graph_name.as_ref())?;
        Some(Quad::new(
            self.subject.clone(),
            self.predicate.clone(),
            self.object.clone(),
            graph_name.clone(),
        ))
    }
}

impl From<Triple> for Statement {
    fn from(value: Triple) -> Self {
        Self {
            subject: value.subject,
            predicate: value.predicate,
            object: value.object,
            graph_name: None,
        }
    }
}

impl From<Quad> for Statement {
    fn from(value: Quad) -> Self {
        Self {
            subject: value.subject,
            predicate: value.predicate,
            object: value.object,
            graph_name: Some(value.graph_name),
        }
    }
}

impl From<QuadRef<'_>> for Statement {
    fn from(value: QuadRef<'_>) -> Self {
        value.into_owned().into()
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph_name) = &self.graph_name {
            write!(f, " {graph_name}")?;
        }
        Ok(())
    }
}

/// A statement where each position is either a concrete term or a wildcard ([None]).
///
/// A [None] graph indicates that the pattern itself carries no graph scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatementPattern {
    pub subject: Option<Subject>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
    pub graph_name: Option<GraphName>,
}

impl StatementPattern {
    /// Creates a new [StatementPattern] without a graph scope.
    pub fn new(
        subject: Option<Subject>,
        predicate: Option<NamedNode>,
        object: Option<Term>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph_name: None,
        }
    }

    /// Returns a copy of this pattern that is scoped to `graph_name`.
    #[must_use]
    pub fn in_graph(mut self, graph_name: impl Into<GraphName>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }

    /// Returns true if no term position is a wildcard.
    pub fn is_concrete(&self) -> bool {
        self.subject.is_some() && self.predicate.is_some() && self.object.is_some()
    }

    /// Converts this pattern into a [Statement]. Returns [None] if any term position is a wildcard.
    pub fn to_statement(&self) -> Option<Statement> {
        Some(Statement {
            subject: self.subject.clone()?,
            predicate: self.predicate.clone()?,
            object: self.object.clone()?,
            graph_name: self.graph_name.clone(),
        })
    }

    /// Returns true if any bound term is a blank node.
    pub fn has_blank_node(&self) -> bool {
        self.subject.as_ref().is_some_and(Subject::is_blank_node)
            || self.object.as_ref().is_some_and(Term::is_blank_node)
            || self
                .graph_name
                .as_ref()
                .is_some_and(GraphName::is_blank_node)
    }

    /// Checks whether `quad` matches this pattern. `graph_name` takes precedence over the graph of
    /// the pattern. If neither is given, quads of every graph match.
    pub fn matches(&self, quad: QuadRef<'_>, graph_name: Option<&GraphName>) -> bool {
        self.subject
            .as_ref()
            .map_or(true, |s| s.as_ref() == quad.subject)
            && self
                .predicate
                .as_ref()
                .map_or(true, |p| p.as_ref() == quad.predicate)
            && self.object.as_ref().map_or(true, |o| o.as_ref() == quad.object)
            && graph_name
                .or(self.graph_name.as_ref())
                .map_or(true, |g| g.as_ref() == quad.graph_name)
    }
}

impl Display for StatementPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn write_position(
            f: &mut Formatter<'_>,
            value: Option<&impl Display>,
        ) -> std::fmt::Result {
            match value {
                Some(value) => write!(f, "{value}"),
                None => f.write_str("*"),
            }
        }

        write_position(f, self.subject.as_ref())?;
        f.write_str(" ")?;
        write_position(f, self.predicate.as_ref())?;
        f.write_str(" ")?;
        write_position(f, self.object.as_ref())?;
        if let Some(graph_name) = &self.graph_name {
            write!(f, " {graph_name}")?;
        }
        Ok(())
    }
}

impl From<Statement> for StatementPattern {
    fn from(value: Statement) -> Self {
        Self {
            subject: Some(value.subject),
            predicate: Some(value.predicate),
            object: Some(value.object),
            graph_name: value.graph_name,
        }
    }
}

impl From<&Statement> for StatementPattern {
    fn from(value: &Statement) -> Self {
        value.clone().into()
    }
}

impl From<Quad> for StatementPattern {
    fn from(value: Quad) -> Self {
        Statement::from(value).into()
    }
}
