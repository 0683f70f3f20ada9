mod statement;

pub use statement::{Statement, StatementPattern};

// Re-export some oxrdf types.
pub use oxrdf::{
    BlankNode, BlankNodeRef, Dataset, GraphName, GraphNameRef, IriParseError, Literal,
    LiteralRef, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef,
    Subject, SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableRef,
};

// Re-export the SPARQL term patterns of spargebra.
pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
pub use spargebra::SparqlSyntaxError;
