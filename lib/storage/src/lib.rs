//! Contains the in-memory reference store of [quadcache](https://docs.rs/quadcache/).
//!
//! The [MemQuadStore] is the default successor of a query cache. It evaluates a subset of SPARQL
//! that covers basic graph patterns, joins, unions, `GRAPH` clauses, and solution modifiers.

pub mod memory;

pub use memory::MemQuadStore;
