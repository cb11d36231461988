//! Module-level analyses for the shadec compiler.

pub mod callgraph;
pub mod discard;

pub use callgraph::{CallGraph, CallGraphError};
pub use discard::DiscardAnalysis;
