//! Reconstruct proof-search graphs from instrumented tactic traces.
//!
//! A trace is read lemma by lemma ([`lex::TraceParser`]), each lemma's
//! declarations are grouped into tactic invocations ([`tactic::parse_tactics`])
//! and the invocations are turned into a goal graph ([`graph::build_graph`]).
//! [`pipeline`] ties the stages together.

pub mod decode;
pub mod error;
pub mod graph;
pub mod lex;
pub mod pipeline;
pub mod tactic;
pub mod trace;

pub use error::{Error, Result};
pub use graph::ProofGraph;
pub use pipeline::{process_trace, reconstruct, Reconstruction, TraceReport};
