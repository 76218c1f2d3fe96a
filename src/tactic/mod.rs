//! Tactic grammar: declarations to a forest of tactic invocations.
//!
//! The trace carries no nesting markers. Structure is recovered from the
//! tactic-name conventions in [`rules`] and from the change in the number of
//! open goals between a before-declaration and the afters that follow it.

mod cursor;
mod node;
mod parser;
pub mod rules;

pub use cursor::DeclCursor;
pub use node::{DeclPair, InvocationId, Shape, Tactic};
pub use parser::{parse_tactics, trailing_count, ParsedTactics, Stop, TacticParser};
