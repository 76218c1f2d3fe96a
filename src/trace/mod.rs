//! Raw trace access.
//!
//! The trace is a line-oriented log written by the instrumented proof
//! assistant. This module only knows about lines and the fixed tokens that
//! delimit records; structure is recovered by [`crate::lex`].

mod reader;
pub mod token;

pub use reader::TraceReader;
