//! Declaration parser: trace text to per-lemma tactic-state declarations.
//!
//! ```text
//! bg(pf) {!} ... {!} NAME
//! bg(ts) {!} CALL_ID {!} MODE {!} TACTIC {!} KIND {!} LOCATION
//! NGS {!} FULL_TACTIC {!} GOAL_ID
//! IDENT, IDENT, ... {!} CONCLUSION_KEY
//! en(ts)
//! ...
//! Typs / Bods / Constrs / PrTyps / PrBods / PrGls tables
//! en(pf)
//! ```

pub mod decl;
mod parser;
pub mod tables;

use std::{collections::HashMap, fmt};

pub use decl::{DeclMode, Declaration, ExprKey, GoalId, TacticKind, FAILED, NO_CONCLUSION, SOLVED};
pub use parser::TraceParser;
use serde::{Deserialize, Serialize};
pub use tables::EpilogueTables;

/// All tactic states recorded for one lemma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LemmaTrace {
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub tables: EpilogueTables,
    /// Number of `bg(spf)` markers seen inside the lemma.
    pub subproofs: usize,
    /// Physical line of the opening `bg(pf)`.
    pub line: usize,
}

/// Context and conclusion of a goal, as first seen in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSnapshot {
    pub context_identifiers: Vec<String>,
    pub conclusion_key: ExprKey,
    /// Pretty-printed conclusion, when the trace carried one.
    pub pretty_goal: Option<String>,
}

impl GoalSnapshot {
    pub fn is_solved(&self) -> bool {
        self.conclusion_key == NO_CONCLUSION
    }
}

impl LemmaTrace {
    /// First snapshot of every goal id in the lemma.
    pub fn goal_snapshots(&self) -> HashMap<GoalId, GoalSnapshot> {
        let mut info = HashMap::new();
        for decl in &self.declarations {
            info.entry(decl.goal_id).or_insert_with(|| GoalSnapshot {
                context_identifiers: decl.context_identifiers.clone(),
                conclusion_key: decl.conclusion_key,
                pretty_goal: self
                    .tables
                    .pretty_goal(decl.conclusion_key)
                    .map(str::to_string),
            });
        }
        info
    }

    /// Number of `BEFORE` declarations, i.e. recorded tactic entries.
    pub fn num_befores(&self) -> usize {
        self.declarations
            .iter()
            .filter(|d| d.mode == DeclMode::Before)
            .count()
    }
}

impl fmt::Display for LemmaTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.name)?;
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{decl}")?;
        }
        write!(f, ">")
    }
}
