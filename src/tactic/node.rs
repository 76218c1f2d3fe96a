//! Reconstructed tactic invocations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lex::{Declaration, GoalId};

/// Identifier of one tactic invocation, unique within a lemma.
pub type InvocationId = usize;

/// A before/after pair of snapshots around the same tactic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclPair {
    pub before: Declaration,
    pub after: Declaration,
}

/// Trace layout of one invocation.
///
/// `alias` is the user-facing tactic, `core` the plugin tactic it expands to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    FixedStacked {
        alias: DeclPair,
        core: DeclPair,
    },
    FixedSequential {
        alias: DeclPair,
        core: DeclPair,
    },
    VariableSequential {
        alias: DeclPair,
        core_before: Declaration,
        core_afters: Vec<Declaration>,
    },
    NestedFixed {
        alias: DeclPair,
        core: DeclPair,
        body: Vec<Tactic>,
    },
    NestedVariable {
        alias_before: Declaration,
        core_before: Declaration,
        core_afters: Vec<Declaration>,
        alias_afters: Vec<Declaration>,
        body: Vec<Tactic>,
    },
    NotationTerminal {
        alias: Declaration,
        core: Declaration,
        /// `af core` and then `af alias`, when the trace recorded them.
        extra: Vec<Declaration>,
    },
    SequenceBody {
        core: DeclPair,
        body: Vec<Tactic>,
    },
    DoPrefix {
        core: Declaration,
    },
    Generic {
        before: Declaration,
        afters: Vec<Declaration>,
    },
}

/// One reconstructed tactic invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tactic {
    pub uid: InvocationId,
    /// Family name (`Intro`, `Ssrhave`, ...).
    pub name: String,
    /// Set for terminal families and for runs cut short at a solved state.
    pub terminal: bool,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Tactic {
    pub const fn has_body(&self) -> bool {
        matches!(
            self.shape,
            Shape::NestedFixed { .. } | Shape::NestedVariable { .. } | Shape::SequenceBody { .. }
        )
    }

    /// Nested invocations, empty for shapes without a body.
    pub fn body(&self) -> &[Tactic] {
        match &self.shape {
            Shape::NestedFixed { body, .. }
            | Shape::NestedVariable { body, .. }
            | Shape::SequenceBody { body, .. } => body,
            _ => &[],
        }
    }

    /// Declaration whose goal the invocation consumes.
    pub const fn entry(&self) -> &Declaration {
        match &self.shape {
            Shape::FixedStacked { alias, .. }
            | Shape::FixedSequential { alias, .. }
            | Shape::VariableSequential { alias, .. }
            | Shape::NestedFixed { alias, .. } => &alias.before,
            Shape::NestedVariable { alias_before, .. } => alias_before,
            Shape::NotationTerminal { alias, .. } => alias,
            Shape::SequenceBody { core, .. } => &core.before,
            Shape::DoPrefix { core } => core,
            Shape::Generic { before, .. } => before,
        }
    }

    /// Before-declaration of the plugin tactic that owns the body, if any.
    pub const fn core_before(&self) -> Option<&Declaration> {
        match &self.shape {
            Shape::NestedFixed { core, .. } | Shape::SequenceBody { core, .. } => {
                Some(&core.before)
            }
            Shape::NestedVariable { core_before, .. } => Some(core_before),
            _ => None,
        }
    }

    /// Declarations of the goals the invocation produces, in order.
    pub fn exits(&self) -> Vec<&Declaration> {
        match &self.shape {
            Shape::FixedStacked { core, .. }
            | Shape::FixedSequential { core, .. }
            | Shape::NestedFixed { core, .. }
            | Shape::SequenceBody { core, .. } => vec![&core.after],
            Shape::VariableSequential { core_afters, .. } => core_afters.iter().collect(),
            Shape::NestedVariable { alias_afters, .. } => alias_afters.iter().collect(),
            Shape::NotationTerminal { extra, .. } => extra.iter().take(1).collect(),
            Shape::DoPrefix { core } => vec![core],
            Shape::Generic { afters, .. } => afters.iter().collect(),
        }
    }

    pub fn entry_goal_id(&self) -> GoalId {
        self.entry().goal_id
    }

    pub fn exit_goal_ids(&self) -> Vec<GoalId> {
        self.exits().into_iter().map(|decl| decl.goal_id).collect()
    }

    /// Number of declarations this invocation consumed, body included.
    pub fn num_declarations(&self) -> usize {
        let own = match &self.shape {
            Shape::FixedStacked { .. } | Shape::FixedSequential { .. } => 4,
            Shape::VariableSequential { core_afters, .. } => 3 + core_afters.len(),
            Shape::NestedFixed { .. } => 4,
            Shape::NestedVariable {
                core_afters,
                alias_afters,
                ..
            } => 2 + core_afters.len() + alias_afters.len(),
            Shape::NotationTerminal { extra, .. } => 2 + extra.len(),
            Shape::SequenceBody { .. } => 2,
            Shape::DoPrefix { .. } => 1,
            Shape::Generic { afters, .. } => 1 + afters.len(),
        };
        own + self.body().iter().map(Self::num_declarations).sum::<usize>()
    }

    /// Pre-order walk over this invocation and every nested one.
    pub fn walk(&self) -> Vec<&Tactic> {
        let mut out = vec![self];
        for child in self.body() {
            out.extend(child.walk());
        }
        out
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}; {}", self.name, self.uid, self.entry())?;
        for exit in self.exits() {
            write!(f, ", {exit}")?;
        }
        if self.has_body() {
            write!(f, "; ")?;
            for (i, child) in self.body().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{child}")?;
            }
        }
        write!(f, ")")
    }
}
