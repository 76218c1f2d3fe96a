//! Tactic-state declarations - one snapshot per `bg(ts)` record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trace::token;

/// Goal identifier as written by the trace.
pub type GoalId = i64;

/// Goal id of a solved snapshot.
pub const SOLVED: GoalId = -1;
/// Goal id of a failed tactic.
pub const FAILED: GoalId = -2;

/// Key into the shared-expression table.
pub type ExprKey = i64;

/// Conclusion key of a solved snapshot.
pub const NO_CONCLUSION: ExprKey = -1;

/// Which side of a tactic invocation a snapshot was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclMode {
    Before,
    After,
    DeadEnd,
}

impl DeclMode {
    /// Parse the mode field of a header (`bf`, `af ...`, `dead ...`).
    pub fn from_field(field: &str) -> Option<Self> {
        if field.starts_with(token::MODE_DEAD) {
            Some(Self::DeadEnd)
        } else if field.starts_with(token::MODE_AFTER) {
            Some(Self::After)
        } else if field.starts_with(token::MODE_BEFORE) {
            Some(Self::Before)
        } else {
            None
        }
    }

    pub const fn is_after(self) -> bool {
        matches!(self, Self::After | Self::DeadEnd)
    }
}

impl fmt::Display for DeclMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "B"),
            Self::After => write!(f, "A"),
            Self::DeadEnd => write!(f, "E"),
        }
    }
}

/// How the proof assistant classified the tactic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticKind {
    Name,
    Atomic,
    Notation,
    Ml,
    Other(String),
}

impl TacticKind {
    pub fn from_field(field: &str) -> Self {
        match field {
            token::KIND_NAME => Self::Name,
            token::KIND_ATOM => Self::Atomic,
            token::KIND_NOTATION => Self::Notation,
            token::KIND_ML => Self::Ml,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One tactic-state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub mode: DeclMode,
    /// Goal id carried after the mode token, if any (`af 12`).
    pub after_goal_id: Option<GoalId>,
    pub tactic_name: String,
    pub tactic_kind: TacticKind,
    /// Empty when the state is immediately solved.
    pub full_tactic: String,
    pub goal_id: GoalId,
    /// Goals open right after this snapshot; 0 means solved.
    pub num_open_goals: usize,
    /// Emission-time call counter. Echoed only.
    pub call_id: i64,
    pub source_location: String,
    /// Hypothesis identifiers, reversed from emission order.
    pub context_identifiers: Vec<String>,
    /// [`NO_CONCLUSION`] when solved.
    pub conclusion_key: ExprKey,
    /// Physical line of the `bg(ts)` record.
    pub line: usize,
}

impl Declaration {
    pub fn is_solved(&self) -> bool {
        self.goal_id == SOLVED || self.num_open_goals == 0
    }

    pub fn is_failed(&self) -> bool {
        self.mode == DeclMode::DeadEnd || self.goal_id == FAILED
    }

    /// First whitespace-separated token of the tactic name.
    pub fn name_token(&self) -> &str {
        self.tactic_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Declaration {
    /// Minimal declaration for unit tests; solved when `num_open_goals` is 0.
    pub(crate) fn stub(
        mode: DeclMode,
        tactic_name: &str,
        goal_id: GoalId,
        num_open_goals: usize,
    ) -> Self {
        let solved = num_open_goals == 0 && mode == DeclMode::After;
        Self {
            mode,
            after_goal_id: None,
            tactic_name: tactic_name.to_string(),
            tactic_kind: TacticKind::Ml,
            full_tactic: tactic_name.to_string(),
            goal_id: if solved { SOLVED } else { goal_id },
            num_open_goals,
            call_id: 0,
            source_location: String::new(),
            context_identifiers: Vec::new(),
            conclusion_key: if solved { NO_CONCLUSION } else { goal_id },
            line: 0,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(uid={}, gid={}, tac={}, loc={})",
            self.mode, self.call_id, self.goal_id, self.tactic_name, self.source_location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_from_prefixes() {
        assert_eq!(DeclMode::from_field("bf"), Some(DeclMode::Before));
        assert_eq!(DeclMode::from_field("af 12"), Some(DeclMode::After));
        assert_eq!(DeclMode::from_field("dead 3"), Some(DeclMode::DeadEnd));
        assert_eq!(DeclMode::from_field("during"), None);
        assert!(DeclMode::DeadEnd.is_after());
        assert!(!DeclMode::Before.is_after());
    }

    #[test]
    fn unknown_kind_is_kept() {
        assert_eq!(TacticKind::from_field("ML"), TacticKind::Ml);
        assert_eq!(
            TacticKind::from_field("Ltac"),
            TacticKind::Other("Ltac".to_string())
        );
    }
}
