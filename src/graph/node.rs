//! Proof-graph nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::edge::EdgeId;
use crate::lex::{Declaration, GoalId};

/// Status of a goal in the reconstructed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Live,
    Terminal,
    Dead,
}

/// A goal in the proof graph.
///
/// Identity is the whole triple. Live goals are shared by goal id; terminal
/// and dead goals carry the id of the edge that produced them, so every
/// closed branch gets its own node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub goal_id: GoalId,
    pub kind: NodeKind,
    pub disambiguator: Option<EdgeId>,
}

impl GraphNode {
    pub const fn live(goal_id: GoalId) -> Self {
        Self {
            goal_id,
            kind: NodeKind::Live,
            disambiguator: None,
        }
    }

    pub const fn terminal(goal_id: GoalId, edge: EdgeId) -> Self {
        Self {
            goal_id,
            kind: NodeKind::Terminal,
            disambiguator: Some(edge),
        }
    }

    pub const fn dead(goal_id: GoalId, edge: EdgeId) -> Self {
        Self {
            goal_id,
            kind: NodeKind::Dead,
            disambiguator: Some(edge),
        }
    }

    /// Node for the goal an exit declaration leads to.
    pub fn classify(exit: &Declaration, edge: EdgeId) -> Self {
        if exit.is_failed() {
            Self::dead(exit.goal_id, edge)
        } else if exit.is_solved() {
            Self::terminal(exit.goal_id, edge)
        } else {
            Self::live(exit.goal_id)
        }
    }

    pub fn is_live(self) -> bool {
        self.kind == NodeKind::Live
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Live => write!(f, "{}", self.goal_id)?,
            NodeKind::Terminal => write!(f, "T{}", self.goal_id)?,
            NodeKind::Dead => write!(f, "E{}", self.goal_id)?,
        }
        if let Some(edge) = self.disambiguator {
            write!(f, "-{edge}")?;
        }
        Ok(())
    }
}
