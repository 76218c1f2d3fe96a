//! Proof-graph edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::{GraphNode, NodeKind};
use crate::{lex::TacticKind, tactic::InvocationId};

pub type EdgeId = usize;

/// One goal produced by one tactic invocation.
///
/// An invocation that opens several subgoals emits one edge per subgoal, all
/// sharing `invocation_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub edge_id: EdgeId,
    pub invocation_id: InvocationId,
    pub tactic_name: String,
    pub tactic_kind: TacticKind,
    pub full_tactic: String,
    pub source: GraphNode,
    pub target: GraphNode,
    /// Set for edges produced inside a nested body, or linking into one.
    pub is_body_edge: bool,
}

impl GraphEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn to_live(&self) -> bool {
        self.target.kind == NodeKind::Live
    }

    pub fn to_terminal(&self) -> bool {
        self.target.kind == NodeKind::Terminal
    }

    pub fn to_dead(&self) -> bool {
        self.target.kind == NodeKind::Dead
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} -> {}, eid={}, tid={}, name={}, body={})",
            self.source,
            self.target,
            self.edge_id,
            self.invocation_id,
            self.tactic_name,
            self.is_body_edge
        )
    }
}
