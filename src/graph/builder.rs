//! Building a [`ProofGraph`] from a tactic forest.

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::debug;

use super::{
    edge::GraphEdge,
    node::{GraphNode, NodeKind},
    ProofGraph,
};
use crate::{
    error::{Error, Result},
    lex::{Declaration, GoalId, GoalSnapshot},
    tactic::{InvocationId, Tactic},
};

/// Accumulates nodes and edges, then checks them into a [`ProofGraph`].
#[derive(Debug, Default)]
pub struct ProofGraphBuilder {
    nodes: IndexSet<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// The invocation whose body is being walked.
#[derive(Clone, Copy)]
struct Wrapper<'a> {
    entry: GraphNode,
    tactic: &'a Tactic,
}

impl ProofGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a forest of top-level invocations, in order.
    pub fn add_tactics(&mut self, tactics: &[Tactic]) -> &mut Self {
        for tactic in tactics {
            self.add_tactic(tactic, None);
        }
        self
    }

    fn add_tactic(&mut self, tactic: &Tactic, wrapper: Option<Wrapper<'_>>) {
        let in_body = wrapper.is_some();
        let entry = GraphNode::live(tactic.entry_goal_id());

        if let Some(wrapper) = wrapper {
            if !self.nodes.contains(&entry) {
                let link = wrapper.tactic.core_before().unwrap_or_else(|| wrapper.tactic.entry());
                debug!("linking body of {} to goal {entry}", wrapper.tactic.name);
                self.push_edge(link, wrapper.tactic.uid, wrapper.entry, entry, true);
            }
        }
        self.nodes.insert(entry);

        let inner = Wrapper { entry, tactic };
        for child in tactic.body() {
            self.add_tactic(child, Some(inner));
        }

        for exit in tactic.exits() {
            let target = GraphNode::classify(exit, self.edges.len());
            self.push_edge(tactic.entry(), tactic.uid, entry, target, in_body);
        }
    }

    fn push_edge(
        &mut self,
        decl: &Declaration,
        invocation_id: InvocationId,
        source: GraphNode,
        target: GraphNode,
        is_body_edge: bool,
    ) {
        self.nodes.insert(source);
        self.nodes.insert(target);
        self.edges.push(GraphEdge {
            edge_id: self.edges.len(),
            invocation_id,
            tactic_name: decl.tactic_name.clone(),
            tactic_kind: decl.tactic_kind.clone(),
            full_tactic: decl.full_tactic.clone(),
            source,
            target,
            is_body_edge,
        });
    }

    /// Check endpoints, find the root and freeze the graph.
    pub fn finish(
        self,
        name: &str,
        snapshots: HashMap<GoalId, GoalSnapshot>,
    ) -> Result<ProofGraph> {
        for edge in &self.edges {
            for end in [edge.source, edge.target] {
                if !self.nodes.contains(&end) {
                    return Err(Error::GraphIntegrity(format!(
                        "edge {} refers to missing node {end}",
                        edge.edge_id
                    )));
                }
            }
        }

        let root = find_root(&self.nodes, &self.edges)?;
        Ok(ProofGraph::new(
            name.to_string(),
            self.nodes,
            self.edges,
            root,
            snapshots,
        ))
    }
}

/// The unique node with no incoming edge other than self-loops.
fn find_root(nodes: &IndexSet<GraphNode>, edges: &[GraphEdge]) -> Result<GraphNode> {
    let mut in_degree: HashMap<GraphNode, usize> = nodes.iter().map(|&n| (n, 0)).collect();
    for edge in edges.iter().filter(|e| !e.is_self_loop()) {
        *in_degree.entry(edge.target).or_default() += 1;
    }

    let roots: Vec<GraphNode> = nodes
        .iter()
        .copied()
        .filter(|node| in_degree.get(node) == Some(&0))
        .collect();
    match roots.as_slice() {
        [root] if root.kind == NodeKind::Live => Ok(*root),
        [root] => Err(Error::GraphIntegrity(format!("root {root} is not a live goal"))),
        [] => Err(Error::GraphIntegrity("no node without predecessors".to_string())),
        many => {
            let shown: Vec<String> = many.iter().map(ToString::to_string).collect();
            Err(Error::GraphIntegrity(format!(
                "several nodes without predecessors: {}",
                shown.join(", ")
            )))
        }
    }
}

/// Build the proof graph of one lemma's tactic forest.
pub fn build_graph(
    name: &str,
    tactics: &[Tactic],
    snapshots: HashMap<GoalId, GoalSnapshot>,
) -> Result<ProofGraph> {
    let mut builder = ProofGraphBuilder::new();
    builder.add_tactics(tactics);
    builder.finish(name, snapshots)
}
