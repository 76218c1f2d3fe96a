//! Proof-search graph over goals.
//!
//! Nodes are goals, edges are tactic invocations. A graph is built once per
//! lemma by [`ProofGraphBuilder`] and only queried afterwards.

mod builder;
mod edge;
mod node;
pub mod stats;

use std::{
    collections::{HashMap, HashSet, VecDeque},
    iter,
};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

pub use builder::{build_graph, ProofGraphBuilder};
pub use edge::{EdgeId, GraphEdge};
pub use node::{GraphNode, NodeKind};

use crate::{
    lex::{GoalId, GoalSnapshot},
    tactic::{rules::SSR_HAVE, InvocationId},
};

/// Root-to-goal paths, with the goals no path reaches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathReport {
    pub paths: Vec<Vec<GraphNode>>,
    pub unreachable: Vec<GraphNode>,
}

/// First edge of an invocation, annotated with where it sits in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct FlatEntry<'a> {
    /// Number of nodes on the shortest path from the root to `target`.
    pub depth: usize,
    pub target: GraphNode,
    /// Snapshot of the target goal, or of the source for closed branches.
    pub snapshot: Option<&'a GoalSnapshot>,
    pub edge: &'a GraphEdge,
}

/// One tree edge of a traversal whose source goal has a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalStep<'a> {
    pub goal_id: GoalId,
    pub snapshot: &'a GoalSnapshot,
    /// Tactic taken from the source towards the target.
    pub tactic: Option<&'a GraphEdge>,
}

/// A `have` body and the shortest route from it to a closed goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HaveInfo {
    pub full_tactic: String,
    pub length: usize,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProofGraph {
    pub name: String,
    nodes: IndexSet<GraphNode>,
    edges: Vec<GraphEdge>,
    root: GraphNode,
    snapshots: HashMap<GoalId, GoalSnapshot>,
    #[serde(skip)]
    outgoing: HashMap<GraphNode, Vec<usize>>,
    #[serde(skip)]
    incoming: HashMap<GraphNode, Vec<usize>>,
}

impl ProofGraph {
    fn new(
        name: String,
        nodes: IndexSet<GraphNode>,
        edges: Vec<GraphEdge>,
        root: GraphNode,
        snapshots: HashMap<GoalId, GoalSnapshot>,
    ) -> Self {
        let mut outgoing: HashMap<GraphNode, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<GraphNode, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source).or_default().push(i);
            incoming.entry(edge.target).or_default().push(i);
        }
        Self {
            name,
            nodes,
            edges,
            root,
            snapshots,
            outgoing,
            incoming,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub const fn root(&self) -> GraphNode {
        self.root
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: &GraphNode) -> bool {
        self.nodes.contains(node)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn snapshot(&self, goal_id: GoalId) -> Option<&GoalSnapshot> {
        self.snapshots.get(&goal_id)
    }

    pub fn out_edges(&self, node: &GraphNode) -> Vec<&GraphEdge> {
        self.outgoing
            .get(node)
            .map(|ids| ids.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    pub fn in_edges(&self, node: &GraphNode) -> Vec<&GraphEdge> {
        self.incoming
            .get(node)
            .map(|ids| ids.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct successors in edge order.
    fn successors(&self, node: &GraphNode) -> Vec<GraphNode> {
        let mut seen = IndexSet::new();
        for edge in self.out_edges(node) {
            seen.insert(edge.target);
        }
        seen.into_iter().collect()
    }

    /// Closed goals, one per edge reaching them, in edge order.
    pub fn terminal_goals(&self) -> Vec<GraphNode> {
        self.edges
            .iter()
            .filter(|e| e.to_terminal())
            .map(|e| e.target)
            .collect()
    }

    /// Failed goals, one per edge reaching them, in edge order.
    pub fn dead_goals(&self) -> Vec<GraphNode> {
        self.edges
            .iter()
            .filter(|e| e.to_dead())
            .map(|e| e.target)
            .collect()
    }

    /// Edges grouped by the invocation that emitted them.
    pub fn invocations(&self) -> IndexMap<InvocationId, Vec<&GraphEdge>> {
        let mut groups: IndexMap<InvocationId, Vec<&GraphEdge>> = IndexMap::new();
        for edge in &self.edges {
            groups.entry(edge.invocation_id).or_default().push(edge);
        }
        groups
    }

    // ========================================================================
    // Traversals
    // ========================================================================

    /// Breadth-first tree edges from the root.
    pub fn bfs_edges(&self) -> Vec<(GraphNode, GraphNode)> {
        let mut visited = HashSet::from([self.root]);
        let mut queue = VecDeque::from([self.root]);
        let mut tree = Vec::new();
        while let Some(node) = queue.pop_front() {
            for next in self.successors(&node) {
                if visited.insert(next) {
                    tree.push((node, next));
                    queue.push_back(next);
                }
            }
        }
        tree
    }

    /// Depth-first tree edges from the root, children visited in edge order.
    pub fn dfs_edges(&self) -> Vec<(GraphNode, GraphNode)> {
        let mut visited = HashSet::from([self.root]);
        let mut tree = Vec::new();
        let mut stack = vec![(self.root, self.successors(&self.root).into_iter())];
        while let Some((node, children)) = stack.last_mut() {
            let parent = *node;
            match children.find(|child| !visited.contains(child)) {
                Some(child) => {
                    visited.insert(child);
                    tree.push((parent, child));
                    let grandchildren = self.successors(&child).into_iter();
                    stack.push((child, grandchildren));
                }
                None => {
                    stack.pop();
                }
            }
        }
        tree
    }

    pub fn bfs_order(&self) -> Vec<GraphNode> {
        iter::once(self.root)
            .chain(self.bfs_edges().into_iter().map(|(_, to)| to))
            .collect()
    }

    pub fn dfs_order(&self) -> Vec<GraphNode> {
        iter::once(self.root)
            .chain(self.dfs_edges().into_iter().map(|(_, to)| to))
            .collect()
    }

    fn traverse_info(&self, tree: &[(GraphNode, GraphNode)]) -> Vec<TraversalStep<'_>> {
        tree.iter()
            .filter_map(|(from, to)| {
                let snapshot = self.snapshots.get(&from.goal_id)?;
                let tactic = self.out_edges(from).into_iter().find(|e| e.target == *to);
                Some(TraversalStep {
                    goal_id: from.goal_id,
                    snapshot,
                    tactic,
                })
            })
            .collect()
    }

    pub fn bfs_traverse(&self) -> Vec<TraversalStep<'_>> {
        self.traverse_info(&self.bfs_edges())
    }

    pub fn dfs_traverse(&self) -> Vec<TraversalStep<'_>> {
        self.traverse_info(&self.dfs_edges())
    }

    // ========================================================================
    // Paths
    // ========================================================================

    /// Shortest path by edge count, both endpoints included.
    pub fn shortest_path(&self, from: GraphNode, to: GraphNode) -> Option<Vec<GraphNode>> {
        if !self.contains(&from) || !self.contains(&to) {
            return None;
        }
        let mut parent: HashMap<GraphNode, GraphNode> = HashMap::new();
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(&prev) = parent.get(&cur) {
                    path.push(prev);
                    cur = prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.successors(&node) {
                if visited.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn paths_from_root(&self, targets: Vec<GraphNode>) -> PathReport {
        let mut report = PathReport::default();
        for target in targets {
            match self.shortest_path(self.root, target) {
                Some(path) => report.paths.push(path),
                None => report.unreachable.push(target),
            }
        }
        report
    }

    /// Shortest root paths to every terminal goal.
    pub fn terminal_paths(&self) -> PathReport {
        self.paths_from_root(self.terminal_goals())
    }

    /// Shortest root paths to every dead goal.
    pub fn dead_paths(&self) -> PathReport {
        self.paths_from_root(self.dead_goals())
    }

    /// Nodes reachable from `node`, itself included.
    pub fn subtree_size(&self, node: &GraphNode) -> usize {
        if !self.contains(node) {
            return 0;
        }
        let mut visited = HashSet::from([*node]);
        let mut stack = vec![*node];
        while let Some(cur) = stack.pop() {
            for edge in self.out_edges(&cur) {
                if !edge.is_self_loop() && visited.insert(edge.target) {
                    stack.push(edge.target);
                }
            }
        }
        visited.len()
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// First edge of every invocation reachable from the root.
    pub fn flat_view(&self) -> Vec<FlatEntry<'_>> {
        let mut seen = HashSet::new();
        let mut view = Vec::new();
        for edge in &self.edges {
            if !seen.insert(edge.invocation_id) {
                continue;
            }
            let Some(path) = self.shortest_path(self.root, edge.target) else {
                continue;
            };
            let snapshot = match self.snapshots.get(&edge.target.goal_id) {
                Some(snapshot) => Some(snapshot),
                None if !edge.to_live() => self.snapshots.get(&edge.source.goal_id),
                None => continue,
            };
            view.push(FlatEntry {
                depth: path.len(),
                target: edge.target,
                snapshot,
                edge,
            });
        }
        view
    }

    /// Every `have` body link, with a shortest path from it to a closed goal.
    pub fn have_info(&self) -> Vec<HaveInfo> {
        let terminals = self.terminal_goals();
        self.edges
            .iter()
            .filter(|e| e.is_body_edge && e.tactic_name.starts_with(SSR_HAVE))
            .map(|edge| {
                let path = terminals
                    .iter()
                    .find_map(|&t| self.shortest_path(edge.source, t))
                    .unwrap_or_default();
                HaveInfo {
                    full_tactic: edge.full_tactic.clone(),
                    length: edge.full_tactic.len(),
                    path: path.iter().map(ToString::to_string).collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lex::{DeclMode, Declaration},
        tactic::parse_tactics,
    };

    fn bf(name: &str, gid: GoalId, ngs: usize) -> Declaration {
        Declaration::stub(DeclMode::Before, name, gid, ngs)
    }

    fn af(name: &str, gid: GoalId, ngs: usize) -> Declaration {
        Declaration::stub(DeclMode::After, name, gid, ngs)
    }

    /// 1 -> {2, 3}; 2 -> T; 3 -> 4 -> T
    fn branching() -> ProofGraph {
        let parsed = parse_tactics(vec![
            bf("apply foo", 1, 1),
            af("apply foo", 2, 2),
            af("apply foo", 3, 2),
            bf("auto", 2, 2),
            af("auto", 0, 0),
            bf("simpl", 3, 1),
            af("simpl", 4, 1),
            bf("auto", 4, 1),
            af("auto", 0, 0),
        ])
        .unwrap();
        build_graph("branching", &parsed.tactics, HashMap::new()).unwrap()
    }

    #[test]
    fn orders_follow_edge_insertion() {
        let graph = branching();
        let bfs: Vec<String> = graph.bfs_order().iter().map(ToString::to_string).collect();
        assert_eq!(bfs, vec!["1", "2", "3", "T-1-2", "4", "T-1-4"]);
        let dfs: Vec<String> = graph.dfs_order().iter().map(ToString::to_string).collect();
        assert_eq!(dfs, vec!["1", "2", "T-1-2", "3", "4", "T-1-4"]);
    }

    #[test]
    fn terminal_paths_from_root() {
        let graph = branching();
        let report = graph.terminal_paths();
        assert!(report.unreachable.is_empty());
        let lens: Vec<usize> = report.paths.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![3, 4]);
    }

    #[test]
    fn queries_by_node() {
        let graph = branching();
        let root = graph.root();
        assert_eq!(graph.out_edges(&root).len(), 2);
        assert_eq!(graph.in_edges(&GraphNode::live(4)).len(), 1);
        assert_eq!(graph.subtree_size(&root), graph.num_nodes());
        assert_eq!(graph.subtree_size(&GraphNode::live(3)), 3);
        assert_eq!(graph.invocations().len(), 4);
    }

    #[test]
    fn flat_view_counts_depth_in_nodes() {
        let graph = branching();
        let depths: Vec<usize> = graph.flat_view().iter().map(|e| e.depth).collect();
        // Without snapshots only closed branches are kept.
        assert_eq!(depths, vec![3, 4]);
    }
}
