//! Randomized checks over generated proof trees.

mod common;

use common::TraceBuilder;
use proptest::prelude::*;
use tacst_recon::{
    graph::NodeKind, lex::TraceParser, reconstruct, tactic::trailing_count, Reconstruction,
};

#[derive(Debug, Clone)]
enum Goal {
    Solved,
    Failed,
    Split(Vec<Goal>),
}

impl Goal {
    fn size(&self) -> usize {
        match self {
            Self::Solved | Self::Failed => 1,
            Self::Split(children) => 1 + children.iter().map(Self::size).sum::<usize>(),
        }
    }

    fn count(&self, leaf: fn(&Self) -> bool) -> usize {
        match self {
            Self::Split(children) => children.iter().map(|c| c.count(leaf)).sum(),
            other => usize::from(leaf(other)),
        }
    }
}

fn goal_tree() -> impl Strategy<Value = Goal> {
    let leaf = prop_oneof![Just(Goal::Solved), Just(Goal::Failed)];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop::collection::vec(inner, 1..=3).prop_map(Goal::Split)
    })
}

struct Emitter {
    open: usize,
    next_id: i64,
}

impl Emitter {
    /// One generic invocation per goal, children depth-first.
    fn emit(&mut self, goal: &Goal, id: i64, b: TraceBuilder) -> TraceBuilder {
        let tactic = format!("step{id}");
        let this = self.open;
        let b = b.before(&tactic, this, id);
        match goal {
            Goal::Solved => {
                self.open -= 1;
                b.after(&tactic, 0, 0)
            }
            Goal::Failed => {
                self.open -= 1;
                b.dead(&tactic, this)
            }
            Goal::Split(children) => {
                let ngs = this - 1 + children.len();
                let ids: Vec<i64> = children
                    .iter()
                    .map(|_| {
                        self.next_id += 1;
                        self.next_id
                    })
                    .collect();
                let mut b = b;
                for &child in &ids {
                    b = b.after(&tactic, ngs, child);
                }
                self.open = ngs;
                for (child, &child_id) in children.iter().zip(&ids) {
                    b = self.emit(child, child_id, b);
                }
                b
            }
        }
    }
}

fn reconstruct_tree(goal: &Goal) -> Reconstruction {
    let mut emitter = Emitter { open: 1, next_id: 1 };
    let text = emitter
        .emit(goal, 1, TraceBuilder::new().lemma("generated"))
        .end()
        .build();
    let lemma = TraceParser::from_text(&text).parse_lemma().unwrap().unwrap();
    reconstruct(lemma).unwrap()
}

proptest! {
    #[test]
    fn trailing_count_is_the_goal_delta(next in 0usize..64, this in 0usize..64) {
        let count = trailing_count(next, this);
        prop_assert!(count >= 1);
        if next + 1 > this {
            prop_assert_eq!(count, next + 1 - this);
        } else {
            prop_assert_eq!(count, 1);
        }
    }

    #[test]
    fn closed_nodes_match_leaf_exits(goal in goal_tree()) {
        let recon = reconstruct_tree(&goal);
        let graph = &recon.graph;

        let leaf_exits = recon
            .tactics
            .walk()
            .into_iter()
            .flat_map(|t| t.exits())
            .filter(|d| d.is_solved() || d.is_failed())
            .count();
        let closed = graph.nodes().filter(|n| !n.is_live()).count();
        prop_assert_eq!(closed, leaf_exits);

        prop_assert_eq!(graph.terminal_goals().len(), goal.count(|g| matches!(g, Goal::Solved)));
        prop_assert_eq!(graph.dead_goals().len(), goal.count(|g| matches!(g, Goal::Failed)));
        prop_assert_eq!(graph.num_nodes(), goal.size() + leaf_exits);
        prop_assert!(graph.terminal_paths().unreachable.is_empty());
        prop_assert!(graph.dead_paths().unreachable.is_empty());
        prop_assert_eq!(graph.subtree_size(&graph.root()), graph.num_nodes());
    }

    #[test]
    fn rebuilding_is_idempotent(goal in goal_tree()) {
        let first = reconstruct_tree(&goal);
        let second = reconstruct_tree(&goal);
        prop_assert_eq!(first.graph.edges(), second.graph.edges());
        let kinds = |r: &Reconstruction| -> Vec<(i64, NodeKind)> {
            r.graph.nodes().map(|n| (n.goal_id, n.kind)).collect()
        };
        prop_assert_eq!(kinds(&first), kinds(&second));
        prop_assert_eq!(first.graph.root(), second.graph.root());
    }
}
