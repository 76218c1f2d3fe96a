//! Read-only statistics over a [`ProofGraph`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{HaveInfo, ProofGraph};
use crate::{
    error::Result,
    lex::{EpilogueTables, GoalSnapshot, TacticKind},
};

/// Where a known tactic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticOrigin {
    Atom,
    CoqMl,
    SsrMl,
    SsrAux,
}

/// Tactics counted by [`tactic_hist`], in histogram order.
pub const KNOWN_TACTICS: &[(&str, TacticOrigin)] = &[
    ("<coretactics::intro@0>", TacticOrigin::CoqMl),
    ("<coretactics::assumption@0>", TacticOrigin::CoqMl),
    ("<coretactics::clear@0>", TacticOrigin::CoqMl),
    ("<coretactics::clearbody@0>", TacticOrigin::CoqMl),
    ("<coretactics::constructor@0>", TacticOrigin::CoqMl),
    ("<coretactics::constructor@1>", TacticOrigin::CoqMl),
    ("<coretactics::exact@0>", TacticOrigin::CoqMl),
    ("<coretactics::exists@1>", TacticOrigin::CoqMl),
    ("<coretactics::left@0>", TacticOrigin::CoqMl),
    ("<coretactics::reflexivity@0>", TacticOrigin::CoqMl),
    ("<coretactics::right@0>", TacticOrigin::CoqMl),
    ("<coretactics::right_with@0>", TacticOrigin::CoqMl),
    ("<coretactics::split@0>", TacticOrigin::CoqMl),
    ("<coretactics::symmetry@0>", TacticOrigin::CoqMl),
    ("<coretactics::transitivity@0>", TacticOrigin::CoqMl),
    ("<extratactics::contradiction@0>", TacticOrigin::CoqMl),
    ("<extratactics::discriminate@0>", TacticOrigin::CoqMl),
    ("<g_auto::auto@0>", TacticOrigin::CoqMl),
    ("<g_auto::eauto@0>", TacticOrigin::CoqMl),
    ("<g_auto::trivial@0>", TacticOrigin::CoqMl),
    ("apply", TacticOrigin::Atom),
    ("case", TacticOrigin::Atom),
    ("compute", TacticOrigin::Atom),
    ("intros", TacticOrigin::Atom),
    ("red", TacticOrigin::Atom),
    ("split", TacticOrigin::Atom),
    ("simpl", TacticOrigin::Atom),
    ("<ssreflect_plugin::ssrapply@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrapply@1>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrcase@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrcase@1>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrclear@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrcongr@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrelim@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrexact@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrexact@1>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrhave@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrmove@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrmove@1>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrmove@2>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrpose@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrpose@2>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrrewrite@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrset@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrsuff@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrsuffices@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrtclby@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrtcldo@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrtclintros@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrtclseq@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrwithoutloss@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrwithoutlossss@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrwlog@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrwlogs@0>", TacticOrigin::SsrMl),
    ("<ssreflect_plugin::ssrwlogss@0>", TacticOrigin::SsrMl),
    ("ml4tp.MYDONE", TacticOrigin::SsrAux),
    ("ml4tp.SI", TacticOrigin::SsrAux),
    ("ml4tp.SC", TacticOrigin::SsrAux),
    ("ml4tp.SPS", TacticOrigin::SsrAux),
    ("ml4tp.SPC2", TacticOrigin::SsrAux),
];

/// Tactics that do the same job, grouped into families.
pub const TACTIC_FAMILIES: &[&[&str]] = &[
    &[
        "<coretactics::intro@0>",
        "intros",
        "<ssreflect_plugin::ssrtclintros@0>",
        "ml4tp.SI",
        "ml4tp.SPC2",
    ],
    &[
        "ml4tp.MYDONE",
        "<coretactics::assumption@0>",
        "<g_auto::trivial@0>",
        "<coretactics::reflexivity@0>",
        "<extratactics::discriminate@0>",
        "<extratactics::contradiction@0>",
    ],
    &[
        "<coretactics::clear@0>",
        "<ssreflect_plugin::ssrclear@0>",
        "<coretactics::clearbody@0>",
        "ml4tp.SC",
        "ml4tp.DOEND",
    ],
    &[
        "<coretactics::exact@0>",
        "<ssreflect_plugin::ssrexact@0>",
        "<ssreflect_plugin::ssrexact@1>",
    ],
    &["<coretactics::constructor@0>", "<coretactics::constructor@1>"],
    &["<coretactics::left@0>", "<coretactics::left_with@0>"],
    &["<coretactics::right@0>", "<coretactics::right_with@0>"],
    &["<coretactics::split@0>", "split"],
    &["<coretactics::symmetry@0>"],
    &["<coretactics::transitivity@0>"],
    &["<g_auto::auto@0>", "<g_auto::eauto@0>"],
    &[
        "apply",
        "<ssreflect_plugin::ssrapply@0>",
        "<ssreflect_plugin::ssrapply@1>",
    ],
    &[
        "case",
        "<ssreflect_plugin::ssrcase@0>",
        "<ssreflect_plugin::ssrcase@1>",
    ],
    &["compute", "red", "simpl", "ml4tp.SPS"],
    &["<ssreflect_plugin::ssrcongr@0>"],
    &["<ssreflect_plugin::ssrelim@0>"],
    &[
        "<ssreflect_plugin::ssrhave@0>",
        "<coretactics::exists@0>",
        "<coretactics::exists@1>",
    ],
    &[
        "<ssreflect_plugin::ssrmove@0>",
        "<ssreflect_plugin::ssrmove@1>",
        "<ssreflect_plugin::ssrmove@2>",
        "<ssreflect_plugin::ssrmove@3>",
    ],
    &[
        "<ssreflect_plugin::ssrpose@0>",
        "<ssreflect_plugin::ssrpose@1>",
        "<ssreflect_plugin::ssrpose@2>",
    ],
    &["<ssreflect_plugin::ssrrewrite@0>", "rewrite"],
    &["<ssreflect_plugin::ssrset@0>"],
    &[
        "<ssreflect_plugin::ssrsuff@0>",
        "<ssreflect_plugin::ssrsuffices@0>",
    ],
    &["<ssreflect_plugin::ssrtcldo@0>"],
    &[
        "<ssreflect_plugin::ssrwithoutloss@0>",
        "<ssreflect_plugin::ssrwithoutlossss@0>",
        "<ssreflect_plugin::ssrwlog@0>",
        "<ssreflect_plugin::ssrwlogs@0>",
        "<ssreflect_plugin::ssrwlogss@0>",
    ],
];

/// Index into [`TACTIC_FAMILIES`] of the family `name` belongs to.
pub fn family_of(name: &str) -> Option<usize> {
    TACTIC_FAMILIES
        .iter()
        .position(|family| family.contains(&name))
}

fn first_token(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or_default()
}

/// Invocation counts of the known ML tactics, in [`KNOWN_TACTICS`] order.
///
/// Each invocation counts once, under the first token of its name.
pub fn tactic_hist(graph: &ProofGraph) -> IndexMap<&'static str, usize> {
    let mut hist: IndexMap<&'static str, usize> =
        KNOWN_TACTICS.iter().map(|&(name, _)| (name, 0)).collect();
    for edges in graph.invocations().values() {
        let Some(first) = edges.first() else { continue };
        let Some(index) = known_index(&first.tactic_kind, &first.tactic_name) else {
            continue;
        };
        if let Some((_, count)) = hist.get_index_mut(index) {
            *count += 1;
        }
    }
    hist
}

/// Invocation counts per family, keyed by the family's first member.
pub fn family_hist(graph: &ProofGraph) -> IndexMap<&'static str, usize> {
    let mut hist: IndexMap<&'static str, usize> = TACTIC_FAMILIES
        .iter()
        .filter_map(|family| family.first().map(|&name| (name, 0)))
        .collect();
    for edges in graph.invocations().values() {
        let Some(first) = edges.first() else { continue };
        let Some(index) = family_of(first_token(&first.tactic_name)) else {
            continue;
        };
        if let Some((_, count)) = hist.get_index_mut(index) {
            *count += 1;
        }
    }
    hist
}

fn known_index(kind: &TacticKind, name: &str) -> Option<usize> {
    if *kind != TacticKind::Ml {
        return None;
    }
    let token = first_token(name);
    KNOWN_TACTICS.iter().position(|&(known, _)| known == token)
}

/// Mean of `measure` over the flat view, grouped by depth in ascending order.
#[allow(clippy::cast_precision_loss)]
fn mean_by_depth<F>(graph: &ProofGraph, measure: F) -> Vec<(usize, f64)>
where
    F: Fn(Option<&GoalSnapshot>) -> usize,
{
    let mut by_depth: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for entry in graph.flat_view() {
        by_depth
            .entry(entry.depth)
            .or_default()
            .push(measure(entry.snapshot));
    }
    by_depth.sort_keys();
    by_depth
        .into_iter()
        .map(|(depth, values)| {
            let mean = values.iter().sum::<usize>() as f64 / values.len() as f64;
            (depth, mean)
        })
        .collect()
}

/// Mean number of hypotheses per depth.
pub fn avg_depth_ctx_items(graph: &ProofGraph) -> Vec<(usize, f64)> {
    mean_by_depth(graph, |snapshot| {
        snapshot.map_or(0, |s| s.context_identifiers.len())
    })
}

/// Mean total length of the pretty-printed hypothesis types per depth.
///
/// Hypotheses without a pretty type count as empty.
pub fn avg_depth_ctx_size(graph: &ProofGraph, tables: &EpilogueTables) -> Vec<(usize, f64)> {
    mean_by_depth(graph, |snapshot| {
        snapshot.map_or(0, |s| {
            s.context_identifiers
                .iter()
                .map(|ident| tables.pretty_type(ident).map_or(0, str::len))
                .sum()
        })
    })
}

/// Mean length of the pretty-printed conclusion per depth.
pub fn avg_depth_goal_size(graph: &ProofGraph) -> Vec<(usize, f64)> {
    mean_by_depth(graph, |snapshot| {
        snapshot
            .and_then(|s| s.pretty_goal.as_deref())
            .map_or(0, str::len)
    })
}

/// Known-tactic counts per depth, every depth from 1 to the deepest entry.
///
/// Rows are in [`KNOWN_TACTICS`] order, counted the way [`tactic_hist`] does.
pub fn depth_tactic_hist(graph: &ProofGraph) -> Vec<(usize, Vec<usize>)> {
    let view = graph.flat_view();
    let max_depth = view.iter().map(|entry| entry.depth).max().unwrap_or(0);
    let mut rows: Vec<(usize, Vec<usize>)> = (1..=max_depth)
        .map(|depth| (depth, vec![0; KNOWN_TACTICS.len()]))
        .collect();
    for entry in &view {
        let Some(index) = known_index(&entry.edge.tactic_kind, &entry.edge.tactic_name) else {
            continue;
        };
        if let Some((_, row)) = entry.depth.checked_sub(1).and_then(|i| rows.get_mut(i)) {
            row[index] += 1;
        }
    }
    rows
}

/// Per-lemma statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaStats {
    /// Counts in [`KNOWN_TACTICS`] order.
    pub hist: Vec<usize>,
    /// Counts in [`TACTIC_FAMILIES`] order.
    pub family_hist: Vec<usize>,
    pub num_tacs: usize,
    pub num_goals: usize,
    pub num_term: usize,
    pub num_err: usize,
    pub term_path_lens: Vec<usize>,
    pub err_path_lens: Vec<usize>,
    pub have_info: Vec<(String, usize, Vec<String>)>,
    pub avg_depth_ctx_items: Vec<(usize, f64)>,
    pub avg_depth_ctx_size: Vec<(usize, f64)>,
    pub avg_depth_goal_size: Vec<(usize, f64)>,
    /// Per depth, counts in [`KNOWN_TACTICS`] order.
    pub depth_tactic_hist: Vec<(usize, Vec<usize>)>,
    /// Closed or failed goals unreachable from the root.
    pub notok: Vec<String>,
}

impl LemmaStats {
    /// `tables` supplies the pretty hypothesis types of the same lemma.
    pub fn of(graph: &ProofGraph, tables: &EpilogueTables) -> Self {
        let term = graph.terminal_paths();
        let err = graph.dead_paths();
        let notok = term
            .unreachable
            .iter()
            .chain(&err.unreachable)
            .map(ToString::to_string)
            .collect();

        Self {
            hist: tactic_hist(graph).into_values().collect(),
            family_hist: family_hist(graph).into_values().collect(),
            num_tacs: graph.invocations().len(),
            num_goals: graph.num_nodes(),
            num_term: graph.terminal_goals().len(),
            num_err: graph.dead_goals().len(),
            term_path_lens: term.paths.iter().map(Vec::len).collect(),
            err_path_lens: err.paths.iter().map(Vec::len).collect(),
            have_info: graph
                .have_info()
                .into_iter()
                .map(|HaveInfo { full_tactic, length, path }| (full_tactic, length, path))
                .collect(),
            avg_depth_ctx_items: avg_depth_ctx_items(graph),
            avg_depth_ctx_size: avg_depth_ctx_size(graph, tables),
            avg_depth_goal_size: avg_depth_goal_size(graph),
            depth_tactic_hist: depth_tactic_hist(graph),
            notok,
        }
    }

    /// One JSON line: `{"lemma": NAME, "info": STATS}`.
    pub fn to_json_line(&self, lemma: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Record<'a> {
            lemma: &'a str,
            info: &'a LemmaStats,
        }
        Ok(serde_json::to_string(&Record { lemma, info: self })?)
    }
}
