mod common;

use std::ops::ControlFlow;

use common::TraceBuilder;
use tacst_recon::{
    graph::{stats::LemmaStats, GraphNode, NodeKind},
    lex::TraceParser,
    process_trace, reconstruct,
    tactic::rules::{DISCRIMINATE_CORE, SSR_HAVE, SSR_TCLSEQ},
    Error, Reconstruction,
};

fn reconstruct_one(text: &str) -> Reconstruction {
    let lemma = TraceParser::from_text(text)
        .parse_lemma()
        .expect("trace should parse")
        .expect("trace should contain a lemma");
    reconstruct(lemma).expect("lemma should reconstruct")
}

fn intro_solves(b: TraceBuilder, name: &str) -> TraceBuilder {
    b.lemma(name)
        .before("intro", 1, 1)
        .before("<coretactics::intro@0>", 1, 1)
        .after("<coretactics::intro@0>", 0, 0)
        .after("intro", 0, 0)
        .end()
}

#[test]
fn single_intro_closes_the_goal() {
    let text = intro_solves(TraceBuilder::new(), "a").build();
    let recon = reconstruct_one(&text);
    let graph = &recon.graph;

    assert_eq!(recon.tactics.tactics.len(), 1);
    assert_eq!(graph.num_nodes(), 2);
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.root(), GraphNode::live(1));

    let edge = &graph.edges()[0];
    assert_eq!(edge.source, graph.root());
    assert_eq!(edge.target.kind, NodeKind::Terminal);
    assert_eq!(edge.tactic_name, "intro");
    assert!(!edge.is_body_edge);
}

#[test]
fn branching_tactic_consumes_its_trailing_run() {
    let text = TraceBuilder::new()
        .lemma("b")
        .before("apply foo", 1, 1)
        .after("apply foo", 3, 2)
        .after("apply foo", 3, 3)
        .after("apply foo", 3, 4)
        .end()
        .build();
    let recon = reconstruct_one(&text);

    assert!(recon.tactics.is_complete());
    assert_eq!(recon.tactics.tactics.len(), 1);
    assert_eq!(recon.tactics.tactics[0].num_declarations(), 4);

    let graph = &recon.graph;
    let out = graph.out_edges(&graph.root());
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|e| e.invocation_id == out[0].invocation_id));
    let targets: Vec<GraphNode> = out.iter().map(|e| e.target).collect();
    assert_eq!(
        targets,
        vec![GraphNode::live(2), GraphNode::live(3), GraphNode::live(4)]
    );
}

#[test]
fn have_body_edges_are_flagged() {
    let text = TraceBuilder::new()
        .lemma("c")
        .before("have (ssrhavefwdwbinders)", 1, 1)
        .before(SSR_HAVE, 1, 1)
        .before("simpl", 2, 5)
        .after("simpl", 2, 6)
        .before("auto", 2, 6)
        .after("auto", 0, 0)
        .after(SSR_HAVE, 1, 7)
        .after("have (ssrhavefwdwbinders)", 1, 7)
        .end()
        .build();
    let recon = reconstruct_one(&text);
    let graph = &recon.graph;
    let have = &recon.tactics.tactics[0];
    assert_eq!(have.body().len(), 2);

    let (wrapper_exit, rest): (Vec<_>, Vec<_>) = graph
        .edges()
        .iter()
        .partition(|e| e.target == GraphNode::live(7));
    assert_eq!(wrapper_exit.len(), 1);
    assert!(!wrapper_exit[0].is_body_edge);
    assert_eq!(wrapper_exit[0].source, graph.root());

    // Link into the body, then simpl and auto inside it.
    assert_eq!(rest.len(), 3);
    assert!(rest.iter().all(|e| e.is_body_edge));
    assert_eq!(rest[0].invocation_id, have.uid);
    assert_eq!(rest[0].target, GraphNode::live(5));

    let info = graph.have_info();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].path.len(), 4);
}

#[test]
fn discriminate_closes_through_its_core_call() {
    let text = TraceBuilder::new()
        .lemma("d")
        .before("discriminate", 1, 1)
        .before(DISCRIMINATE_CORE, 1, 1)
        .after(DISCRIMINATE_CORE, 0, 0)
        .after("discriminate", 0, 0)
        .end()
        .build();
    let recon = reconstruct_one(&text);
    let graph = &recon.graph;

    assert_eq!(recon.tactics.tactics.len(), 1);
    assert_eq!(graph.num_nodes(), 2);
    assert_eq!(graph.edges().len(), 1);
    let edge = &graph.edges()[0];
    assert_eq!(edge.source, GraphNode::live(1));
    assert_eq!(edge.target.kind, NodeKind::Terminal);
    assert!(!edge.is_body_edge);
}

#[test]
fn tclseq_links_into_its_body() {
    let text = TraceBuilder::new()
        .lemma("s")
        .before(SSR_TCLSEQ, 1, 1)
        .before("simpl", 1, 3)
        .after("simpl", 1, 4)
        .before("auto", 1, 4)
        .after("auto", 0, 0)
        .after(SSR_TCLSEQ, 0, 0)
        .end()
        .build();
    let recon = reconstruct_one(&text);
    let graph = &recon.graph;
    let seq = &recon.tactics.tactics[0];
    assert_eq!(seq.body().len(), 2);
    assert_eq!(graph.root(), GraphNode::live(1));

    let link = graph
        .out_edges(&graph.root())
        .into_iter()
        .find(|e| e.target == GraphNode::live(3))
        .expect("link edge into the body");
    assert!(link.is_body_edge);
    assert_eq!(link.invocation_id, seq.uid);

    let exits: Vec<_> = graph
        .edges()
        .iter()
        .filter(|e| e.invocation_id == seq.uid && !e.is_body_edge)
        .collect();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].target.kind, NodeKind::Terminal);
    assert!(graph.terminal_paths().unreachable.is_empty());
}

#[test]
fn malformed_header_fails_only_its_lemma() {
    let b = intro_solves(TraceBuilder::new(), "good1")
        .lemma("broken")
        .raw("bg(ts) {!} 9 {!} bf {!} intro {!} Name {!} loc");
    let bad_line = b.next_line();
    let text = intro_solves(
        b.raw("1 intro 7").raw("H {!} 7").raw("en(ts)").end(),
        "good2",
    )
    .build();

    let mut parser = TraceParser::from_text(&text);
    assert_eq!(parser.parse_lemma().unwrap().unwrap().name, "good1");
    let err = parser.parse_lemma().unwrap_err();
    assert_eq!(err.line(), Some(bad_line));
    assert!(matches!(&err, Error::Lemma { name, .. } if name == "broken"));
    assert!(matches!(
        err.root_cause(),
        Error::TraceSyntax { location, .. } if location.text == "1 intro 7"
    ));

    let mut parser = TraceParser::from_text(&text);
    let mut seen = Vec::new();
    let report = process_trace(&mut parser, |recon| {
        seen.push((recon.lemma.name, recon.lemma.declarations.len()));
        ControlFlow::Continue(())
    });
    assert_eq!(seen, vec![("good1".to_string(), 4), ("good2".to_string(), 4)]);
    assert_eq!(report.num_ok(), 2);
    assert_eq!(report.num_failed(), 1);
    assert!(!report.stopped);
}

#[test]
fn unreachable_dead_goal_is_reported() {
    // 5 and 6 only reach each other, so the failure under 6 has no root path.
    let text = TraceBuilder::new()
        .lemma("e")
        .before("apply foo", 1, 1)
        .after("apply foo", 2, 2)
        .after("apply foo", 2, 3)
        .before("auto", 2, 2)
        .after("auto", 0, 0)
        .before("lia", 1, 3)
        .dead("lia", 1)
        .before("simpl", 1, 5)
        .after("simpl", 1, 6)
        .before("red", 1, 6)
        .after("red", 1, 5)
        .before("lia", 1, 6)
        .dead("lia", 1)
        .end()
        .build();
    let recon = reconstruct_one(&text);
    let graph = &recon.graph;
    assert_eq!(graph.root(), GraphNode::live(1));

    let dead = graph.dead_paths();
    assert_eq!(dead.paths.len(), 1);
    assert_eq!(dead.paths[0].len(), 3);
    assert_eq!(dead.unreachable.len(), 1);
    assert_eq!(dead.unreachable[0].kind, NodeKind::Dead);

    let term = graph.terminal_paths();
    assert_eq!(term.paths.len(), 1);
    assert!(term.unreachable.is_empty());

    assert!(!graph.bfs_order().contains(&GraphNode::live(5)));
    let stats = LemmaStats::of(graph, &recon.lemma.tables);
    assert_eq!(stats.num_err, 2);
    assert_eq!(stats.notok.len(), 1);
}

#[test]
fn stats_line_names_the_lemma() {
    let text = intro_solves(TraceBuilder::new(), "a").build();
    let recon = reconstruct_one(&text);
    let line = LemmaStats::of(&recon.graph, &recon.lemma.tables)
        .to_json_line("a")
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["lemma"], "a");
    assert_eq!(value["info"]["num_term"], 1);
    assert_eq!(value["info"]["num_goals"], 2);
}

#[test]
fn seek_finds_a_later_lemma() {
    let text = intro_solves(intro_solves(TraceBuilder::new(), "first"), "second").build();
    let mut parser = TraceParser::from_text(&text);
    assert!(parser.seek_lemma("second"));
    let lemma = parser.parse_lemma().unwrap().unwrap();
    assert_eq!(lemma.name, "second");
    assert!(!TraceParser::from_text(&text).seek_lemma("third"));
}
