//! Lemma-at-a-time reconstruction: trace → declarations → tactics → graph.

use std::ops::ControlFlow;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    decode::{check_no_self_reference, RawTable},
    error::{Error, Result},
    graph::{build_graph, ProofGraph},
    lex::{LemmaTrace, TraceParser},
    tactic::{parse_tactics, ParsedTactics},
};

/// Everything reconstructed for one lemma.
#[derive(Debug, Clone, Serialize)]
pub struct Reconstruction {
    pub lemma: LemmaTrace,
    pub tactics: ParsedTactics,
    pub graph: ProofGraph,
}

/// Reconstruct one parsed lemma. Errors carry the lemma name.
pub fn reconstruct(lemma: LemmaTrace) -> Result<Reconstruction> {
    let name = lemma.name.clone();
    reconstruct_inner(lemma).map_err(|e| e.in_lemma(&name))
}

fn reconstruct_inner(lemma: LemmaTrace) -> Result<Reconstruction> {
    check_no_self_reference(&RawTable::new(&lemma.tables))?;
    let tactics = parse_tactics(lemma.declarations.clone())?;
    let graph = build_graph(&lemma.name, &tactics.tactics, lemma.goal_snapshots())?;
    Ok(Reconstruction {
        lemma,
        tactics,
        graph,
    })
}

/// Outcome of a whole-trace run.
#[derive(Debug, Default)]
pub struct TraceReport {
    /// Lemmas handed to the visitor.
    pub ok: usize,
    /// Lemmas that failed, by name when the name was known.
    pub failures: Vec<Error>,
    /// The visitor asked to stop before the trace was exhausted.
    pub stopped: bool,
}

impl TraceReport {
    pub const fn num_ok(&self) -> usize {
        self.ok
    }

    pub fn num_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Reconstruct every lemma, skipping to the next `bg(pf)` after a failure.
///
/// `visit` owns each successful reconstruction as soon as it is built; nothing
/// is retained afterwards. Returning [`ControlFlow::Break`] ends the run.
pub fn process_trace<F>(parser: &mut TraceParser, mut visit: F) -> TraceReport
where
    F: FnMut(Reconstruction) -> ControlFlow<()>,
{
    let mut report = TraceReport::default();
    loop {
        let lemma = match parser.parse_lemma() {
            Ok(Some(lemma)) => lemma,
            Ok(None) => break,
            Err(e) => {
                warn!("skipping lemma: {e}");
                report.failures.push(e);
                parser.skip_to_next_lemma();
                continue;
            }
        };

        match reconstruct(lemma) {
            Ok(recon) => {
                report.ok += 1;
                if visit(recon).is_break() {
                    info!("stopped after {} lemmas", report.ok);
                    report.stopped = true;
                    break;
                }
            }
            Err(e) => {
                warn!("skipping lemma: {e}");
                report.failures.push(e);
            }
        }
    }
    info!(
        "reconstructed {} lemmas, {} failed",
        report.num_ok(),
        report.num_failed()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_errors_are_tagged_with_the_lemma() {
        let text = "\
bg(pf) {!} 0 {!} bad
bg(ts) {!} 1 {!} af {!} simpl {!} Name {!} loc
1 {!} simpl {!} 2
 {!} 1
en(ts)
en(pf)
";
        let lemma = TraceParser::from_text(text).parse_lemma().unwrap().unwrap();
        let err = reconstruct(lemma).unwrap_err();
        assert!(matches!(&err, Error::Lemma { name, .. } if name == "bad"));
        assert!(matches!(err.root_cause(), Error::TacticShape { .. }));
    }

    const SOLVED_BY_AUTO: &str = "\
bg(ts) {!} 1 {!} bf {!} auto {!} Name {!} loc
1 {!} auto {!} 1
 {!} 1
en(ts)
bg(ts) {!} 2 {!} af {!} auto {!} Name {!} loc
ngs=0
en(ts)
en(pf)
";

    #[test]
    fn break_stops_the_run() {
        let text = ["first", "second", "third"]
            .iter()
            .map(|name| format!("bg(pf) {{!}} 0 {{!}} {name}\n{SOLVED_BY_AUTO}"))
            .collect::<String>();

        let mut parser = TraceParser::from_text(&text);
        let mut seen = Vec::new();
        let report = process_trace(&mut parser, |recon| {
            seen.push(recon.lemma.name);
            ControlFlow::Break(())
        });
        assert_eq!(seen, vec!["first"]);
        assert_eq!(report.num_ok(), 1);
        assert!(report.stopped);

        let mut parser = TraceParser::from_text(&text);
        let report = process_trace(&mut parser, |_| ControlFlow::Continue(()));
        assert_eq!(report.num_ok(), 3);
        assert!(!report.stopped);
    }
}
