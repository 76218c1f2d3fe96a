//! Recursive descent from declarations to a tactic forest.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    cursor::DeclCursor,
    node::{DeclPair, InvocationId, Shape, Tactic},
    rules::{self, Action},
};
use crate::{
    error::{Error, Result},
    lex::Declaration,
};

/// Why the top-level loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stop {
    Exhausted,
    /// A closing declaration with no open body ended the loop early.
    Closer {
        tactic_name: String,
        remaining: usize,
    },
}

/// Result of parsing one lemma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTactics {
    pub tactics: Vec<Tactic>,
    pub stop: Stop,
}

impl ParsedTactics {
    pub fn is_complete(&self) -> bool {
        self.stop == Stop::Exhausted
    }

    /// Every invocation, nested ones included, in pre-order.
    pub fn walk(&self) -> Vec<&Tactic> {
        self.tactics.iter().flat_map(Tactic::walk).collect()
    }
}

/// Number of trailing after-declarations a branching tactic consumes.
///
/// `next_goals` is the goal count of the first trailing declaration and
/// `this_goals` that of the before-declaration it is measured against.
pub fn trailing_count(next_goals: usize, this_goals: usize) -> usize {
    (next_goals + 1).saturating_sub(this_goals).max(1)
}

/// Parse a lemma's declarations into its tactic forest.
pub fn parse_tactics(declarations: Vec<Declaration>) -> Result<ParsedTactics> {
    let mut cursor = DeclCursor::new(declarations);
    TacticParser::default().parse(&mut cursor)
}

/// Parser state shared by every level of the descent.
#[derive(Debug, Default)]
pub struct TacticParser {
    next_uid: InvocationId,
    depth: usize,
}

impl TacticParser {
    pub fn parse(&mut self, cursor: &mut DeclCursor) -> Result<ParsedTactics> {
        let (tactics, stop) = self.parse_sequence(cursor)?;
        if let Stop::Closer { tactic_name, remaining } = &stop {
            warn!("top-level parse stopped at closer {tactic_name} with {remaining} declarations left");
        }
        Ok(ParsedTactics { tactics, stop })
    }

    fn fresh_uid(&mut self) -> InvocationId {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    fn log_step(&self, step: &str, cursor: &mut DeclCursor) {
        if let Some(decl) = cursor.peek() {
            debug!("{:indent$}@{step}:before<{decl}>", "", indent = 2 * self.depth);
        }
    }

    fn parse_sequence(&mut self, cursor: &mut DeclCursor) -> Result<(Vec<Tactic>, Stop)> {
        self.log_step("parse_sequence", cursor);
        let mut acc = Vec::new();

        while let Some(decl) = cursor.peek() {
            let Some(rule) = rules::dispatch(decl) else {
                let shown = decl.to_string();
                for tac in &acc {
                    debug!("parsed before error: {tac}");
                }
                return Err(Error::shape(
                    format!("no rule for {} declaration of {}", decl.mode, decl.tactic_name),
                    Some(shown),
                ));
            };

            let tactic = match rule.action {
                Action::Close => {
                    let tactic_name = decl.tactic_name.clone();
                    let remaining = cursor.remaining();
                    return Ok((acc, Stop::Closer { tactic_name, remaining }));
                }
                Action::FixedStacked { name, terminal } => {
                    self.parse_fixed_stacked(cursor, name, terminal)?
                }
                Action::FixedSequential { name, terminal } => {
                    self.parse_fixed_sequential(cursor, name, terminal)?
                }
                Action::VariableSequential { name } => self.parse_variable_sequential(cursor, name)?,
                Action::NotationTerminal { alias, core } => {
                    self.parse_notation_terminal(cursor, alias, core)?
                }
                Action::NestedFixed { name, closer } => self.parse_nested_fixed(cursor, name, closer)?,
                Action::NestedVariable { name, closer } => {
                    self.parse_nested_variable(cursor, name, closer)?
                }
                Action::SequenceBody { closer } => self.parse_sequence_body(cursor, closer)?,
                Action::DoPrefix => self.parse_do_prefix(cursor)?,
                Action::Generic => self.parse_generic(cursor)?,
            };
            acc.push(tactic);
        }
        Ok((acc, Stop::Exhausted))
    }

    /// Parse a body and check it ended at the family's closer.
    fn parse_body(&mut self, cursor: &mut DeclCursor, closer: &str) -> Result<Vec<Tactic>> {
        self.depth += 1;
        let parsed = self.parse_sequence(cursor);
        self.depth -= 1;

        let (body, stop) = parsed?;
        match stop {
            Stop::Closer { tactic_name, .. } => {
                let token = tactic_name.split_whitespace().next().unwrap_or_default();
                if token != closer {
                    warn!("body expecting {closer} was closed by {tactic_name}");
                }
            }
            Stop::Exhausted => {
                warn!("declarations ended inside a body expecting {closer}");
            }
        }
        Ok(body)
    }

    /// ```text
    /// before(name)
    ///   before(name@0)
    ///   after(name@0)
    /// after(name)
    /// ```
    fn parse_fixed_stacked(
        &mut self,
        cursor: &mut DeclCursor,
        name: &str,
        terminal: bool,
    ) -> Result<Tactic> {
        self.log_step("parse_fixed_stacked", cursor);
        let alias_before = cursor.expect("alias before")?;
        let core_before = cursor.expect("core before")?;
        let core_after = cursor.expect("core after")?;
        let alias_after = cursor.expect("alias after")?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: name.to_string(),
            terminal,
            shape: Shape::FixedStacked {
                alias: DeclPair {
                    before: alias_before,
                    after: alias_after,
                },
                core: DeclPair {
                    before: core_before,
                    after: core_after,
                },
            },
        })
    }

    /// ```text
    /// before(name)
    /// after(name)
    /// before(name@0)
    /// after(name@0)
    /// ```
    fn parse_fixed_sequential(
        &mut self,
        cursor: &mut DeclCursor,
        name: &str,
        terminal: bool,
    ) -> Result<Tactic> {
        self.log_step("parse_fixed_sequential", cursor);
        let alias_before = cursor.expect("alias before")?;
        let alias_after = cursor.expect("alias after")?;
        let core_before = cursor.expect("core before")?;
        let core_after = cursor.expect("core after")?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: name.to_string(),
            terminal,
            shape: Shape::FixedSequential {
                alias: DeclPair {
                    before: alias_before,
                    after: alias_after,
                },
                core: DeclPair {
                    before: core_before,
                    after: core_after,
                },
            },
        })
    }

    /// Trailing run after `measured_against`.
    ///
    /// Returns the run and whether it was cut short at a terminal state.
    fn parse_run(
        cursor: &mut DeclCursor,
        measured_against: &Declaration,
        what: &str,
    ) -> Result<(Vec<Declaration>, bool)> {
        let Some(next) = cursor.peek() else {
            debug!("terminal: declarations exhausted");
            return Ok((Vec::new(), true));
        };
        if next.num_open_goals == 0 {
            debug!("terminal: number of goals is 0");
            return Ok((vec![cursor.expect(what)?], true));
        }
        let count = trailing_count(next.num_open_goals, measured_against.num_open_goals);
        Ok((cursor.take(count, what)?, false))
    }

    /// ```text
    /// before(name)
    /// after(name)
    /// before(name@0)
    /// after(name@0-1) ... after(name@0-n)
    /// ```
    fn parse_variable_sequential(&mut self, cursor: &mut DeclCursor, name: &str) -> Result<Tactic> {
        self.log_step("parse_variable_sequential", cursor);
        let alias_before = cursor.expect("alias before")?;
        let alias_after = cursor.expect("alias after")?;
        let core_before = cursor.expect("core before")?;
        let (core_afters, terminal) = Self::parse_run(cursor, &core_before, "core after")?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: name.to_string(),
            terminal,
            shape: Shape::VariableSequential {
                alias: DeclPair {
                    before: alias_before,
                    after: alias_after,
                },
                core_before,
                core_afters,
            },
        })
    }

    /// ```text
    /// before(alias)
    ///   before(core)
    ///   [after(core)]
    /// [after(alias)]
    /// ```
    fn parse_notation_terminal(
        &mut self,
        cursor: &mut DeclCursor,
        alias_name: &str,
        core_name: &str,
    ) -> Result<Tactic> {
        self.log_step("parse_notation_terminal", cursor);
        let alias = cursor.expect("alias before")?;
        let core = cursor.expect("core before")?;
        let mut extra = Vec::new();
        if cursor.next_starts_with(core_name) {
            extra.push(cursor.expect("core after")?);
            if cursor.next_starts_with(alias_name) {
                extra.push(cursor.expect("alias after")?);
            }
        }
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: alias_name.to_string(),
            terminal: true,
            shape: Shape::NotationTerminal { alias, core, extra },
        })
    }

    /// ```text
    /// before(name)
    ///   before(name@0)
    ///     body
    ///   after(name@0)
    /// after(name)
    /// ```
    fn parse_nested_fixed(
        &mut self,
        cursor: &mut DeclCursor,
        name: &str,
        closer: &str,
    ) -> Result<Tactic> {
        self.log_step("parse_nested_fixed", cursor);
        let alias_before = cursor.expect("alias before")?;
        let core_before = cursor.expect("core before")?;
        let body = self.parse_body(cursor, closer)?;
        let core_after = cursor.expect(closer)?;
        let alias_after = cursor.expect("alias after")?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: name.to_string(),
            terminal: false,
            shape: Shape::NestedFixed {
                alias: DeclPair {
                    before: alias_before,
                    after: alias_after,
                },
                core: DeclPair {
                    before: core_before,
                    after: core_after,
                },
                body,
            },
        })
    }

    /// ```text
    /// before(name)
    ///   before(name@0)
    ///     body
    ///   after(name@0-1) ... after(name@0-n)
    /// after(name-1) ... after(name-n)
    /// ```
    fn parse_nested_variable(
        &mut self,
        cursor: &mut DeclCursor,
        name: &str,
        closer: &str,
    ) -> Result<Tactic> {
        self.log_step("parse_nested_variable", cursor);
        let alias_before = cursor.expect("alias before")?;
        let core_before = cursor.expect("core before")?;
        let body = self.parse_body(cursor, closer)?;

        let (core_afters, alias_afters, terminal) = match cursor.peek().map(|d| d.num_open_goals) {
            None => {
                debug!("terminal: declarations exhausted");
                (Vec::new(), Vec::new(), true)
            }
            Some(0) => {
                debug!("terminal: number of goals is 0");
                let core_after = cursor.expect(closer)?;
                let alias_after = cursor.expect("alias after")?;
                (vec![core_after], vec![alias_after], true)
            }
            Some(goals) => {
                let core_afters = cursor.take(trailing_count(goals, core_before.num_open_goals), closer)?;
                let alias_afters =
                    cursor.take(trailing_count(goals, alias_before.num_open_goals), "alias after")?;
                (core_afters, alias_afters, false)
            }
        };

        Ok(Tactic {
            uid: self.fresh_uid(),
            name: name.to_string(),
            terminal,
            shape: Shape::NestedVariable {
                alias_before,
                core_before,
                core_afters,
                alias_afters,
                body,
            },
        })
    }

    /// ```text
    /// before(seq@0)
    ///   body
    /// after(seq@0)
    /// ```
    fn parse_sequence_body(&mut self, cursor: &mut DeclCursor, closer: &str) -> Result<Tactic> {
        self.log_step("parse_sequence_body", cursor);
        let before = cursor.expect("sequence before")?;
        let body = self.parse_body(cursor, closer)?;
        let after = cursor.expect(closer)?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: "Ssrtclseq".to_string(),
            terminal: false,
            shape: Shape::SequenceBody {
                core: DeclPair { before, after },
                body,
            },
        })
    }

    fn parse_do_prefix(&mut self, cursor: &mut DeclCursor) -> Result<Tactic> {
        self.log_step("parse_do_prefix", cursor);
        let core = cursor.expect("do before")?;
        Ok(Tactic {
            uid: self.fresh_uid(),
            name: "Ssrtcldo".to_string(),
            terminal: false,
            shape: Shape::DoPrefix { core },
        })
    }

    /// One before-declaration and the afters that follow it.
    ///
    /// Cut short, as terminal, when the declarations run out or the next one
    /// belongs to a different tactic.
    fn parse_generic(&mut self, cursor: &mut DeclCursor) -> Result<Tactic> {
        self.log_step("parse_generic", cursor);
        let before = cursor.expect("before")?;

        let same_tactic = cursor
            .peek()
            .map(|next| next.tactic_name == before.tactic_name);
        let (afters, terminal) = match same_tactic {
            None => {
                debug!("terminal: declarations exhausted");
                (Vec::new(), true)
            }
            Some(false) => {
                debug!("terminal: next declaration belongs to another tactic");
                (Vec::new(), true)
            }
            Some(true) => Self::parse_run(cursor, &before, "after")?,
        };

        Ok(Tactic {
            uid: self.fresh_uid(),
            name: before.name_token().to_string(),
            terminal,
            shape: Shape::Generic { before, afters },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{DeclMode, SOLVED};

    fn bf(name: &str, gid: i64, ngs: usize) -> Declaration {
        Declaration::stub(DeclMode::Before, name, gid, ngs)
    }

    fn af(name: &str, gid: i64, ngs: usize) -> Declaration {
        Declaration::stub(DeclMode::After, name, gid, ngs)
    }

    #[test]
    fn trailing_count_law() {
        assert_eq!(trailing_count(3, 1), 3);
        assert_eq!(trailing_count(1, 1), 1);
        assert_eq!(trailing_count(1, 4), 1);
    }

    #[test]
    fn intro_is_fixed_stacked() {
        let parsed = parse_tactics(vec![
            bf("intro", 1, 1),
            bf("<coretactics::intro@0>", 1, 1),
            af("<coretactics::intro@0>", 2, 1),
            af("intro", 2, 1),
        ])
        .unwrap();
        assert!(parsed.is_complete());
        assert_eq!(parsed.tactics.len(), 1);
        let tac = &parsed.tactics[0];
        assert_eq!(tac.name, "Intro");
        assert_eq!(tac.entry_goal_id(), 1);
        assert_eq!(tac.exit_goal_ids(), vec![2]);
    }

    #[test]
    fn generic_branches_by_goal_delta() {
        let parsed = parse_tactics(vec![
            bf("apply foo", 1, 1),
            af("apply foo", 2, 3),
            af("apply foo", 3, 3),
            af("apply foo", 4, 3),
        ])
        .unwrap();
        let tac = &parsed.tactics[0];
        assert_eq!(tac.name, "apply");
        assert_eq!(tac.exit_goal_ids(), vec![2, 3, 4]);
        assert!(!tac.terminal);
        assert!(tac.to_string().starts_with("apply(0;"));
    }

    #[test]
    fn generic_short_circuits() {
        // Different tactic next: nothing consumed.
        let parsed = parse_tactics(vec![bf("simpl", 1, 1), bf("simpl in H", 1, 1)]).unwrap();
        assert_eq!(parsed.tactics.len(), 2);
        assert!(parsed.tactics.iter().all(|t| t.terminal && t.exits().is_empty()));

        // Solved next: exactly one consumed.
        let parsed = parse_tactics(vec![bf("auto", 1, 1), af("auto", 0, 0)]).unwrap();
        assert_eq!(parsed.tactics[0].exit_goal_ids(), vec![SOLVED]);
        assert!(parsed.tactics[0].terminal);
    }

    #[test]
    fn split_is_variable_sequential() {
        let parsed = parse_tactics(vec![
            bf("split", 1, 1),
            af("split", 1, 1),
            bf("<coretactics::split@0>", 1, 1),
            af("<coretactics::split@0>", 2, 2),
            af("<coretactics::split@0>", 3, 2),
        ])
        .unwrap();
        assert_eq!(parsed.tactics[0].exit_goal_ids(), vec![2, 3]);
        assert_eq!(parsed.tactics[0].num_declarations(), 5);
    }

    #[test]
    fn have_body_is_nested() {
        let parsed = parse_tactics(vec![
            bf("have (ssrhavefwdwbinders)", 1, 1),
            bf(rules::SSR_HAVE, 1, 1),
            bf("simpl", 5, 2),
            af("simpl", 6, 2),
            bf("auto", 6, 2),
            af("auto", 0, 0),
            af(rules::SSR_HAVE, 7, 1),
            af("have (ssrhavefwdwbinders)", 7, 1),
        ])
        .unwrap();
        assert!(parsed.is_complete());
        let have = &parsed.tactics[0];
        assert_eq!(have.name, "Ssrhave");
        assert_eq!(have.body().len(), 2);
        assert_eq!(have.exit_goal_ids(), vec![7]);
        // Children get their ids first.
        assert!(have.body().iter().all(|t| t.uid < have.uid));
    }

    #[test]
    fn nested_variable_takes_two_runs() {
        let parsed = parse_tactics(vec![
            bf("apply (ssrapplyarg)", 1, 1),
            bf(rules::SSR_APPLY, 1, 1),
            af(rules::SSR_APPLY, 2, 2),
            af(rules::SSR_APPLY, 3, 2),
            af("apply (ssrapplyarg)", 2, 2),
            af("apply (ssrapplyarg)", 3, 2),
        ])
        .unwrap();
        let apply = &parsed.tactics[0];
        assert!(apply.body().is_empty());
        assert_eq!(apply.exit_goal_ids(), vec![2, 3]);
        assert_eq!(apply.num_declarations(), 6);
    }

    #[test]
    fn do_prefix_loops_on_its_goal() {
        let parsed = parse_tactics(vec![bf(rules::SSR_TCLDO, 4, 1)]).unwrap();
        let tac = &parsed.tactics[0];
        assert_eq!(tac.entry_goal_id(), 4);
        assert_eq!(tac.exit_goal_ids(), vec![4]);
    }

    #[test]
    fn stray_closer_stops_top_level() {
        let parsed = parse_tactics(vec![
            bf("auto", 1, 1),
            af("auto", 0, 0),
            af(rules::SSR_HAVE, 2, 1),
            af("simpl", 3, 1),
        ])
        .unwrap();
        assert_eq!(parsed.tactics.len(), 1);
        assert_eq!(
            parsed.stop,
            Stop::Closer {
                tactic_name: rules::SSR_HAVE.to_string(),
                remaining: 2,
            }
        );
    }

    #[test]
    fn orphan_after_is_a_shape_error() {
        let err = parse_tactics(vec![af("simpl", 3, 1)]).unwrap_err();
        assert!(matches!(err, Error::TacticShape { declaration: Some(_), .. }));
    }

    #[test]
    fn truncated_fixed_shape_is_a_shape_error() {
        let err = parse_tactics(vec![bf("intro", 1, 1), bf("<coretactics::intro@0>", 1, 1)])
            .unwrap_err();
        assert!(matches!(err, Error::TacticShape { .. }));
    }
}
