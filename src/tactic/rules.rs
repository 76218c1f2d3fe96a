//! Dispatch table from declarations to tactic shapes.
//!
//! Rules are checked top to bottom; the first match wins. Openers match on a
//! tactic-name prefix, closers on the exact first token of the name.

use crate::lex::{DeclMode, Declaration};

// ============================================================================
// Tactic family names
// ============================================================================

pub const SSR_TCLBY: &str = "<ssreflect_plugin::ssrtclby@0>";
pub const SSR_EXACT: &str = "<ssreflect_plugin::ssrexact@0>";
pub const SSR_HAVE: &str = "<ssreflect_plugin::ssrhave@0>";
pub const SSR_APPLY: &str = "<ssreflect_plugin::ssrapply@0>";
pub const SSR_REWRITE: &str = "<ssreflect_plugin::ssrrewrite@0>";
pub const SSR_TCLSEQ: &str = "<ssreflect_plugin::ssrtclseq@0>";
pub const SSR_TCLDO: &str = "<ssreflect_plugin::ssrtcldo@0>";
pub const DISCRIMINATE_CORE: &str = "<extratactics::discriminate@0>";

// ============================================================================
// Rules
// ============================================================================

/// How a rule inspects the tactic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Prefix(&'static str),
    /// Prefix match that must not also match `except` (`intro` vs `intros`).
    PrefixExcept {
        prefix: &'static str,
        except: &'static str,
    },
    /// Exact match on the first whitespace-separated token.
    Token(&'static str),
    Any,
}

impl Matcher {
    pub fn matches(self, tactic_name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => tactic_name.starts_with(prefix),
            Self::PrefixExcept { prefix, except } => {
                tactic_name.starts_with(prefix) && !tactic_name.starts_with(except)
            }
            Self::Token(token) => tactic_name.split_whitespace().next() == Some(token),
            Self::Any => true,
        }
    }
}

/// What the parser does once a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `bf alias, bf core, af core, af alias`.
    FixedStacked { name: &'static str, terminal: bool },
    /// `bf alias, af alias, bf core, af core`.
    FixedSequential { name: &'static str, terminal: bool },
    /// `bf alias, af alias, bf core` then a run of core afters.
    VariableSequential { name: &'static str },
    /// `bf alias, bf core` then optionally `af core` and `af alias`.
    NotationTerminal {
        alias: &'static str,
        core: &'static str,
    },
    /// `bf alias, bf core, body, af core, af alias`.
    NestedFixed {
        name: &'static str,
        closer: &'static str,
    },
    /// `bf alias, bf core, body` then runs of core and alias afters.
    NestedVariable {
        name: &'static str,
        closer: &'static str,
    },
    /// `bf, body, af`.
    SequenceBody { closer: &'static str },
    /// A lone before whose goal is also its exit.
    DoPrefix,
    /// One before followed by its afters.
    Generic,
    /// Ends the enclosing body without consuming anything.
    Close,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub mode: DeclMode,
    pub matcher: Matcher,
    pub action: Action,
}

impl Rule {
    pub fn matches(&self, decl: &Declaration) -> bool {
        decl.mode == self.mode && self.matcher.matches(&decl.tactic_name)
    }
}

const fn before(matcher: Matcher, action: Action) -> Rule {
    Rule {
        mode: DeclMode::Before,
        matcher,
        action,
    }
}

const fn after(matcher: Matcher, action: Action) -> Rule {
    Rule {
        mode: DeclMode::After,
        matcher,
        action,
    }
}

/// The dispatch table, in priority order.
///
/// `exact (ssrexactarg)` is listed after the plain `exact` prefix and is
/// therefore never selected; the order is kept as recorded traces expect it.
pub const RULES: &[Rule] = &[
    // Non-branching, stacked
    before(
        Matcher::PrefixExcept {
            prefix: "intro",
            except: "intros",
        },
        Action::FixedStacked {
            name: "Intro",
            terminal: false,
        },
    ),
    before(
        Matcher::Prefix("case"),
        Action::FixedStacked {
            name: "Case",
            terminal: false,
        },
    ),
    before(
        Matcher::Prefix("trivial"),
        Action::FixedStacked {
            name: "trivial",
            terminal: true,
        },
    ),
    before(
        Matcher::Prefix("exact"),
        Action::FixedStacked {
            name: "Exact",
            terminal: true,
        },
    ),
    // Terminal, sequential
    before(
        Matcher::Prefix("assumption"),
        Action::FixedSequential {
            name: "Assumption",
            terminal: true,
        },
    ),
    before(
        Matcher::Prefix("reflexivity"),
        Action::FixedSequential {
            name: "Reflexivity",
            terminal: true,
        },
    ),
    // Branching, sequential
    before(
        Matcher::Prefix("split"),
        Action::VariableSequential { name: "Split" },
    ),
    before(
        Matcher::Prefix("discriminate"),
        Action::NotationTerminal {
            alias: "discriminate",
            core: DISCRIMINATE_CORE,
        },
    ),
    // Ssreflect
    before(
        Matcher::Prefix("move (ssrmovearg) (ssrclauses)"),
        Action::FixedStacked {
            name: "Ssrmove",
            terminal: false,
        },
    ),
    before(
        Matcher::Prefix("by (ssrhintarg)"),
        Action::NestedFixed {
            name: "Ssrby",
            closer: SSR_TCLBY,
        },
    ),
    after(Matcher::Token(SSR_TCLBY), Action::Close),
    before(
        Matcher::Prefix("exact (ssrexactarg)"),
        Action::NestedFixed {
            name: "Ssrexact",
            closer: SSR_EXACT,
        },
    ),
    before(Matcher::Token(SSR_EXACT), Action::Close),
    before(
        Matcher::Prefix("have (ssrhavefwdwbinders)"),
        Action::NestedFixed {
            name: "Ssrhave",
            closer: SSR_HAVE,
        },
    ),
    after(Matcher::Token(SSR_HAVE), Action::Close),
    before(
        Matcher::Prefix("apply (ssrapplyarg)"),
        Action::NestedVariable {
            name: "Ssrapply",
            closer: SSR_APPLY,
        },
    ),
    after(Matcher::Token(SSR_APPLY), Action::Close),
    before(
        Matcher::Prefix("rewrite (ssrrwargs) (ssrclauses)"),
        Action::NestedVariable {
            name: "Ssrrewrite",
            closer: SSR_REWRITE,
        },
    ),
    after(Matcher::Token(SSR_REWRITE), Action::Close),
    before(
        Matcher::Prefix(SSR_TCLSEQ),
        Action::SequenceBody { closer: SSR_TCLSEQ },
    ),
    after(Matcher::Token(SSR_TCLSEQ), Action::Close),
    before(Matcher::Prefix(SSR_TCLDO), Action::DoPrefix),
    // Fallback
    before(Matcher::Any, Action::Generic),
];

/// First rule matching `decl`, if any.
pub fn dispatch(decl: &Declaration) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(decl))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_for(mode: DeclMode, name: &str) -> Option<Action> {
        dispatch(&Declaration::stub(mode, name, 1, 1)).map(|rule| rule.action)
    }

    #[test]
    fn intro_but_not_intros() {
        assert!(matches!(
            action_for(DeclMode::Before, "intro x"),
            Some(Action::FixedStacked { name: "Intro", .. })
        ));
        assert_eq!(action_for(DeclMode::Before, "intros"), Some(Action::Generic));
    }

    #[test]
    fn plain_exact_shadows_ssreflect_exact() {
        assert!(matches!(
            action_for(DeclMode::Before, "exact (ssrexactarg)"),
            Some(Action::FixedStacked { name: "Exact", terminal: true })
        ));
    }

    #[test]
    fn closers_match_whole_token() {
        assert_eq!(action_for(DeclMode::After, SSR_HAVE), Some(Action::Close));
        assert_eq!(
            action_for(DeclMode::After, "<ssreflect_plugin::ssrhave@0> extra"),
            Some(Action::Close)
        );
        assert_eq!(
            action_for(DeclMode::After, "<ssreflect_plugin::ssrhave@0>x"),
            None
        );
        assert_eq!(action_for(DeclMode::Before, SSR_EXACT), Some(Action::Close));
    }

    #[test]
    fn ssreflect_openers() {
        assert!(matches!(
            action_for(DeclMode::Before, "have (ssrhavefwdwbinders) h"),
            Some(Action::NestedFixed { name: "Ssrhave", closer: SSR_HAVE })
        ));
        assert!(matches!(
            action_for(DeclMode::Before, "rewrite (ssrrwargs) (ssrclauses)"),
            Some(Action::NestedVariable { name: "Ssrrewrite", .. })
        ));
        assert_eq!(action_for(DeclMode::Before, SSR_TCLDO), Some(Action::DoPrefix));
    }

    #[test]
    fn unmatched_after_has_no_rule() {
        assert_eq!(action_for(DeclMode::After, "simpl"), None);
        assert_eq!(action_for(DeclMode::DeadEnd, "simpl"), None);
        assert_eq!(action_for(DeclMode::Before, "simpl"), Some(Action::Generic));
    }
}
