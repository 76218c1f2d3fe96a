//! Per-lemma epilogue lookup tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::decl::ExprKey;

/// Tables written after the last tactic state of a lemma.
///
/// Owned by exactly one lemma; a fresh value is created for every `bg(pf)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpilogueTables {
    /// Hypothesis identifier to the key of its type.
    pub ctx_types: HashMap<String, ExprKey>,
    /// Hypothesis identifier to the key of its body (let-bound hypotheses).
    pub ctx_bodies: HashMap<String, ExprKey>,
    /// Shared-expression key to its undecoded text.
    pub shared: HashMap<ExprKey, String>,
    /// Pretty-printed hypothesis types.
    pub pretty_types: HashMap<String, String>,
    /// Pretty-printed hypothesis bodies.
    pub pretty_bodies: HashMap<String, String>,
    /// Pretty-printed conclusions, by conclusion key.
    pub pretty_goals: HashMap<ExprKey, String>,
}

impl EpilogueTables {
    pub fn is_empty(&self) -> bool {
        self.ctx_types.is_empty()
            && self.ctx_bodies.is_empty()
            && self.shared.is_empty()
            && self.pretty_types.is_empty()
            && self.pretty_bodies.is_empty()
            && self.pretty_goals.is_empty()
    }

    pub fn type_key(&self, ident: &str) -> Option<ExprKey> {
        self.ctx_types.get(ident).copied()
    }

    pub fn body_key(&self, ident: &str) -> Option<ExprKey> {
        self.ctx_bodies.get(ident).copied()
    }

    pub fn pretty_goal(&self, key: ExprKey) -> Option<&str> {
        self.pretty_goals.get(&key).map(String::as_str)
    }

    pub fn pretty_type(&self, ident: &str) -> Option<&str> {
        self.pretty_types.get(ident).map(String::as_str)
    }
}
