//! Boundary to the shared-expression decoder.
//!
//! Decoding the structurally shared expression table is not done here. This
//! module only defines what the reconstruction needs from a decoder, resolves
//! goal snapshots through one, and checks that no shared expression mentions
//! its own key.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    error::{Error, Result},
    lex::{EpilogueTables, ExprKey, GoalSnapshot},
};

/// Resolves shared-expression keys.
pub trait ExpressionDecoder {
    type Expr;

    /// The expression stored under `key`, if there is one.
    fn resolve(&self, key: ExprKey) -> Option<Self::Expr>;

    /// Keys the expression under `key` refers to directly.
    fn references(&self, key: ExprKey) -> Vec<ExprKey>;

    /// Every key the decoder knows.
    fn keys(&self) -> Vec<ExprKey>;
}

/// Constructor tags whose numeric fields are payload (indices, universe
/// levels, global ids), never child keys.
const LEAF_TAGS: &[&str] = &["R", "V", "M", "S", "C", "I", "CS"];

/// Existential variables: the first number is the evar id, the rest are
/// the keys of its instance.
const EVAR_TAG: &str = "E";

/// Decoder over the raw `Constrs` table: expressions stay undecoded text.
///
/// Numeric tokens after the leading constructor tag are read as child keys,
/// except for the leaf tags.
#[derive(Debug, Clone, Copy)]
pub struct RawTable<'a> {
    shared: &'a HashMap<ExprKey, String>,
}

impl<'a> RawTable<'a> {
    pub const fn new(tables: &'a EpilogueTables) -> Self {
        Self {
            shared: &tables.shared,
        }
    }
}

impl ExpressionDecoder for RawTable<'_> {
    type Expr = String;

    fn resolve(&self, key: ExprKey) -> Option<String> {
        self.shared.get(&key).cloned()
    }

    fn references(&self, key: ExprKey) -> Vec<ExprKey> {
        let Some(text) = self.shared.get(&key) else {
            return Vec::new();
        };
        let mut tokens = text
            .split(|c: char| c.is_whitespace() || "[](),".contains(c))
            .filter(|tok| !tok.is_empty());
        let tag = tokens.next().unwrap_or_default();
        if LEAF_TAGS.contains(&tag) {
            return Vec::new();
        }
        let skip = usize::from(tag == EVAR_TAG);
        tokens
            .filter_map(|tok| tok.parse().ok())
            .skip(skip)
            .filter(|child| self.shared.contains_key(child))
            .collect()
    }

    fn keys(&self) -> Vec<ExprKey> {
        let mut keys: Vec<ExprKey> = self.shared.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

/// Fail with [`Error::SelfReference`] on the first key that mentions itself.
pub fn check_no_self_reference<D: ExpressionDecoder>(decoder: &D) -> Result<()> {
    for key in decoder.keys() {
        if decoder.references(key).contains(&key) {
            return Err(Error::SelfReference { key });
        }
    }
    Ok(())
}

/// A goal with its context and conclusion resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalView<E> {
    /// Hypotheses in context order, with their resolved types.
    pub context: Vec<(String, Option<E>)>,
    pub conclusion: Option<E>,
}

/// Resolve a snapshot's hypothesis types and conclusion through `decoder`.
pub fn resolve_goal<D: ExpressionDecoder>(
    decoder: &D,
    tables: &EpilogueTables,
    snapshot: &GoalSnapshot,
) -> GoalView<D::Expr> {
    let context = snapshot
        .context_identifiers
        .iter()
        .map(|ident| {
            let typ = tables.type_key(ident).and_then(|key| decoder.resolve(key));
            (ident.clone(), typ)
        })
        .collect();
    let conclusion = if snapshot.is_solved() {
        None
    } else {
        decoder.resolve(snapshot.conclusion_key)
    };
    GoalView {
        context,
        conclusion,
    }
}
