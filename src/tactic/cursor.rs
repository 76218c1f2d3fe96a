//! Single-lookahead cursor over a lemma's declarations.

use std::{iter::Peekable, vec};

use crate::{
    error::{Error, Result},
    lex::Declaration,
};

/// Forward-only cursor handing out owned declarations.
///
/// Exactly one cursor exists per lemma; the recursive descent borrows it
/// mutably at every level, so a nested body leaves it positioned at the
/// declaration that closed the body.
#[derive(Debug)]
pub struct DeclCursor {
    items: Peekable<vec::IntoIter<Declaration>>,
    consumed: usize,
    last_line: Option<usize>,
}

impl DeclCursor {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self {
            items: declarations.into_iter().peekable(),
            consumed: 0,
            last_line: None,
        }
    }

    pub fn peek(&mut self) -> Option<&Declaration> {
        self.items.peek()
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.items.peek().is_none()
    }

    /// Declarations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Consume the next declaration, which the grammar requires to exist.
    pub fn expect(&mut self, what: &str) -> Result<Declaration> {
        match self.items.next() {
            Some(decl) => {
                self.consumed += 1;
                self.last_line = Some(decl.line);
                Ok(decl)
            }
            None => Err(Error::shape(
                format!("declarations ended while expecting {what}"),
                self.last_line.map(|line| format!("trace line {line}")),
            )),
        }
    }

    /// Consume exactly `count` declarations.
    pub fn take(&mut self, count: usize, what: &str) -> Result<Vec<Declaration>> {
        (0..count).map(|_| self.expect(what)).collect()
    }

    /// Whether the next declaration's tactic name starts with `prefix`.
    pub fn next_starts_with(&mut self, prefix: &str) -> bool {
        self.items
            .peek()
            .is_some_and(|decl| decl.tactic_name.starts_with(prefix))
    }
}
