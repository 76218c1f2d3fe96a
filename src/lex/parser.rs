//! Lexing raw trace lines into [`LemmaTrace`]s.

use std::str::FromStr;

use tracing::{debug, info, warn};

use super::{
    decl::{DeclMode, Declaration, ExprKey, GoalId, TacticKind, NO_CONCLUSION, SOLVED},
    tables::EpilogueTables,
    LemmaTrace,
};
use crate::{
    error::{Error, Result},
    trace::{token, TraceReader},
};

/// Fields in a `bg(ts)` record: marker, call id, mode, tactic, kind, location.
const STATE_RECORD_FIELDS: usize = 6;
/// Fields in a live/dead goal header: open goals, full tactic, goal id.
const GOAL_HEADER_FIELDS: usize = 3;

/// Classification of the line under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    BeginProof,
    EndProof,
    BeginSubproof,
    EndSubproof,
    BeginState,
    EndState,
    Table,
    Blank,
    Unknown,
}

impl LineKind {
    fn of(line: &str) -> Self {
        if line.starts_with(token::BEGIN_SUBPROOF) {
            Self::BeginSubproof
        } else if line.starts_with(token::END_SUBPROOF) {
            Self::EndSubproof
        } else if line.starts_with(token::BEGIN_PROOF) {
            Self::BeginProof
        } else if line.starts_with(token::END_PROOF) {
            Self::EndProof
        } else if line.starts_with(token::BEGIN_TACTIC_STATE) {
            Self::BeginState
        } else if line.starts_with(token::END_TACTIC_STATE) {
            Self::EndState
        } else if token::is_table_header(line) {
            Self::Table
        } else if line.trim().is_empty() {
            Self::Blank
        } else {
            Self::Unknown
        }
    }
}

/// State accumulated for one open lemma.
#[derive(Debug)]
struct LemmaContext {
    name: String,
    line: usize,
    declarations: Vec<Declaration>,
    tables: EpilogueTables,
    subproof_depth: usize,
    subproofs: usize,
}

impl LemmaContext {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            declarations: Vec::new(),
            tables: EpilogueTables::default(),
            subproof_depth: 0,
            subproofs: 0,
        }
    }

    fn finish(self) -> LemmaTrace {
        if self.subproof_depth > 0 {
            warn!(
                lemma = %self.name,
                depth = self.subproof_depth,
                "lemma closed with unbalanced sub-proof markers"
            );
        }
        LemmaTrace {
            name: self.name,
            declarations: self.declarations,
            tables: self.tables,
            subproofs: self.subproofs,
            line: self.line,
        }
    }
}

/// Fields of a `bg(ts)` record.
#[derive(Debug)]
struct StateRecord {
    call_id: i64,
    mode: DeclMode,
    after_goal_id: Option<GoalId>,
    tactic_name: String,
    tactic_kind: TacticKind,
    source_location: String,
    line: usize,
}

impl StateRecord {
    fn into_declaration(
        self,
        full_tactic: String,
        goal_id: GoalId,
        num_open_goals: usize,
        context_identifiers: Vec<String>,
        conclusion_key: ExprKey,
    ) -> Declaration {
        Declaration {
            mode: self.mode,
            after_goal_id: self.after_goal_id,
            tactic_name: self.tactic_name,
            tactic_kind: self.tactic_kind,
            full_tactic,
            goal_id,
            num_open_goals,
            call_id: self.call_id,
            source_location: self.source_location,
            context_identifiers,
            conclusion_key,
            line: self.line,
        }
    }
}

/// Parser turning a trace into a sequence of lemmas.
///
/// Every `bg(pf)` opens a fresh lemma context; a nested `bg(pf)` stacks a new
/// context on top of the open one, and `en(pf)` always finishes the innermost.
/// On error, all open contexts are discarded.
#[derive(Debug)]
pub struct TraceParser {
    reader: TraceReader,
    open: Vec<LemmaContext>,
}

impl TraceParser {
    pub const fn new(reader: TraceReader) -> Self {
        Self {
            reader,
            open: Vec::new(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(TraceReader::from_text(text))
    }

    pub const fn reader(&self) -> &TraceReader {
        &self.reader
    }

    /// No input left and no lemma open.
    pub fn is_exhausted(&self) -> bool {
        self.reader.is_exhausted() && self.open.is_empty()
    }

    /// Parse until the next `en(pf)` and return the lemma it closes.
    ///
    /// Returns `Ok(None)` once the input is exhausted outside of any lemma.
    ///
    /// Errors raised inside a lemma are tagged with the innermost lemma name.
    pub fn parse_lemma(&mut self) -> Result<Option<LemmaTrace>> {
        self.parse_until_qed().map_err(|e| {
            let name = self.open.last().map(|ctx| ctx.name.clone());
            self.open.clear();
            match name {
                Some(name) => e.in_lemma(&name),
                None => e,
            }
        })
    }

    /// Parse every remaining lemma, failing on the first error.
    pub fn parse_all(&mut self) -> Result<Vec<LemmaTrace>> {
        let mut lemmas = Vec::new();
        while let Some(lemma) = self.parse_lemma()? {
            lemmas.push(lemma);
        }
        Ok(lemmas)
    }

    /// Skip raw lines until the `bg(pf)` of the lemma called `name`.
    ///
    /// Leaves the cursor on that line and returns whether it was found.
    pub fn seek_lemma(&mut self, name: &str) -> bool {
        self.open.clear();
        while let Some(line) = self.reader.peek() {
            if LineKind::of(line) == LineKind::BeginProof && proof_name(line) == Some(name) {
                info!("progress: {:4.2}% @ {name}", self.reader.progress());
                return true;
            }
            self.reader.consume();
        }
        false
    }

    /// Drop any open lemma and skip to the next `bg(pf)`.
    ///
    /// Callers use this after a failed lemma to continue with the next one.
    pub fn skip_to_next_lemma(&mut self) {
        self.open.clear();
        while let Some(line) = self.reader.peek() {
            if LineKind::of(line) == LineKind::BeginProof {
                return;
            }
            self.reader.consume();
        }
    }

    fn parse_until_qed(&mut self) -> Result<Option<LemmaTrace>> {
        loop {
            let Some(line) = self.reader.peek() else {
                return match self.open.last() {
                    None => Ok(None),
                    Some(ctx) => Err(error_here(
                        &self.reader,
                        format!("end of input inside lemma {}", ctx.name),
                    )),
                };
            };
            debug!("parse_lemma<{line}>");
            let kind = LineKind::of(line);

            match kind {
                LineKind::BeginProof => self.parse_begin_proof()?,
                LineKind::EndProof => {
                    let ctx = self.open.pop().ok_or_else(|| {
                        error_here(&self.reader, "en(pf) without matching bg(pf)")
                    })?;
                    self.reader.consume();
                    return Ok(Some(ctx.finish()));
                }
                LineKind::Blank => {
                    self.reader.consume();
                }
                _ if self.open.is_empty() => {
                    return Err(error_here(&self.reader, "expected bg(pf)"));
                }
                LineKind::BeginSubproof => {
                    self.reader.consume();
                    if let Some(ctx) = self.open.last_mut() {
                        ctx.subproof_depth += 1;
                        ctx.subproofs += 1;
                    }
                }
                LineKind::EndSubproof => {
                    self.reader.consume();
                    if let Some(ctx) = self.open.last_mut() {
                        if ctx.subproof_depth == 0 {
                            warn!(lemma = %ctx.name, "en(spf) without matching bg(spf)");
                        }
                        ctx.subproof_depth = ctx.subproof_depth.saturating_sub(1);
                    }
                }
                LineKind::BeginState => {
                    let Some(ctx) = self.open.last_mut() else {
                        return Err(error_here(&self.reader, "expected bg(pf)"));
                    };
                    let record = parse_state_record(&mut self.reader)?;
                    let decl = parse_declaration(&mut self.reader, &mut ctx.tables, record)?;
                    ctx.declarations.push(decl);
                }
                LineKind::EndState => {
                    self.reader.consume();
                }
                LineKind::Table => {
                    let Some(ctx) = self.open.last_mut() else {
                        return Err(error_here(&self.reader, "expected bg(pf)"));
                    };
                    parse_epilogue(&mut self.reader, &mut ctx.tables)?;
                }
                LineKind::Unknown => {
                    return Err(error_here(&self.reader, "unexpected line"));
                }
            }
        }
    }

    fn parse_begin_proof(&mut self) -> Result<()> {
        let line_no = self.reader.line_number();
        let line = expect_line(&mut self.reader, "bg(pf)")?;
        let name = proof_name(&line)
            .ok_or_else(|| Error::syntax(line_no, &line, "proof header without a lemma name"))?
            .to_string();

        info!("progress: {:4.2}% @ {name}", self.reader.progress());
        if let Some(outer) = self.open.last() {
            debug!("nested proof {name} inside {}", outer.name);
        }
        self.open.push(LemmaContext::new(name, line_no));
        Ok(())
    }
}

/// Lemma name of a `bg(pf)` line: `bg(pf) {!} _ {!} NAME` or `bg(pf) NAME`.
fn proof_name(line: &str) -> Option<&str> {
    let fields = token::fields(line);
    let name = match fields.len() {
        0 | 1 => line.strip_prefix(token::BEGIN_PROOF)?.trim(),
        2 => fields[1],
        _ => fields[2],
    };
    (!name.is_empty()).then_some(name)
}

fn error_here(reader: &TraceReader, reason: impl Into<String>) -> Error {
    Error::syntax(reader.line_number(), reader.peek().unwrap_or_default(), reason)
}

fn expect_line(reader: &mut TraceReader, what: &str) -> Result<String> {
    reader
        .consume()
        .ok_or_else(|| error_here(reader, format!("unexpected end of input, expected {what}")))
}

fn expect_prefix(reader: &mut TraceReader, prefix: &str) -> Result<String> {
    match reader.peek() {
        Some(line) if line.starts_with(prefix) => expect_line(reader, prefix),
        _ => Err(error_here(reader, format!("expected {prefix}"))),
    }
}

fn parse_num<T: FromStr>(field: &str, line: usize, raw: &str, what: &str) -> Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::syntax(line, raw, format!("{what} is not a number: {field:?}")))
}

/// Join physical lines until the record has `want` fields.
///
/// Lines are concatenated without a separator, the way the trace splits them.
fn accumulate(
    reader: &mut TraceReader,
    mut record: String,
    start: usize,
    want: usize,
    what: &str,
) -> Result<String> {
    while token::fields(&record).len() < want {
        match reader.peek() {
            Some(next) if !token::is_marker(next) => {
                record.push_str(next);
                reader.consume();
            }
            Some(_) => {
                return Err(Error::syntax(
                    start,
                    &record,
                    format!("{what} has fewer than {want} fields"),
                ));
            }
            None => {
                return Err(Error::syntax(
                    start,
                    &record,
                    format!("unexpected end of input in {what}"),
                ));
            }
        }
    }
    Ok(record)
}

fn parse_state_record(reader: &mut TraceReader) -> Result<StateRecord> {
    debug!("@parse_state_record:before<{}>", reader.peek().unwrap_or_default());
    let line = reader.line_number();
    let first = expect_line(reader, "bg(ts)")?;
    let record = accumulate(reader, first, line, STATE_RECORD_FIELDS, "tactic state record")?;
    let fields = token::fields(&record);

    let call_id = parse_num(fields[1], line, &record, "call id")?;
    let mode = DeclMode::from_field(fields[2])
        .ok_or_else(|| Error::syntax(line, &record, format!("unknown mode {:?}", fields[2])))?;
    let after_goal_id = fields[2]
        .split_whitespace()
        .nth(1)
        .map(|gid| parse_num(gid, line, &record, "after goal id"))
        .transpose()?;

    Ok(StateRecord {
        call_id,
        mode,
        after_goal_id,
        tactic_name: fields[3].to_string(),
        tactic_kind: TacticKind::from_field(fields[4]),
        source_location: fields[5..].join(token::SEP),
        line,
    })
}

fn parse_declaration(
    reader: &mut TraceReader,
    tables: &mut EpilogueTables,
    record: StateRecord,
) -> Result<Declaration> {
    debug!("@parse_declaration:before<{}>", reader.peek().unwrap_or_default());
    let Some(line) = reader.peek() else {
        return Err(error_here(reader, "unexpected end of input, expected goal header"));
    };

    if line.starts_with(token::SOLVED_HEADER) {
        reader.consume();
        expect_prefix(reader, token::END_TACTIC_STATE)?;
        return Ok(record.into_declaration(String::new(), SOLVED, 0, Vec::new(), NO_CONCLUSION));
    }
    if !line.contains(token::SEP) {
        return Err(error_here(
            reader,
            "expected `ngs=0` or `NGS {!} FULL_TACTIC {!} GOAL_ID`",
        ));
    }

    let start = reader.line_number();
    let first = expect_line(reader, "goal header")?;
    let header = accumulate(reader, first, start, GOAL_HEADER_FIELDS, "goal header")?;
    let fields = token::fields(&header);
    let last = fields.len() - 1;
    let num_open_goals = parse_num(fields[0], start, &header, "number of goals")?;
    let full_tactic = fields[1..last].join(token::SEP);
    let goal_id = parse_num(fields[last], start, &header, "goal id")?;

    let (context_identifiers, conclusion_key) = parse_body(reader, tables)?;
    Ok(record.into_declaration(
        full_tactic,
        goal_id,
        num_open_goals,
        context_identifiers,
        conclusion_key,
    ))
}

fn parse_body(
    reader: &mut TraceReader,
    tables: &mut EpilogueTables,
) -> Result<(Vec<String>, ExprKey)> {
    match reader.peek() {
        Some(line) if line.contains(token::SEP) => parse_compact_body(reader),
        Some(_) => parse_verbose_body(reader, tables),
        None => Err(error_here(reader, "unexpected end of input, expected context")),
    }
}

/// Identifiers as written, most recent last, reversed into context order.
fn parse_identifiers(text: &str) -> Vec<String> {
    let mut idents: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|ident| !ident.is_empty())
        .map(str::to_string)
        .collect();
    idents.reverse();
    idents
}

/// `IDENT, IDENT, ... {!} CONCLUSION_KEY`
fn parse_compact_body(reader: &mut TraceReader) -> Result<(Vec<String>, ExprKey)> {
    let line_no = reader.line_number();
    let line = expect_line(reader, "context")?;
    let fields = token::fields(&line);
    let key = parse_num(fields[fields.len() - 1], line_no, &line, "conclusion key")?;
    Ok((parse_identifiers(fields[0]), key))
}

/// Pretty context, divider, pretty goal, `{!}`, identifiers, divider, key.
///
/// The pretty text is folded into the lemma's mirror tables.
fn parse_verbose_body(
    reader: &mut TraceReader,
    tables: &mut EpilogueTables,
) -> Result<(Vec<String>, ExprKey)> {
    let mut hypotheses = Vec::new();
    while let Some(line) = reader.peek() {
        if line == token::DIV || token::is_marker(line) {
            break;
        }
        let line_no = reader.line_number();
        let line = expect_line(reader, "hypothesis")?;
        let (name, typ) = line
            .split_once(':')
            .ok_or_else(|| Error::syntax(line_no, &line, "expected `name : type`"))?;
        let mut typ = typ.trim().to_string();
        while let Some(next) = reader.peek() {
            if next == token::DIV || next.contains(':') || token::is_marker(next) {
                break;
            }
            typ.push(' ');
            typ.push_str(next.trim());
            reader.consume();
        }
        hypotheses.push((name.trim().to_string(), typ));
    }

    expect_prefix(reader, token::DIV)?;
    let mut goal = expect_line(reader, "goal")?;
    while let Some(next) = reader.peek() {
        if next.starts_with(token::SEP) || token::is_marker(next) {
            break;
        }
        goal.push(' ');
        goal.push_str(next.trim());
        reader.consume();
    }
    expect_prefix(reader, token::SEP)?;
    let idents = expect_line(reader, "context identifiers")?;
    expect_prefix(reader, token::DIV)?;
    let key_line = reader.line_number();
    let key_text = expect_line(reader, "conclusion key")?;
    let key = parse_num(&key_text, key_line, &key_text, "conclusion key")?;

    for (name, typ) in hypotheses {
        tables.pretty_types.entry(name).or_insert(typ);
    }
    tables
        .pretty_goals
        .entry(key)
        .or_insert_with(|| goal.trim().to_string());
    Ok((parse_identifiers(&idents), key))
}

/// Read every epilogue table up to `en(pf)`.
fn parse_epilogue(reader: &mut TraceReader, tables: &mut EpilogueTables) -> Result<()> {
    while let Some(line) = reader.peek() {
        let Some(table) = token::TABLES.iter().copied().find(|t| line.starts_with(t)) else {
            break;
        };
        debug!("@parse_table:{table}");
        reader.consume();

        while let Some(entry) = reader.peek() {
            if token::is_table_header(entry) || token::is_marker(entry) {
                break;
            }
            let line_no = reader.line_number();
            let entry = expect_line(reader, "table entry")?;
            if entry.trim().is_empty() {
                continue;
            }
            insert_entry(tables, table, &entry, line_no)?;
        }
    }
    Ok(())
}

fn insert_entry(tables: &mut EpilogueTables, table: &str, entry: &str, line: usize) -> Result<()> {
    let (key, value) = entry
        .split_once(':')
        .ok_or_else(|| Error::syntax(line, entry, format!("{table} entry without `:`")))?;
    let (key, value) = (key.trim(), value.trim());

    match table {
        token::TABLE_TYPS => {
            let v = parse_num(value, line, entry, "expression key")?;
            tables.ctx_types.insert(key.to_string(), v);
        }
        token::TABLE_BODS => {
            let v = parse_num(value, line, entry, "expression key")?;
            tables.ctx_bodies.insert(key.to_string(), v);
        }
        token::TABLE_CONSTRS => {
            let k = parse_num(key, line, entry, "expression key")?;
            tables.shared.insert(k, value.to_string());
        }
        token::TABLE_PRTYPS => {
            tables.pretty_types.insert(key.to_string(), value.to_string());
        }
        token::TABLE_PRBODS => {
            tables.pretty_bodies.insert(key.to_string(), value.to_string());
        }
        _ => {
            let k = parse_num(key, line, entry, "goal key")?;
            tables.pretty_goals.insert(k, value.to_string());
        }
    }
    Ok(())
}
