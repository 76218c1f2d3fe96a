//! Fixed tokens of the trace format.
//!
//! ```text
//! Trace    ::= 'bg(pf)' Entry* Epilogue 'en(pf)'
//! Entry    ::= 'bg(spf)' | 'en(spf)' | 'bg(ts)' Header Body 'en(ts)'
//! Epilogue ::= Typs Bods Constrs [PrTyps PrBods PrGls]
//! ```

/// Field separator inside header records.
pub const SEP: &str = "{!}";
/// Divider between hypotheses and goal in verbose bodies.
pub const DIV: &str = "============================";

pub const BEGIN_PROOF: &str = "bg(pf)";
pub const END_PROOF: &str = "en(pf)";
pub const BEGIN_SUBPROOF: &str = "bg(spf)";
pub const END_SUBPROOF: &str = "en(spf)";
pub const BEGIN_TACTIC_STATE: &str = "bg(ts)";
pub const END_TACTIC_STATE: &str = "en(ts)";

pub const MODE_BEFORE: &str = "bf";
pub const MODE_AFTER: &str = "af";
pub const MODE_DEAD: &str = "dead";

/// Header line announcing a solved state (no body follows).
pub const SOLVED_HEADER: &str = "ngs=0";

pub const KIND_NAME: &str = "Name";
pub const KIND_ATOM: &str = "Atom";
pub const KIND_NOTATION: &str = "Not";
pub const KIND_ML: &str = "ML";

pub const TABLE_TYPS: &str = "Typs";
pub const TABLE_BODS: &str = "Bods";
pub const TABLE_CONSTRS: &str = "Constrs";
pub const TABLE_PRTYPS: &str = "PrTyps";
pub const TABLE_PRBODS: &str = "PrBods";
pub const TABLE_PRGLS: &str = "PrGls";

/// Epilogue section names in the order they are written.
pub const TABLES: &[&str] = &[
    TABLE_TYPS,
    TABLE_BODS,
    TABLE_CONSTRS,
    TABLE_PRTYPS,
    TABLE_PRBODS,
    TABLE_PRGLS,
];

/// Whether a line opens or closes one of the bracketed records.
pub fn is_marker(line: &str) -> bool {
    [
        BEGIN_PROOF,
        END_PROOF,
        BEGIN_SUBPROOF,
        END_SUBPROOF,
        BEGIN_TACTIC_STATE,
        END_TACTIC_STATE,
    ]
    .iter()
    .any(|tok| line.starts_with(tok))
}

/// Whether a line starts an epilogue section.
pub fn is_table_header(line: &str) -> bool {
    TABLES.iter().any(|tok| line.starts_with(tok))
}

/// Split a header record on [`SEP`], trimming every field.
pub fn fields(record: &str) -> Vec<&str> {
    record.split(SEP).map(str::trim).collect()
}
