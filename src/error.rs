use std::{error::Error as StdError, fmt, io, result::Result as StdResult};

/// Where in the trace a syntax error was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLocation {
    /// 1-based physical line number.
    pub line: usize,
    /// Raw text of the offending line (empty at end of input).
    pub text: String,
}

#[derive(Debug)]
pub enum Error {
    /// Malformed header, body or table line.
    TraceSyntax {
        location: TraceLocation,
        reason: String,
    },
    /// No grammar rule matches the current declaration in context.
    TacticShape {
        reason: String,
        declaration: Option<String>,
    },
    /// No unique root, or an edge endpoint without a node.
    GraphIntegrity(String),
    /// A shared-expression key mentions itself.
    SelfReference { key: i64 },
    /// Any of the above, tagged with the lemma it aborted.
    Lemma { name: String, source: Box<Error> },
    Io(io::Error),
    Json(serde_json::Error),
}

impl Error {
    pub(crate) fn syntax(line: usize, text: &str, reason: impl Into<String>) -> Self {
        Self::TraceSyntax {
            location: TraceLocation {
                line,
                text: text.to_string(),
            },
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>, declaration: Option<String>) -> Self {
        Self::TacticShape {
            reason: reason.into(),
            declaration,
        }
    }

    /// Wrap this error with the name of the lemma being reconstructed.
    #[must_use]
    pub fn in_lemma(self, name: &str) -> Self {
        match self {
            already @ Self::Lemma { .. } => already,
            other => Self::Lemma {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through lemma tags.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Lemma { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Line number of a syntax error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self.root_cause() {
            Self::TraceSyntax { location, .. } => Some(location.line),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TraceSyntax { location, reason } => write!(
                f,
                "Trace syntax error at line {}: {reason} (found {:?})",
                location.line, location.text
            ),
            Self::TacticShape {
                reason,
                declaration: Some(decl),
            } => write!(f, "Tactic shape error: {reason} at {decl}"),
            Self::TacticShape {
                reason,
                declaration: None,
            } => write!(f, "Tactic shape error: {reason}"),
            Self::GraphIntegrity(msg) => write!(f, "Graph integrity error: {msg}"),
            Self::SelfReference { key } => {
                write!(f, "Shared expression {key} references itself")
            }
            Self::Lemma { name, source } => write!(f, "In lemma {name}: {source}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Lemma { source, .. } => Some(source.as_ref()),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

pub type Result<T> = StdResult<T, Error>;
