//! Line cursor over trace text.

use std::{fs, io, path::Path};

/// Cursor over the logical lines of a trace.
///
/// Lines are returned with trailing whitespace removed. The cursor only moves
/// forward; the declaration parser owns it exclusively while parsing.
#[derive(Debug, Clone)]
pub struct TraceReader {
    lines: Vec<String>,
    /// Byte offset at which each line ends, used for progress reporting.
    ends: Vec<usize>,
    pos: usize,
}

impl TraceReader {
    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut ends = Vec::new();
        let mut offset = 0;
        for raw in text.split_inclusive('\n') {
            offset += raw.len();
            lines.push(raw.trim_end().to_string());
            ends.push(offset);
        }
        Self {
            lines,
            ends,
            pos: 0,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// The next line without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    /// Consume and return the next line.
    pub fn consume(&mut self) -> Option<String> {
        let line = self.lines.get(self.pos).cloned()?;
        self.pos += 1;
        Some(line)
    }

    /// Consume the current line and peek at the one after it.
    pub fn advance(&mut self) -> Option<&str> {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
        self.peek()
    }

    /// 1-based number of the line [`Self::peek`] would return.
    pub const fn line_number(&self) -> usize {
        self.pos + 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Percentage of the input consumed so far.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        let total = self.ends.last().copied().unwrap_or(0);
        if total == 0 {
            return 100.0;
        }
        let done = match self.pos {
            0 => 0,
            n => self.ends[n.min(self.ends.len()) - 1],
        };
        100.0 * done as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_move() {
        let reader = TraceReader::from_text("a\nb\n");
        assert_eq!(reader.peek(), Some("a"));
        assert_eq!(reader.peek(), Some("a"));
        assert_eq!(reader.line_number(), 1);
    }

    #[test]
    fn consume_and_advance() {
        let mut reader = TraceReader::from_text("a\r\nb  \nc");
        assert_eq!(reader.consume().as_deref(), Some("a"));
        assert_eq!(reader.advance(), Some("c"));
        assert_eq!(reader.line_number(), 3);
        assert_eq!(reader.consume().as_deref(), Some("c"));
        assert!(reader.is_exhausted());
        assert_eq!(reader.consume(), None);
        assert_eq!(reader.advance(), None);
    }

    #[test]
    fn progress_tracks_bytes() {
        let mut reader = TraceReader::from_text("ab\ncd\n");
        assert!(reader.progress().abs() < f64::EPSILON);
        reader.consume();
        assert!((reader.progress() - 50.0).abs() < 1e-9);
        reader.consume();
        assert!((reader.progress() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_exhausted() {
        let reader = TraceReader::from_text("");
        assert!(reader.is_exhausted());
        assert_eq!(reader.peek(), None);
    }
}
