//! Byte-offset spans and line/column translation.

use serde::{Deserialize, Serialize};

/// A half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Newline index over a source text, for translating byte offsets into
/// the `line L, column C` form diagnostics use.
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// Byte positions where each line starts
    line_starts: Vec<usize>,
    /// Total source length in bytes
    len: usize,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Get 1-indexed line and column for a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, offset - line_start + 1)
    }

    /// Render an offset as `line L, column C`, or `endfile` for offsets
    /// at or past the end of the source (sentinel positions included).
    pub fn locate(&self, offset: usize) -> String {
        if offset >= self.len {
            return "endfile".to_string();
        }
        let (line, col) = self.line_col(offset);
        format!("line {}, column {}", line, col)
    }
}
