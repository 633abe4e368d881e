//! Span information for source locations
//!
//! The source language is line-oriented (no multi-line expressions), so a
//! span only needs to carry a line number and a start/end column within it.

/// A location in the source, used for parse error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column (1-indexed, counted after leading tabs are stripped)
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            line,
            start_column,
            end_column,
        }
    }

    /// Span for an entire line, used when no finer location is available.
    pub fn whole_line(line: usize) -> Self {
        Self {
            line,
            start_column: 1,
            end_column: 1,
        }
    }
}
