//! Source location tracking.
//!
//! The compiler processes a single source file per session (§5: "the scanner
//! owns the source text by borrow for the session's lifetime"), so a `Span`
//! only needs byte offsets plus a 1-based line/column — there is no `FileId`
//! to carry.

/// A half-open byte range in the source text, with its starting line/column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0, line: 0, column: 0 };

    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self { start, end, line, column }
    }

    pub fn point(line: u32, column: u32) -> Self {
        Self { start: 0, end: 0, line, column }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
