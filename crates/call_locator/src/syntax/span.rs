use std::fmt;

use proc_macro2::LineColumn;
use syn::spanned::Spanned;

/// A location in a source file.
///
/// Lines are 1-based; columns are 0-based and count chars, matching
/// [`proc_macro2::LineColumn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<LineColumn> for Position {
    fn from(lc: LineColumn) -> Self {
        Self {
            line: lc.line,
            column: lc.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end of a node. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Span of any syn node. Only meaningful on the thread that parsed the
    /// node: the `proc-macro2` source map is thread-local.
    pub fn of<T: Spanned>(node: &T) -> Self {
        Self::from(node.span())
    }

    pub fn covers_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    /// Neither span overlaps the other.
    pub fn is_disjoint(&self, other: &Span) -> bool {
        self.end <= other.start || other.end <= self.start
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<proc_macro2::Span> for Span {
    fn from(span: proc_macro2::Span) -> Self {
        Self {
            start: span.start().into(),
            end: span.end().into(),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
