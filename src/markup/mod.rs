//! Inline fixture markers and the two coordinate spaces they create.
//!
//! A fixture file is written in *annotated* form, e.g. `val <caret>x = 1`. The
//! system under test only ever sees the *clean* form with every marker removed.
//! [`MarkupFile`] keeps both and translates offsets between them, so failures
//! can be reported at the line and column a human sees in the fixture.

mod file;
mod parser;

#[cfg(test)]
mod tests;

pub use file::{FoundCaret, MarkupFile, ParseErrorInfo};
pub use parser::parse_markers;

use compact_str::CompactString;
use serde::Serialize;
use std::fmt;
use text_size::{TextRange, TextSize};

/// The fixed vocabulary of marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// Where the behavior under test is invoked.
    Caret,
    /// An expected resolve or completion target.
    Ref,
    /// An expected find-usages result.
    Usage,
    /// An expected parse error start.
    ParseError,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 4] = [
        MarkerKind::Caret,
        MarkerKind::Ref,
        MarkerKind::Usage,
        MarkerKind::ParseError,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            MarkerKind::Caret => "caret",
            MarkerKind::Ref => "ref",
            MarkerKind::Usage => "usage",
            MarkerKind::ParseError => "parse-error",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One marker occurrence, positioned in annotated coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupPoint {
    /// Offset of the opening `<` in the annotated text.
    pub position: TextSize,
    /// Length of the marker syntax, delimiters included.
    pub len: TextSize,
    pub kind: MarkerKind,
    pub name: Option<CompactString>,
}

impl MarkupPoint {
    pub fn end(&self) -> TextSize {
        self.position + self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.position, self.len)
    }
}

/// 1-based line and column in the annotated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl LineCol {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Render items the way failure messages list them: `[a, b, c]`.
pub(crate) fn bracketed<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let parts: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
