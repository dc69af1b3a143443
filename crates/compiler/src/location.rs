//! Source coordinates for diagnostics.
//!
//! GraphQL text handed to the compiler may be a whole `.graphql` file or a
//! block extracted from a host file (a template literal in a component, for
//! example). Every location reported to callers is expressed in host-file
//! coordinates, never in the coordinates of the GraphQL text itself and never
//! in the coordinates of an assembled document.

use crate::source::SourceDocument;
use serde::Serialize;

/// A line/column pair. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for LineColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Location attached to a [`CompileError`](crate::CompileError).
///
/// Serializes either as `{ line, column }` or as `{ start: { line, column } }`.
/// Structural validation failures use the `start` form; everything else is a
/// single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ErrorLocation {
    At(LineColumn),
    Start { start: LineColumn },
}

impl ErrorLocation {
    /// The line/column this location points at.
    #[must_use]
    pub const fn line_column(&self) -> LineColumn {
        match self {
            Self::At(position) | Self::Start { start: position } => *position,
        }
    }
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.line_column().fmt(f)
    }
}

/// Where a GraphQL block begins inside its host file (0-based).
///
/// Zero for pure GraphQL files. The line offset applies to every line of the
/// block; the column offset only to its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtractionOffset {
    pub line: usize,
    pub column: usize,
}

impl ExtractionOffset {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.line == 0 && self.column == 0
    }

    /// Shift a position inside the GraphQL block into host-file coordinates.
    #[must_use]
    pub const fn apply(&self, position: LineColumn) -> LineColumn {
        LineColumn {
            line: position.line + self.line,
            column: if position.line == 1 {
                position.column + self.column
            } else {
                position.column
            },
        }
    }
}

/// Maps a position inside a document's GraphQL text to a position in the
/// file the document came from.
///
/// The default [`ExtractionOffsetTranslator`] shifts by the document's
/// [`ExtractionOffset`]. Callers with their own code-frame machinery can plug
/// in a different implementation through
/// [`QueryCompiler::with_translator`](crate::QueryCompiler::with_translator).
pub trait LocationTranslator {
    fn translate(&self, document: &SourceDocument, position: LineColumn) -> LineColumn;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionOffsetTranslator;

impl LocationTranslator for ExtractionOffsetTranslator {
    fn translate(&self, document: &SourceDocument, position: LineColumn) -> LineColumn {
        document.offset().apply(position)
    }
}

/// Host-file position of a byte offset inside `document`'s GraphQL text.
pub(crate) fn locate(
    translator: &dyn LocationTranslator,
    document: &SourceDocument,
    offset: Option<usize>,
) -> Option<LineColumn> {
    offset.map(|offset| translator.translate(document, document.position(offset)))
}

/// Line index for converting byte offsets to line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Create a new line index from source text
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a 0-based `(line, column)` pair
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));

        let col = offset - self.line_starts[line];
        (line, col)
    }

    /// Convert a byte offset to a 1-based [`LineColumn`]
    #[must_use]
    pub fn line_column(&self, offset: usize) -> LineColumn {
        let (line, col) = self.line_col(offset);
        LineColumn::new(line + 1, col + 1)
    }
}
