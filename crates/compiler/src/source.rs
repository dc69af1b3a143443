//! Parsed input documents.

use crate::location::{ExtractionOffset, LineColumn, LineIndex};
use apollo_compiler::ast;
use std::sync::Arc;

/// Flags the caller attaches to the operations of a document.
///
/// These are opaque to the compiler: they are carried through to the
/// [`CompiledQuery`](crate::CompiledQuery) untouched, except for
/// `is_static_query`, which also requests a path-derived identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationFlags {
    /// The operation comes from a component hook (`useStaticQuery`-style).
    pub is_hook: bool,
    /// The operation needs a stable identifier derived from its file path.
    pub is_static_query: bool,
    /// Caller-supplied identity hash, usually of the original text.
    pub hash: Option<Arc<str>>,
}

/// A syntactically invalid document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {}", .messages.join("; "))]
pub struct SyntaxError {
    pub path: Arc<str>,
    pub messages: Vec<String>,
}

/// One parsed GraphQL document, keyed by the file it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: Arc<str>,
    text: Arc<str>,
    original_text: Arc<str>,
    ast: ast::Document,
    line_index: LineIndex,
    offset: ExtractionOffset,
    flags: OperationFlags,
}

impl SourceDocument {
    /// Parse GraphQL text into a document.
    pub fn parse(path: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Result<Self, SyntaxError> {
        let path = path.into();
        let text = text.into();

        match ast::Document::parse(text.as_ref(), path.as_ref()) {
            Ok(ast) => Ok(Self::from_ast(path, text, ast)),
            Err(with_errors) => Err(SyntaxError {
                path,
                messages: with_errors
                    .errors
                    .iter()
                    .map(|diagnostic| diagnostic.error.to_string())
                    .collect(),
            }),
        }
    }

    /// Wrap an AST that was parsed elsewhere. `text` must be the exact text
    /// the AST was parsed from, since node locations are byte offsets into it.
    #[must_use]
    pub fn from_ast(path: impl Into<Arc<str>>, text: impl Into<Arc<str>>, ast: ast::Document) -> Self {
        let text = text.into();
        Self {
            path: path.into(),
            line_index: LineIndex::new(&text),
            original_text: Arc::clone(&text),
            text,
            ast,
            offset: ExtractionOffset::default(),
            flags: OperationFlags::default(),
        }
    }

    /// Position of the GraphQL text inside its host file.
    #[must_use]
    pub fn with_offset(mut self, offset: ExtractionOffset) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: OperationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Override the text reported as `originalText`, e.g. the full template
    /// literal the GraphQL was extracted from.
    #[must_use]
    pub fn with_original_text(mut self, original_text: impl Into<Arc<str>>) -> Self {
        self.original_text = original_text.into();
        self
    }

    #[must_use]
    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn original_text(&self) -> &Arc<str> {
        &self.original_text
    }

    #[must_use]
    pub const fn ast(&self) -> &ast::Document {
        &self.ast
    }

    #[must_use]
    pub const fn offset(&self) -> ExtractionOffset {
        self.offset
    }

    #[must_use]
    pub const fn flags(&self) -> &OperationFlags {
        &self.flags
    }

    /// Position of a byte offset inside this document's GraphQL text.
    #[must_use]
    pub fn position(&self, offset: usize) -> LineColumn {
        self.line_index.line_column(offset)
    }
}

/// Byte offset where an AST node starts.
pub(crate) fn node_offset<T>(node: &apollo_compiler::Node<T>) -> Option<usize> {
    node.location().map(|loc| loc.offset())
}

/// Byte offset where a name starts.
pub(crate) fn name_offset(name: &apollo_compiler::Name) -> Option<usize> {
    name.location().map(|loc| loc.offset())
}
