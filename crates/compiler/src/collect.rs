//! Flattening documents into one table of named definitions.

use crate::error::{CompileError, CompileErrorKind, ErrorSink, FragmentSide};
use crate::location::{locate, ErrorLocation, LineColumn, LocationTranslator};
use crate::source::{node_offset, SourceDocument};
use apollo_compiler::{ast, Node};
use std::collections::HashMap;
use std::sync::Arc;

/// An operation, still attached to the document it came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OperationDef<'a> {
    pub document: &'a SourceDocument,
    pub node: &'a Node<ast::OperationDefinition>,
}

impl OperationDef<'_> {
    /// The operation's name, empty for an anonymous operation.
    pub fn name(&self) -> Arc<str> {
        self.node
            .name
            .as_ref()
            .map_or_else(|| Arc::from(""), |name| Arc::from(name.as_str()))
    }

    pub fn offset(&self) -> Option<usize> {
        node_offset(self.node)
    }
}

/// A fragment with its printed text, which decides whether two fragments of
/// the same name are the same fragment.
#[derive(Debug, Clone)]
pub(crate) struct FragmentDef<'a> {
    pub document: &'a SourceDocument,
    pub node: &'a Node<ast::FragmentDefinition>,
    pub text: Arc<str>,
}

impl FragmentDef<'_> {
    fn side(&self, translator: &dyn LocationTranslator) -> FragmentSide {
        FragmentSide {
            file_path: Arc::clone(self.document.path()),
            location: locate(translator, self.document, node_offset(self.node)),
            text: Arc::clone(&self.text),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Definition<'a> {
    Operation(OperationDef<'a>),
    Fragment(FragmentDef<'a>),
}

impl<'a> Definition<'a> {
    fn from_ast(document: &'a SourceDocument, definition: &'a ast::Definition) -> Option<Self> {
        match definition {
            ast::Definition::OperationDefinition(node) => {
                Some(Self::Operation(OperationDef { document, node }))
            }
            ast::Definition::FragmentDefinition(node) => Some(Self::Fragment(FragmentDef {
                document,
                node,
                text: Arc::from(node.serialize().to_string()),
            })),
            _ => None,
        }
    }
}

/// Fragments by name, for one compile pass.
///
/// A name is present only while exactly one body is known for it. Once two
/// different bodies have been seen the name is removed and stays unusable for
/// the rest of the pass.
#[derive(Debug, Default)]
pub(crate) struct DefinitionTable<'a> {
    fragments: HashMap<&'a str, FragmentDef<'a>>,
    order: Vec<&'a str>,
    conflicts: HashMap<&'a str, FragmentDef<'a>>,
}

impl<'a> DefinitionTable<'a> {
    pub fn get(&self, name: &str) -> Option<&FragmentDef<'a>> {
        self.fragments.get(name)
    }

    /// Usable fragment names, in the order they were first seen.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|name| self.fragments.contains_key(name))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    fn insert(
        &mut self,
        fragment: FragmentDef<'a>,
        translator: &dyn LocationTranslator,
        sink: &mut dyn ErrorSink,
    ) {
        let name = fragment.node.name.as_str();

        if let Some(first) = self.conflicts.get(name) {
            if first.text != fragment.text {
                tracing::trace!(fragment = name, "fragment name already conflicted");
                sink.report(duplicate_error(&fragment, first, translator));
            }
            return;
        }

        match self.fragments.get(name) {
            None => {
                self.order.push(name);
                self.fragments.insert(name, fragment);
            }
            Some(existing) if existing.text == fragment.text => {
                tracing::trace!(
                    fragment = name,
                    path = %fragment.document.path(),
                    "identical fragment reused"
                );
            }
            Some(existing) => {
                tracing::warn!(
                    fragment = name,
                    first = %existing.document.path(),
                    second = %fragment.document.path(),
                    "conflicting fragment definitions"
                );
                sink.report(duplicate_error(&fragment, existing, translator));
                if let Some(first) = self.fragments.remove(name) {
                    self.conflicts.insert(name, first);
                }
            }
        }
    }
}

fn duplicate_error(
    fragment: &FragmentDef<'_>,
    other: &FragmentDef<'_>,
    translator: &dyn LocationTranslator,
) -> CompileError {
    let left = fragment.side(translator);
    let location = left.location.map(ErrorLocation::At);
    CompileError::new(
        CompileErrorKind::DuplicateFragment {
            fragment_name: Arc::from(fragment.node.name.as_str()),
            left,
            right: other.side(translator),
        },
        Arc::clone(fragment.document.path()),
        location,
    )
}

/// Everything the resolver needs from the surviving documents.
#[derive(Debug, Default)]
pub(crate) struct Collected<'a> {
    pub table: DefinitionTable<'a>,
    pub operations: Vec<OperationDef<'a>>,
}

/// Collect the definitions of `documents`, in order.
pub(crate) fn collect<'a>(
    documents: impl IntoIterator<Item = &'a SourceDocument>,
    translator: &dyn LocationTranslator,
    sink: &mut dyn ErrorSink,
) -> Collected<'a> {
    let mut collected = Collected::default();

    for document in documents {
        for definition in &document.ast().definitions {
            match Definition::from_ast(document, definition) {
                Some(Definition::Operation(operation)) => collected.operations.push(operation),
                Some(Definition::Fragment(fragment)) => {
                    collected.table.insert(fragment, translator, sink);
                }
                None => {}
            }
        }
    }

    tracing::debug!(
        operations = collected.operations.len(),
        fragments = collected.table.len(),
        "collected definitions"
    );
    collected
}

/// Position of an operation in its host file.
pub(crate) fn operation_location(
    operation: &OperationDef<'_>,
    translator: &dyn LocationTranslator,
) -> Option<LineColumn> {
    locate(translator, operation.document, operation.offset())
}
