//! Building and fully validating the minimal document for one operation.

use crate::collect::{FragmentDef, OperationDef};
use crate::error::{CompileError, CompileErrorKind, ErrorSink};
use crate::location::{ErrorLocation, LineColumn, LocationTranslator};
use crate::source::SourceDocument;
use apollo_compiler::validation::{DiagnosticList, Valid};
use apollo_compiler::{ast, ExecutableDocument, Schema};
use std::sync::Arc;

/// The fragments an operation needs, followed by the operation.
pub(crate) struct MinimalDocument<'t, 'a> {
    operation: OperationDef<'a>,
    fragments: Vec<&'t FragmentDef<'a>>,
}

impl<'t, 'a> MinimalDocument<'t, 'a> {
    pub fn new(operation: OperationDef<'a>, fragments: Vec<&'t FragmentDef<'a>>) -> Self {
        Self {
            operation,
            fragments,
        }
    }

    fn definitions(&self) -> impl Iterator<Item = (&'a SourceDocument, ast::Definition)> + '_ {
        self.fragments
            .iter()
            .map(|fragment| {
                (
                    fragment.document,
                    ast::Definition::FragmentDefinition(fragment.node.clone()),
                )
            })
            .chain(std::iter::once((
                self.operation.document,
                ast::Definition::OperationDefinition(self.operation.node.clone()),
            )))
    }

    /// Printed text of the whole document.
    pub fn print(&self) -> String {
        let mut document = ast::Document::new();
        document.definitions = self.definitions().map(|(_, definition)| definition).collect();
        document.to_string()
    }

    /// Run every standard validation rule against the document. Failures are
    /// reported with positions in the file each failing definition came from.
    ///
    /// Returns whether the document is valid.
    pub fn validate(
        &self,
        schema: &Valid<Schema>,
        translator: &dyn LocationTranslator,
        sink: &mut dyn ErrorSink,
    ) -> bool {
        // One AST document per definition, so each keeps the source file it
        // was parsed from and diagnostics point back into it.
        let parts: Vec<(&SourceDocument, ast::Document)> = self
            .definitions()
            .map(|(source, definition)| {
                let mut part = ast::Document::new();
                part.sources = source.ast().sources.clone();
                part.definitions.push(definition);
                (source, part)
            })
            .collect();

        let mut errors = DiagnosticList::new(Arc::default());
        let mut builder = ExecutableDocument::builder(Some(schema), &mut errors);
        for (_, part) in &parts {
            builder.add_ast_document(part, false);
        }
        let document = builder.build();

        let result = if errors.is_empty() {
            document
                .validate(schema)
                .map(|_| ())
                .map_err(|with_errors| with_errors.errors)
        } else {
            Err(errors)
        };

        let Err(diagnostics) = result else {
            return true;
        };

        let operation_name = self.operation.name();
        for diagnostic in diagnostics.iter() {
            use apollo_compiler::diagnostic::ToCliReport;

            let diagnostic_path = diagnostic.error.location().and_then(|location| {
                diagnostic
                    .sources
                    .get(&location.file_id())
                    .map(|file| file.path().to_string_lossy().into_owned())
            });
            let source = diagnostic_path
                .as_deref()
                .and_then(|path| {
                    parts
                        .iter()
                        .map(|(source, _)| *source)
                        .find(|source| source.path().as_ref() == path)
                })
                .unwrap_or(self.operation.document);

            let location = diagnostic.line_column_range().map(|range| {
                let position = LineColumn::new(range.start.line, range.start.column);
                ErrorLocation::At(translator.translate(source, position))
            });

            tracing::warn!(
                operation = %operation_name,
                path = %source.path(),
                error = %diagnostic.error,
                "operation failed validation"
            );
            sink.report(CompileError::new(
                CompileErrorKind::SchemaValidation {
                    message: diagnostic.error.to_string(),
                    operation_name: Arc::clone(&operation_name),
                    operation_path: Arc::clone(self.operation.document.path()),
                },
                Arc::clone(source.path()),
                location,
            ));
        }
        false
    }
}
