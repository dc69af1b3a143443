//! Compiles GraphQL operations and globally-named fragments, scattered across
//! many files, into one minimal validated query per file.
//!
//! A pass runs in stages:
//!
//! 1. Every document is checked against the rules that don't depend on
//!    fragments from other files. A failing document is dropped whole.
//! 2. Surviving definitions go into one table keyed by name. Fragments that
//!    share a name but not a body are removed.
//! 3. Each operation's transitive fragment dependencies are resolved, with
//!    per-fragment results cached for the rest of the pass.
//! 4. The operation and exactly the fragments it needs are assembled and
//!    validated against the full schema.
//! 5. The printed result is recorded under the operation's file path.
//!
//! Failures never stop the pass. Each one becomes a [`CompileError`] handed
//! to the caller's [`ErrorSink`], with a location in the original file.
//!
//! A schema validation failure inside a fragment is reported against the
//! fragment's file and position. The operation that pulled the fragment in
//! is named in the error context (`operationName`, `operationPath`).
//!
//! When one file holds more than one operation, every operation after the
//! first is reported as it comes up. The first is still resolved and
//! validated, so its own errors appear, but the file gets no compiled query.
//!
//! ```ignore
//! let compiler = QueryCompiler::new(&schema);
//! let mut errors = Vec::new();
//! let output = compiler.compile(&documents, &mut errors);
//! ```

mod assemble;
mod collect;
mod error;
mod location;
mod options;
mod record;
mod resolve;
mod source;
mod structural;

pub use error::{CompileError, CompileErrorKind, ErrorSink, FragmentSide};
pub use location::{
    ErrorLocation, ExtractionOffset, ExtractionOffsetTranslator, LineColumn, LineIndex,
    LocationTranslator,
};
pub use options::{CompilerOptions, DEFAULT_STATIC_QUERY_PREFIX};
pub use record::{static_query_id, CompiledQuery};
pub use source::{OperationFlags, SourceDocument, SyntaxError};

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use assemble::MinimalDocument;
use collect::{operation_location, OperationDef};
use location::locate;
use resolve::{closest_fragment, ResolveFailure, Resolver};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Counts from one compile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub documents: usize,
    pub rejected_documents: usize,
    pub operations: usize,
    pub compiled: usize,
    pub fragments: usize,
}

/// Result of one compile pass.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Compiled queries by file path. A file without an entry produced errors
    /// or held no operation.
    pub queries: BTreeMap<Arc<str>, CompiledQuery>,
    pub stats: CompileStats,
}

/// Which operation claims each file. A file claimed by more than one
/// operation is contested and produces no compiled query.
struct FileClaims<'o> {
    first: HashMap<&'o Arc<str>, usize>,
    contested: HashSet<&'o Arc<str>>,
}

impl<'o> FileClaims<'o> {
    fn new(operations: &'o [OperationDef<'_>]) -> Self {
        let mut first = HashMap::new();
        let mut contested = HashSet::new();
        for (index, operation) in operations.iter().enumerate() {
            let path = operation.document.path();
            if first.contains_key(path) {
                contested.insert(path);
            } else {
                first.insert(path, index);
            }
        }
        Self { first, contested }
    }

    /// Index of the operation that claimed `path` before operation `index`.
    fn earlier_claim(&self, path: &Arc<str>, index: usize) -> Option<usize> {
        self.first.get(path).copied().filter(|&first| first != index)
    }

    fn is_contested(&self, path: &Arc<str>) -> bool {
        self.contested.contains(path)
    }
}

pub struct QueryCompiler<'s> {
    schema: &'s Valid<Schema>,
    options: CompilerOptions,
    translator: Box<dyn LocationTranslator + 's>,
}

impl<'s> QueryCompiler<'s> {
    #[must_use]
    pub fn new(schema: &'s Valid<Schema>) -> Self {
        Self {
            schema,
            options: CompilerOptions::default(),
            translator: Box::new(ExtractionOffsetTranslator),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the default offset-based location translation.
    #[must_use]
    pub fn with_translator(mut self, translator: impl LocationTranslator + 's) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Run one compile pass over `documents`, in the given order.
    ///
    /// Document order decides which of two identical fragments is reported as
    /// the definition, and which operation in a file is reported as the first.
    #[tracing::instrument(skip_all, fields(documents = documents.len()))]
    pub fn compile(&self, documents: &[SourceDocument], sink: &mut dyn ErrorSink) -> CompileOutput {
        let translator = self.translator.as_ref();
        let mut stats = CompileStats {
            documents: documents.len(),
            ..CompileStats::default()
        };

        let accepted: Vec<&SourceDocument> = documents
            .iter()
            .filter(|document| self.check_structure(document, sink))
            .collect();
        stats.rejected_documents = documents.len() - accepted.len();

        let collected = collect::collect(accepted, translator, sink);
        stats.operations = collected.operations.len();
        stats.fragments = collected.table.len();

        let claims = FileClaims::new(&collected.operations);

        let known: Vec<&str> = collected.table.names().collect();
        let mut resolver = Resolver::new(&collected.table);
        let mut queries = BTreeMap::new();

        for (index, operation) in collected.operations.iter().enumerate() {
            let path = operation.document.path();
            if let Some(first) = claims.earlier_claim(path, index) {
                sink.report(self.multiple_roots_error(operation, &collected.operations[first]));
                continue;
            }

            let names = match resolver.resolve_operation(operation) {
                Ok(names) => names,
                Err(failures) => {
                    tracing::warn!(
                        operation = %operation.name(),
                        path = %path,
                        failures = failures.len(),
                        "operation has unresolved fragments"
                    );
                    for failure in failures {
                        sink.report(self.resolve_error(operation, failure, &known));
                    }
                    continue;
                }
            };

            let fragments = names
                .iter()
                .filter_map(|name| collected.table.get(name))
                .collect();
            let minimal = MinimalDocument::new(*operation, fragments);
            if !minimal.validate(self.schema, translator, sink) {
                continue;
            }

            if claims.is_contested(path) {
                tracing::trace!(path = %path, "valid operation in contested file not recorded");
                continue;
            }

            tracing::trace!(operation = %operation.name(), path = %path, "compiled");
            let query = CompiledQuery::new(operation, minimal.print(), &self.options);
            queries.insert(Arc::clone(path), query);
        }

        stats.compiled = queries.len();
        tracing::debug!(
            documents = stats.documents,
            rejected = stats.rejected_documents,
            operations = stats.operations,
            fragments = stats.fragments,
            resolved = resolver.cached(),
            compiled = stats.compiled,
            "compile pass finished"
        );

        CompileOutput { queries, stats }
    }

    /// Run the fragment-independent rules. Reports and returns `false` when
    /// the document has to be dropped.
    fn check_structure(&self, document: &SourceDocument, sink: &mut dyn ErrorSink) -> bool {
        let violations = structural::validate_document(self.schema, document.ast());
        if violations.is_empty() {
            return true;
        }

        tracing::warn!(
            path = %document.path(),
            violations = violations.len(),
            "document rejected"
        );
        for violation in violations {
            let start = locate(self.translator.as_ref(), document, violation.offset);
            sink.report(CompileError::new(
                CompileErrorKind::StructuralValidation {
                    message: violation.message,
                },
                Arc::clone(document.path()),
                start.map(|start| ErrorLocation::Start { start }),
            ));
        }
        false
    }

    fn multiple_roots_error(
        &self,
        operation: &OperationDef<'_>,
        first: &OperationDef<'_>,
    ) -> CompileError {
        let translator = self.translator.as_ref();
        let path = operation.document.path();
        tracing::warn!(path = %path, "multiple operations in one file");
        CompileError::new(
            CompileErrorKind::MultipleRootOperations {
                name: operation.name(),
                other_name: first.name(),
                other_location: operation_location(first, translator),
            },
            Arc::clone(path),
            operation_location(operation, translator).map(ErrorLocation::At),
        )
    }

    fn resolve_error(
        &self,
        operation: &OperationDef<'_>,
        failure: ResolveFailure<'_>,
        known: &[&str],
    ) -> CompileError {
        let translator = self.translator.as_ref();
        match failure {
            ResolveFailure::Missing {
                fragment_name,
                document,
                offset,
            } => CompileError::new(
                CompileErrorKind::UnknownFragment {
                    fragment_name: Arc::from(fragment_name),
                    closest_fragment: closest_fragment(fragment_name, known.iter().copied())
                        .map(Arc::from),
                    operation_name: operation.name(),
                    operation_path: Arc::clone(operation.document.path()),
                },
                Arc::clone(document.path()),
                locate(translator, document, offset).map(ErrorLocation::At),
            ),
            ResolveFailure::Cycle {
                fragment_name,
                via,
                document,
                offset,
            } => CompileError::new(
                CompileErrorKind::FragmentCycle {
                    fragment_name: Arc::from(fragment_name),
                    cycle: via.into_iter().map(Arc::from).collect(),
                },
                Arc::clone(document.path()),
                locate(translator, document, offset).map(ErrorLocation::At),
            ),
        }
    }
}
