//! Output records.

use crate::collect::OperationDef;
use crate::options::CompilerOptions;
use heck::ToKebabCase;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// One compiled operation, keyed by the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
    /// Operation name, empty for an anonymous operation.
    pub name: Arc<str>,
    /// The operation and every fragment it needs, printed.
    pub text: String,
    pub original_text: Arc<str>,
    pub path: Arc<str>,
    pub is_hook: bool,
    pub is_static_query: bool,
    pub hash: Option<Arc<str>>,
    /// Stable identifier, only for static queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CompiledQuery {
    pub(crate) fn new(operation: &OperationDef<'_>, text: String, options: &CompilerOptions) -> Self {
        let document = operation.document;
        let flags = document.flags();
        let path = Arc::clone(document.path());

        Self {
            name: operation.name(),
            text,
            original_text: Arc::clone(document.original_text()),
            id: flags
                .is_static_query
                .then(|| static_query_id(&path, options)),
            path,
            is_hook: flags.is_hook,
            is_static_query: flags.is_static_query,
            hash: flags.hash.clone(),
        }
    }
}

/// Identifier for a static query in `path`: the configured prefix followed by
/// the kebab-cased path relative to the project root.
///
/// Path separators and punctuation become word breaks, so
/// `src/components/Header.js` yields `src-components-header-js`.
#[must_use]
pub fn static_query_id(path: &str, options: &CompilerOptions) -> String {
    let path = Path::new(path);
    let relative = options
        .project_root
        .as_deref()
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);

    format!(
        "{}{}",
        options.static_query_prefix,
        relative.to_string_lossy().to_kebab_case()
    )
}
