use std::path::PathBuf;

/// Prefix of every static-query identifier unless configured otherwise.
pub const DEFAULT_STATIC_QUERY_PREFIX: &str = "sq--";

/// Settings for one [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Static-query identifiers are derived from file paths relative to this
    /// directory. Paths outside it are used as given.
    pub project_root: Option<PathBuf>,
    pub static_query_prefix: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            project_root: None,
            static_query_prefix: DEFAULT_STATIC_QUERY_PREFIX.to_string(),
        }
    }
}

impl CompilerOptions {
    #[must_use]
    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(project_root.into());
        self
    }

    #[must_use]
    pub fn with_static_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_query_prefix = prefix.into();
        self
    }
}
