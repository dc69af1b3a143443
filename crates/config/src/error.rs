use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("project '{project}' in {}: {source}", .path.display())]
    Extension {
        path: PathBuf,
        project: String,
        source: ExtensionError,
    },

    #[error("project '{0}' not found in config")]
    ProjectNotFound(String),
}

/// A malformed `extensions.queryCompiler` block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    #[error("extensions.queryCompiler must be an object")]
    NotAnObject,

    #[error(
        "unknown key \"{key}\" in extensions.queryCompiler{}",
        .suggestion.map(|s| format!(", did you mean \"{s}\"?")).unwrap_or_default()
    )]
    UnknownKey {
        key: String,
        suggestion: Option<&'static str>,
    },

    #[error("invalid extensions.queryCompiler: {0}")]
    Malformed(String),
}
