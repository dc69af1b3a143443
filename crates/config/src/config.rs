use crate::ExtensionError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Key under `extensions` that holds the query compiler's settings.
pub const QUERY_COMPILER_EXTENSION: &str = "queryCompiler";

const QUERY_COMPILER_KEYS: &[&str] = &["projectRoot", "staticQueryPrefix", "output", "staticQueries"];

/// Top-level configuration.
/// Either a single project or multiple named projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphQLConfig {
    /// Multi-project configuration
    Multi {
        projects: BTreeMap<String, ProjectConfig>,
    },
    /// Single project configuration (boxed to reduce enum size)
    Single(Box<ProjectConfig>),
}

impl GraphQLConfig {
    /// All projects, by name. A single-project config yields one project
    /// named "default".
    #[must_use]
    pub fn projects(&self) -> Box<dyn Iterator<Item = (&str, &ProjectConfig)> + '_> {
        match self {
            Self::Single(config) => Box::new(std::iter::once(("default", config.as_ref()))),
            Self::Multi { projects } => Box::new(
                projects
                    .iter()
                    .map(|(name, config)| (name.as_str(), config)),
            ),
        }
    }

    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&ProjectConfig> {
        match self {
            Self::Single(config) if name == "default" => Some(config.as_ref()),
            Self::Single(_) => None,
            Self::Multi { projects } => projects.get(name),
        }
    }

    #[must_use]
    pub const fn is_multi_project(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi { projects } => projects.len(),
        }
    }
}

/// Configuration for a single GraphQL project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Schema file(s)
    pub schema: SchemaConfig,

    /// Document patterns (queries and fragments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentsConfig>,

    /// File patterns to exclude from the document set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    /// Tool-specific extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl ProjectConfig {
    /// Settings from `extensions.queryCompiler`, or defaults when absent.
    ///
    /// ```yaml
    /// extensions:
    ///   queryCompiler:
    ///     projectRoot: .
    ///     staticQueryPrefix: sq--
    ///     output: .cache/queries.json
    ///     staticQueries:
    ///       - src/components/**
    /// ```
    pub fn query_compiler(&self) -> Result<QueryCompilerConfig, ExtensionError> {
        let Some(value) = self
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get(QUERY_COMPILER_EXTENSION))
        else {
            return Ok(QueryCompilerConfig::default());
        };

        let object = value.as_object().ok_or(ExtensionError::NotAnObject)?;
        if let Some(key) = object
            .keys()
            .find(|key| !QUERY_COMPILER_KEYS.contains(&key.as_str()))
        {
            return Err(ExtensionError::UnknownKey {
                key: key.clone(),
                suggestion: closest_key(key),
            });
        }

        serde_json::from_value(value.clone()).map_err(|e| ExtensionError::Malformed(e.to_string()))
    }

    /// Whether `rel_path` matches one of the project's document patterns and
    /// none of its exclude patterns.
    #[must_use]
    pub fn includes_document(&self, rel_path: &str) -> bool {
        if self
            .exclude
            .as_ref()
            .is_some_and(|excludes| matches_any(excludes, rel_path))
        {
            return false;
        }
        self.documents
            .as_ref()
            .is_some_and(|documents| matches_any(&documents.patterns(), rel_path))
    }
}

/// `extensions.queryCompiler`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryCompilerConfig {
    /// Base directory for static-query identifiers, relative to the config
    /// file. Defaults to the config file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_query_prefix: Option<String>,

    /// Where the compiled query map is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Files whose operations are static queries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub static_queries: Vec<String>,
}

impl QueryCompilerConfig {
    /// `project_root` resolved against the directory holding the config file.
    #[must_use]
    pub fn resolved_project_root(&self, config_dir: &Path) -> PathBuf {
        self.project_root
            .as_ref()
            .map_or_else(|| config_dir.to_path_buf(), |root| config_dir.join(root))
    }

    #[must_use]
    pub fn is_static_query(&self, rel_path: &str) -> bool {
        matches_any(&self.static_queries, rel_path)
    }
}

/// Schema source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    /// Single file path or glob pattern
    Path(String),
    /// Multiple file paths or glob patterns
    Paths(Vec<String>),
}

impl SchemaConfig {
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Paths(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// Documents source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentsConfig {
    /// Single pattern
    Pattern(String),
    /// Multiple patterns
    Patterns(Vec<String>),
}

impl DocumentsConfig {
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(pattern) => vec![pattern.as_str()],
            Self::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}

fn closest_key(key: &str) -> Option<&'static str> {
    QUERY_COMPILER_KEYS
        .iter()
        .map(|candidate| (strsim::levenshtein(key, candidate), *candidate))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

fn matches_any<S: AsRef<str>>(patterns: &[S], rel_path: &str) -> bool {
    patterns.iter().any(|pattern| {
        expand_braces(pattern.as_ref()).iter().any(|expanded| {
            glob::Pattern::new(expanded).is_ok_and(|glob_pattern| glob_pattern.matches(rel_path))
        })
    })
}

/// Normalize a glob pattern for consistent matching
///
/// Handles:
/// - Leading "./" prefix (removes it)
/// - Leading "/" prefix (removes it - patterns are relative to the config)
/// - Consecutive slashes (collapses to single slash)
fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.strip_prefix("./").unwrap_or(pattern);
    normalized = normalized.strip_prefix('/').unwrap_or(normalized);

    let mut normalized = normalized.to_string();
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    normalized
}

/// Expand brace patterns like "src/**/*.{graphql,gql}" into separate,
/// normalized patterns. Handles a single brace group.
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let normalized = normalize_pattern(pattern);

    if let (Some(start), Some(end)) = (normalized.find('{'), normalized.find('}')) {
        if start < end {
            let before = &normalized[..start];
            let after = &normalized[end + 1..];
            return normalized[start + 1..end]
                .split(',')
                .map(|option| format!("{before}{}{after}", option.trim()))
                .collect();
        }
    }

    vec![normalized]
}
