//! Loading a configured project from disk: config, schema and documents.

use anyhow::{Context, Result};
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_config::{
    expand_braces, find_config, load_config, GraphQLConfig, ProjectConfig, QueryCompilerConfig,
};
use graphql_query_compiler::{CompilerOptions, OperationFlags, SourceDocument, SyntaxError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Loaded config and the directory its relative paths resolve against.
pub struct CommandContext {
    pub config: GraphQLConfig,
    pub base_dir: PathBuf,
}

impl CommandContext {
    /// Load the config at `config_path`, or the nearest one above the
    /// current directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(path) = config_path {
            path.to_path_buf()
        } else {
            let current_dir = std::env::current_dir()?;
            find_config(&current_dir)
                .context("Failed to search for config")?
                .context("No GraphQL config file found")?
        };

        let config = load_config(&config_path).context("Failed to load config")?;

        let base_dir = config_path
            .parent()
            .context("Failed to get config directory")?;
        // An empty parent means the config sits in the current directory.
        let base_dir = if base_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            base_dir
        };
        let base_dir = base_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", base_dir.display()))?;

        Ok(Self { config, base_dir })
    }

    /// The selected project. `--project` may be omitted for single-project
    /// configs and for multi-project configs with a "default" project.
    pub fn project(&self, requested: Option<&str>) -> Result<&ProjectConfig> {
        let name = requested.unwrap_or("default");
        self.config.get_project(name).with_context(|| {
            let available: Vec<&str> = self.config.projects().map(|(name, _)| name).collect();
            if requested.is_none() && self.config.is_multi_project() {
                format!(
                    "Multi-project configuration requires --project (available: {})",
                    available.join(", ")
                )
            } else {
                format!(
                    "Project '{name}' not found (available: {})",
                    available.join(", ")
                )
            }
        })
    }
}

/// Parse and validate every schema file of `project`.
#[tracing::instrument(skip_all, fields(base_dir = %base_dir.display()))]
pub fn load_schema(project: &ProjectConfig, base_dir: &Path) -> Result<Valid<Schema>> {
    let files = expand_patterns(&project.schema.paths(), base_dir)?;
    if files.is_empty() {
        anyhow::bail!("No schema files found matching configured patterns");
    }

    let mut builder = Schema::builder();
    for path in &files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Adding schema file");
        builder = builder.parse(text, path);
    }

    let schema = builder
        .build()
        .map_err(|with_errors| anyhow::anyhow!("{}", with_errors.errors))
        .context("Failed to build schema")?;
    let schema = schema
        .validate()
        .map_err(|with_errors| anyhow::anyhow!("{}", with_errors.errors))
        .context("Schema is invalid")?;

    tracing::info!(
        files = files.len(),
        types = schema.types.len(),
        "Schema loaded"
    );
    Ok(schema)
}

/// Document files of `project`, sorted, minus excluded files and anything
/// under `node_modules`.
pub fn discover_documents(project: &ProjectConfig, base_dir: &Path) -> Result<Vec<PathBuf>> {
    let patterns = project
        .documents
        .as_ref()
        .map(graphql_config::DocumentsConfig::patterns)
        .unwrap_or_default();

    let files = expand_patterns(&patterns, base_dir)?
        .into_iter()
        .filter(|path| {
            relative_path(path, base_dir).is_some_and(|rel| project.includes_document(&rel))
        })
        .collect::<Vec<_>>();

    tracing::debug!(documents = files.len(), "Discovered document files");
    Ok(files)
}

/// Parsed documents plus the files that failed to parse.
#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<SourceDocument>,
    pub syntax_errors: Vec<SyntaxError>,
}

/// Read and parse each file. Operations in files matching
/// `staticQueries` are flagged as static queries.
pub fn load_documents(
    paths: &[PathBuf],
    base_dir: &Path,
    settings: &QueryCompilerConfig,
) -> Result<LoadedDocuments> {
    let mut loaded = LoadedDocuments::default();

    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let is_static_query = relative_path(path, base_dir)
            .is_some_and(|rel| settings.is_static_query(&rel));

        match SourceDocument::parse(path.display().to_string(), text) {
            Ok(document) => loaded.documents.push(document.with_flags(OperationFlags {
                is_static_query,
                ..OperationFlags::default()
            })),
            Err(error) => {
                tracing::warn!(path = %path.display(), "Document has syntax errors");
                loaded.syntax_errors.push(error);
            }
        }
    }

    Ok(loaded)
}

/// Compiler options from the config, with `--project-root` taking precedence.
pub fn compiler_options(
    settings: &QueryCompilerConfig,
    base_dir: &Path,
    project_root: Option<&Path>,
) -> CompilerOptions {
    let root = project_root.map_or_else(
        || settings.resolved_project_root(base_dir),
        |root| base_dir.join(root),
    );
    let options = CompilerOptions::default().with_project_root(root);
    match &settings.static_query_prefix {
        Some(prefix) => options.with_static_query_prefix(prefix.clone()),
        None => options,
    }
}

fn expand_patterns(patterns: &[&str], base_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        for expanded in expand_braces(pattern) {
            let full_pattern = base_dir.join(&expanded).display().to_string();

            for entry in glob::glob(&full_pattern)
                .with_context(|| format!("Invalid glob pattern: {full_pattern}"))?
            {
                let path = entry.context("Glob error")?;
                if !path.is_file() || path.components().any(|c| c.as_os_str() == "node_modules") {
                    continue;
                }
                files.insert(path);
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// `path` relative to `base_dir`, with forward slashes.
fn relative_path(path: &Path, base_dir: &Path) -> Option<String> {
    let rel = path.strip_prefix(base_dir).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_config::{DocumentsConfig, SchemaConfig};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn project_config(documents: &str, exclude: Option<Vec<String>>) -> ProjectConfig {
        ProjectConfig {
            schema: SchemaConfig::Path("schema/*.graphql".to_string()),
            documents: Some(DocumentsConfig::Pattern(documents.to_string())),
            exclude,
            extensions: None,
        }
    }

    #[test]
    fn test_load_schema_merges_files() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "schema/query.graphql", "type Query { post: Post }");
        write(temp_dir.path(), "schema/post.graphql", "type Post { id: ID! }");

        let schema = load_schema(&project_config("**/*.graphql", None), temp_dir.path()).unwrap();
        assert!(schema.types.contains_key("Post"));
        assert!(schema.types.contains_key("Query"));
    }

    #[test]
    fn test_load_schema_without_files_fails() {
        let temp_dir = TempDir::new().unwrap();
        let error = load_schema(&project_config("**/*.graphql", None), temp_dir.path())
            .unwrap_err();
        assert!(error.to_string().contains("No schema files found"));
    }

    #[test]
    fn test_load_schema_rejects_invalid_schema() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "schema/schema.graphql", "type Query { post: Missing }");

        let result = load_schema(&project_config("**/*.graphql", None), temp_dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_documents_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        write(base, "src/pages/b.graphql", "{ post { id } }");
        write(base, "src/pages/a.gql", "{ post { id } }");
        write(base, "src/generated/types.graphql", "{ post { id } }");
        write(base, "src/node_modules/dep/x.graphql", "{ post { id } }");

        let project = project_config(
            "src/**/*.{graphql,gql}",
            Some(vec!["src/generated/**".to_string()]),
        );
        let found = discover_documents(&project, base).unwrap();
        let rel: Vec<String> = found
            .iter()
            .filter_map(|path| relative_path(path, base))
            .collect();
        assert_eq!(rel, vec!["src/pages/a.gql", "src/pages/b.graphql"]);
    }

    #[test]
    fn test_load_documents_flags_static_queries_and_collects_syntax_errors() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let page = write(base, "src/pages/index.graphql", "query Page { post { id } }");
        let header = write(base, "src/components/header.graphql", "query Header { post { id } }");
        let broken = write(base, "src/components/broken.graphql", "query {");

        let settings = QueryCompilerConfig {
            static_queries: vec!["src/components/**".to_string()],
            ..QueryCompilerConfig::default()
        };
        let loaded = load_documents(&[page, header, broken], base, &settings).unwrap();

        let flags: Vec<bool> = loaded
            .documents
            .iter()
            .map(|document| document.flags().is_static_query)
            .collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(loaded.syntax_errors.len(), 1);
        assert!(loaded.syntax_errors[0].path.ends_with("broken.graphql"));
    }

    #[test]
    fn test_compiler_options_prefer_cli_root() {
        let settings = QueryCompilerConfig {
            project_root: Some(PathBuf::from("site")),
            static_query_prefix: Some("static-".to_string()),
            ..QueryCompilerConfig::default()
        };
        let base = Path::new("/work");

        let from_config = compiler_options(&settings, base, None);
        assert_eq!(from_config.project_root, Some(PathBuf::from("/work/site")));
        assert_eq!(from_config.static_query_prefix, "static-");

        let from_cli = compiler_options(&settings, base, Some(Path::new("/elsewhere")));
        assert_eq!(from_cli.project_root, Some(PathBuf::from("/elsewhere")));
    }

    #[test]
    fn test_multi_project_requires_selection() {
        let mut projects = std::collections::BTreeMap::new();
        projects.insert("site".to_string(), project_config("**/*.graphql", None));
        let ctx = CommandContext {
            config: GraphQLConfig::Multi { projects },
            base_dir: PathBuf::from("/work"),
        };

        let error = ctx.project(None).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Multi-project configuration requires --project (available: site)"
        );
        assert!(ctx.project(Some("site")).is_ok());
    }
}
