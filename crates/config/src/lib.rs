//! Discovery and loading of `.graphqlrc` project configuration, including the
//! query compiler's `extensions.queryCompiler` block.

mod config;
mod error;
mod loader;

pub use config::{
    expand_braces, DocumentsConfig, GraphQLConfig, ProjectConfig, QueryCompilerConfig, SchemaConfig,
    QUERY_COMPILER_EXTENSION,
};
pub use error::{ConfigError, ExtensionError, Result};
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILES};
