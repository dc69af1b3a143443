mod compile;
mod exit_code;
mod project;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graphql-compile")]
#[command(
    about = "Compile GraphQL operations and their fragments into one validated query per file",
    long_about = None
)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to GraphQL config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project name (for multi-project configs)
    #[arg(short, long)]
    project: Option<String>,

    /// Base directory for static query ids (overrides `projectRoot`)
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Write the compiled queries as JSON (overrides `output`)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Force colored output even when not a TTY
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long, conflicts_with = "color")]
    no_color: bool,

    /// Suppress the summary; only errors are printed
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// One JSON object per error, for tooling
    Json,
}

fn main() {
    let cli = Cli::parse();

    init_tracing();
    configure_colors(cli.color, cli.no_color);

    let args = compile::CompileArgs {
        config: cli.config,
        project: cli.project,
        project_root: cli.project_root,
        output: cli.output,
        format: cli.format,
        quiet: cli.quiet,
    };
    compile::run(&args).exit()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Configure colored output based on flags and environment variables.
///
/// Priority order (highest to lowest):
/// 1. `--color` / `--no-color`
/// 2. `NO_COLOR` (any value disables colors)
/// 3. `CLICOLOR_FORCE` (non-empty, non-zero forces colors)
/// 4. `CLICOLOR=0` (disables colors)
/// 5. TTY detection in the `colored` crate
fn configure_colors(force_color: bool, no_color: bool) {
    use colored::control;

    if force_color {
        control::set_override(true);
    } else if no_color || std::env::var_os("NO_COLOR").is_some() {
        control::set_override(false);
    } else if let Ok(val) = std::env::var("CLICOLOR_FORCE") {
        if !val.is_empty() && val != "0" {
            control::set_override(true);
        }
    } else if std::env::var("CLICOLOR").is_ok_and(|val| val == "0") {
        control::set_override(false);
    }
}
