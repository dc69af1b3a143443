use crate::exit_code::{ExitCode, Failure, OrExit};
use crate::project::{self, CommandContext};
use crate::OutputFormat;
use colored::Colorize;
use graphql_query_compiler::{CompileError, CompileOutput, QueryCompiler, SyntaxError};
use std::path::{Path, PathBuf};

/// Inputs of one `graphql-compile` run.
#[derive(Debug, Clone)]
pub struct CompileArgs {
    pub config: Option<PathBuf>,
    pub project: Option<String>,
    pub project_root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Run one compile pass and report the result. Returns the exit code.
pub fn run(args: &CompileArgs) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(failure) => {
            match args.format {
                OutputFormat::Human => {
                    eprintln!("{} {:#}", "✗".red().bold(), failure.error);
                }
                OutputFormat::Json => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!("{:#}", failure.error),
                            "exitCode": failure.code.code(),
                        })
                    );
                }
            }
            failure.code
        }
    }
}

#[tracing::instrument(skip_all, fields(project = ?args.project))]
fn execute(args: &CompileArgs) -> Result<ExitCode, Failure> {
    let start_time = std::time::Instant::now();

    let ctx = CommandContext::load(args.config.as_deref()).or_exit(ExitCode::ConfigError)?;
    let project_config = ctx
        .project(args.project.as_deref())
        .or_exit(ExitCode::ConfigError)?;
    let settings = project_config
        .query_compiler()
        .or_exit(ExitCode::ConfigError)?;

    let schema = project::load_schema(project_config, &ctx.base_dir).or_exit(ExitCode::SchemaError)?;

    let paths =
        project::discover_documents(project_config, &ctx.base_dir).or_exit(ExitCode::IoError)?;
    let loaded =
        project::load_documents(&paths, &ctx.base_dir, &settings).or_exit(ExitCode::IoError)?;

    let options =
        project::compiler_options(&settings, &ctx.base_dir, args.project_root.as_deref());
    let compiler = QueryCompiler::new(&schema).with_options(options);

    let mut error_count = 0;
    let output = compiler.compile(&loaded.documents, &mut |error: CompileError| {
        error_count += 1;
        print_error(&error, args.format);
    });
    for error in &loaded.syntax_errors {
        print_syntax_error(error, args.format);
    }

    let output_path = args
        .output
        .clone()
        .or_else(|| settings.output.as_ref().map(|path| ctx.base_dir.join(path)));
    if let Some(path) = &output_path {
        write_output(&output, path).or_exit(ExitCode::IoError)?;
    }

    if matches!(args.format, OutputFormat::Human) && !args.quiet {
        print_summary(&output, error_count, &loaded.syntax_errors, output_path.as_deref());
        println!(
            "  {} total: {:.2}s",
            "⏱".dimmed(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(if !loaded.syntax_errors.is_empty() {
        ExitCode::ParseError
    } else if error_count > 0 {
        ExitCode::CompileError
    } else {
        ExitCode::Success
    })
}

fn print_error(error: &CompileError, format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            let position = error
                .location
                .map(|location| format!(":{location}"))
                .unwrap_or_default();
            println!(
                "\n{}{position}: {} {}",
                error.file_path,
                format!("error[{}]:", error.code()).red().bold(),
                error.kind.to_string().red()
            );
        }
        OutputFormat::Json => match serde_json::to_string(error) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize compile error"),
        },
    }
}

fn print_syntax_error(error: &SyntaxError, format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            for message in &error.messages {
                println!(
                    "\n{}: {} {}",
                    error.path,
                    "syntax error:".red().bold(),
                    message.red()
                );
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "kind": "syntax",
                    "filePath": error.path.as_ref(),
                    "context": { "messages": error.messages },
                })
            );
        }
    }
}

fn print_summary(
    output: &CompileOutput,
    error_count: usize,
    syntax_errors: &[SyntaxError],
    output_path: Option<&Path>,
) {
    let stats = output.stats;
    println!();
    if error_count == 0 && syntax_errors.is_empty() {
        println!(
            "{}",
            format!(
                "✓ Compiled {} queries from {} documents",
                stats.compiled, stats.documents
            )
            .green()
            .bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "✗ Found {} error(s), compiled {} of {} operations",
                error_count + syntax_errors.len(),
                stats.compiled,
                stats.operations
            )
            .red()
        );
    }
    if let Some(path) = output_path {
        println!("  {} {}", "→".dimmed(), path.display());
    }
}

/// Write the compiled query map as pretty JSON, keyed by file path.
fn write_output(output: &CompileOutput, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&output.queries)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), queries = output.queries.len(), "Wrote compiled queries");
    Ok(())
}
