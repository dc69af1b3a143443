//! Snapshot formatting for compile errors.
//!
//! Errors are formatted one per line so snapshots stay readable and diffs
//! point at the error that changed.

use graphql_query_compiler::CompileError;

/// Format compile errors as `[n] tag path:line:column message`.
///
/// # Example
///
/// ```ignore
/// use graphql_test_utils::assertions::format_errors;
///
/// let compiled = compile(&[document("page.js", "query Q { ...Missing }")]);
/// insta::assert_snapshot!(format_errors(&compiled.errors), @"...");
/// ```
pub fn format_errors(errors: &[CompileError]) -> String {
    if errors.is_empty() {
        return String::from("(no errors)");
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, error)| {
            let location = error
                .location
                .map(|location| format!(":{location}"))
                .unwrap_or_default();
            format!(
                "[{}] {} {}{location} {}",
                i + 1,
                error.tag(),
                error.file_path,
                error.kind
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format error messages only, without kinds or positions.
pub fn format_error_messages(errors: &[CompileError]) -> String {
    if errors.is_empty() {
        return String::from("(no errors)");
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, error)| format!("[{}] {}", i + 1, error.kind))
        .collect::<Vec<_>>()
        .join("\n")
}
