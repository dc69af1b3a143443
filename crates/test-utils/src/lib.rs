//! Shared helpers for the query compiler's tests and benchmarks.

pub mod assertions;
pub mod fixtures;

pub use assertions::{format_error_messages, format_errors};
pub use fixtures::{compile, document, test_schema, Compiled, TEST_SCHEMA};
