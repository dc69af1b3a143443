//! Exit codes for `graphql-compile`.
//!
//! Scripts and CI can tell a project with compile errors apart from one that
//! could not be loaded at all.

/// Exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every operation compiled
    Success = 0,
    /// At least one compile error was reported
    CompileError = 1,
    /// Configuration error (missing or invalid config file)
    ConfigError = 2,
    /// Schema files missing, unparsable or invalid
    SchemaError = 3,
    /// I/O error (file read/write failure)
    IoError = 4,
    /// A document had invalid GraphQL syntax
    ParseError = 5,
}

impl ExitCode {
    /// Exit the process with this exit code.
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::CompileError => write!(f, "compile error"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::SchemaError => write!(f, "schema load error"),
            Self::IoError => write!(f, "I/O error"),
            Self::ParseError => write!(f, "parse error"),
        }
    }
}

/// An error that ends the run with a specific exit code.
#[derive(Debug)]
pub struct Failure {
    pub code: ExitCode,
    pub error: anyhow::Error,
}

pub trait OrExit<T> {
    /// Tag an error with the exit code the run should end with.
    fn or_exit(self, code: ExitCode) -> Result<T, Failure>;
}

impl<T, E: Into<anyhow::Error>> OrExit<T> for Result<T, E> {
    fn or_exit(self, code: ExitCode) -> Result<T, Failure> {
        self.map_err(|error| Failure {
            code,
            error: error.into(),
        })
    }
}
