//! Error types for command line processing.

use thiserror::Error;

/// Errors returned by the command line processor and command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmdLineError {
    /// No command matched the first argument, or the line was empty.
    #[error("bad command: {0:?}")]
    BadCommand(String),

    /// The line has more arguments than the processor accepts.
    #[error("too many arguments: max {max}")]
    TooManyArgs { max: usize },

    /// The command needs more arguments.
    #[error("too few arguments: expected {expected}, got {actual}")]
    TooFewArgs { expected: usize, actual: usize },

    /// An argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl CmdLineError {
    /// Numeric status code returned by C-style command processors.
    pub fn code(&self) -> i8 {
        match self {
            CmdLineError::BadCommand(_) => -1,
            CmdLineError::TooManyArgs { .. } => -2,
            CmdLineError::TooFewArgs { .. } => -3,
            CmdLineError::InvalidArg(_) => -4,
        }
    }

    /// Short name of the error kind, for logs and metric labels.
    pub fn kind_str(&self) -> &'static str {
        match self {
            CmdLineError::BadCommand(_) => "bad_command",
            CmdLineError::TooManyArgs { .. } => "too_many_args",
            CmdLineError::TooFewArgs { .. } => "too_few_args",
            CmdLineError::InvalidArg(_) => "invalid_arg",
        }
    }
}

/// Result type alias for command line operations.
pub type CmdResult<T> = Result<T, CmdLineError>;
