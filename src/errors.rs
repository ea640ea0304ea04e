//! Error types for the command-execution pipeline.
//!
//! Errors are split the way the read loop needs to react to them:
//! [`ParseError`] abandons the current line, [`ShellError::Redirect`] and
//! [`ShellError::Expand`] abandon the current line after a resource failure,
//! and [`ShellError::Fatal`] terminates the interpreter.

use std::io;

use thiserror::Error;

use crate::command::{ExitCode, RedirectKind};

/// Status recorded when a line is rejected by the parser.
pub const EXIT_PARSE_ERROR: ExitCode = 2;

/// Status recorded when a line fails before anything is spawned.
pub const EXIT_RESOURCE_ERROR: ExitCode = 1;

/// Malformed pipeline structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Adjacent pipes, or a pipe at the start or end of the line.
    #[error("syntax error: empty command in pipeline")]
    EmptyStage,

    /// A `<` or `>` with nothing after it.
    #[error("syntax error: missing file name after '{0}'")]
    MissingRedirectTarget(&'static str),

    /// A `<` or `>` followed by another operator.
    #[error("syntax error: unexpected '{found}' after '{operator}'")]
    UnexpectedOperator {
        operator: &'static str,
        found: &'static str,
    },

    /// A pipe inside what should be a single command.
    #[error("syntax error: unexpected '|'")]
    UnexpectedPipe,

    #[error("syntax error: input redirection is only allowed on the first command of a pipeline")]
    InputNotFirst,

    #[error("syntax error: output redirection is only allowed on the last command of a pipeline")]
    OutputNotLast,

    /// The argument vector plus its terminating sentinel exceeds the limit.
    #[error("too many arguments: {count} words plus terminator exceed the limit of {limit}")]
    TooManyArguments { count: usize, limit: usize },
}

/// Any failure that stops a line from running to completion.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cannot open '{path}' for {direction}: {source}")]
    Redirect {
        path: String,
        direction: RedirectKind,
        #[source]
        source: io::Error,
    },

    #[error("cannot expand '{pattern}': {source}")]
    Expand {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    /// Pipe or process creation failed; the interpreter cannot continue.
    #[error("{operation} failed: {source}")]
    Fatal {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    pub fn fatal(operation: &'static str, source: impl Into<io::Error>) -> Self {
        ShellError::Fatal {
            operation,
            source: source.into(),
        }
    }

    /// Whether the read loop must stop after reporting this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Fatal { .. })
    }

    /// Status to record in ExitState after reporting a non-fatal error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::Parse(_) => EXIT_PARSE_ERROR,
            _ => EXIT_RESOURCE_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_not_fatal() {
        let err = ShellError::from(ParseError::EmptyStage);
        assert!(!err.is_fatal());
        assert_eq!(err.exit_code(), EXIT_PARSE_ERROR);
    }

    #[test]
    fn argument_limit_message_counts_the_terminator() {
        let message = ParseError::TooManyArguments { count: 3, limit: 3 }.to_string();
        assert_eq!(
            message,
            "too many arguments: 3 words plus terminator exceed the limit of 3"
        );
    }

    #[test]
    fn redirect_error_names_the_file() {
        let err = ShellError::Redirect {
            path: "missing.txt".to_string(),
            direction: RedirectKind::Input,
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let message = err.to_string();
        assert!(message.contains("'missing.txt'"), "got {message}");
        assert!(message.contains("reading"), "got {message}");
        assert_eq!(err.exit_code(), EXIT_RESOURCE_ERROR);
    }

    #[test]
    fn fatal_error_names_the_operation() {
        let err = ShellError::fatal("fork", io::Error::from(io::ErrorKind::OutOfMemory));
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("fork failed"));
    }
}
