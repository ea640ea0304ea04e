use std::env as stdenv;
use std::path::PathBuf;

use crate::command::ExitCode;

/// Mutable, user-level view of the process state touched by built-ins.
///
/// - `current_dir`: mirror of the process working directory, updated by `cd`.
/// - `exit_request`: set by `exit`; the read loop stops once it is `Some`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// `Some(code)` once `exit` ran; `Some(None)` means "exit with the last status".
    pub exit_request: Option<Option<ExitCode>>,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            exit_request: None,
        }
    }

    /// Get the value of a process environment variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        stdenv::var(key).ok()
    }

    pub fn should_exit(&self) -> bool {
        self.exit_request.is_some()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
