//! Data model shared by the pipeline stages.
//!
//! A line moves through three shapes: a [`PipelineSpec`] (what the parser
//! understood), a list of [`Stage`]s (files opened, stream bindings decided),
//! and finally running child processes owned by the spawner.

use std::fmt;
use std::fs::File;

use crate::errors::ParseError;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

pub const EXIT_SUCCESS: ExitCode = 0;

/// Program name and arguments for one process.
///
/// Never empty. Its length plus the terminating sentinel that `execvp`
/// expects stays within the limit it was constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    words: Vec<String>,
}

impl ArgumentVector {
    pub fn new(words: Vec<String>, limit: usize) -> Result<Self, ParseError> {
        if words.is_empty() {
            return Err(ParseError::EmptyStage);
        }
        // one slot is reserved for the sentinel
        if words.len() + 1 > limit {
            return Err(ParseError::TooManyArguments {
                count: words.len(),
                limit,
            });
        }
        Ok(Self { words })
    }

    pub fn program(&self) -> &str {
        &self.words[0]
    }

    pub fn arguments(&self) -> &[String] {
        &self.words[1..]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }
}

/// Direction of an I/O redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: standard input read from a file.
    Input,
    /// `>`: standard output written to a file, created or truncated.
    Output,
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectKind::Input => f.write_str("reading"),
            RedirectKind::Output => f.write_str("writing"),
        }
    }
}

/// An operator/file name pair removed from a command's words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub target: String,
}

/// One parsed pipeline position, before any file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: ArgumentVector,
    /// Redirections in the order they appeared on the line.
    pub redirects: Vec<Redirect>,
}

/// A parsed line: one or more commands separated by pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub stages: Vec<CommandSpec>,
}

impl PipelineSpec {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Where a stage reads its standard input from.
#[derive(Debug)]
pub enum Source {
    Inherit,
    /// Read end of pipe `k`.
    Pipe(usize),
    File(File),
}

/// Where a stage writes its standard output to.
#[derive(Debug)]
pub enum Sink {
    Inherit,
    /// Write end of pipe `k`.
    Pipe(usize),
    File(File),
}

/// A pipeline position ready to be spawned.
#[derive(Debug)]
pub struct Stage {
    pub argv: ArgumentVector,
    pub input: Source,
    pub output: Sink,
}
