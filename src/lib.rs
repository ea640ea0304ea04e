//! A small command interpreter built around a process pipeline core.
//!
//! A line is split into whitespace-delimited tokens, wildcard patterns are
//! expanded against the working directory, and the result is cut into one or
//! more stages at each `|`. `<` and `>` bind the first stage's input and the
//! last stage's output to files. Every stage runs as a child process, wired to
//! its neighbours through anonymous pipes, and the status of the last stage
//! becomes the line's status.
//!
//! The main entry point is [`Interpreter`], which runs lines, keeps the last
//! exit status, and provides the interactive and batch read loops. The
//! [`pipeline`] module exposes the core on its own for callers that bring
//! their own read loop.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod errors;
pub mod expand;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod redirect;
pub mod spawn;
pub mod supervisor;

pub use command::ExitCode;
pub use config::Config;
pub use errors::{ParseError, ShellError};
pub use interpreter::{Flow, Interpreter};
pub use supervisor::ExitState;
