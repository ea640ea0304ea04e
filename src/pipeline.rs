//! Single entry point from tokens to a finished pipeline.

use std::path::Path;

use tracing::debug;

use crate::command::ExitCode;
use crate::errors::Result;
use crate::expand::expand_wildcards;
use crate::lexer::Token;
use crate::parser::construct_pipeline;
use crate::redirect::resolve;
use crate::spawn::spawn_pipeline;
use crate::supervisor::wait_all;

/// Run one line's tokens as a pipeline of one or more stages.
///
/// Wildcards are expanded against `cwd`, the line is segmented and checked,
/// every redirection file is opened, and only then are the stages spawned.
/// Returns the status of the last stage once every stage has exited.
pub fn execute(tokens: Vec<Token>, cwd: &Path, max_args: usize) -> Result<ExitCode> {
    let tokens = expand_wildcards(tokens, cwd)?;
    let spec = construct_pipeline(tokens, max_args)?;
    debug!(stages = spec.len(), "running pipeline");

    let stages = resolve(spec)?;
    let running = spawn_pipeline(stages)?;
    wait_all(running)
}
