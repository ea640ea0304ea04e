//! Input/output redirection.
//!
//! Resolution happens in two steps: [`split_redirects`] pulls every
//! operator/file name pair out of a command's tokens while the line is parsed,
//! and [`resolve`] opens the files and binds every stage to its source and
//! sink once the whole pipeline is known to be well formed.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;

use tracing::trace;

use crate::command::{CommandSpec, PipelineSpec, Redirect, RedirectKind, Sink, Source, Stage};
use crate::errors::{ParseError, Result, ShellError};
use crate::lexer::Token;

/// Permission bits for files created by `>`: owner read/write, group read.
pub const OUTPUT_FILE_MODE: u32 = 0o640;

/// Separate a command's words from its redirections.
///
/// Scans left to right. Each operator consumes the token after it as its
/// file name; neither token ends up in the returned words.
pub fn split_redirects(tokens: Vec<Token>) -> std::result::Result<(Vec<String>, Vec<Redirect>), ParseError> {
    let mut words = Vec::with_capacity(tokens.len());
    let mut redirects = Vec::new();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        let kind = match token {
            Token::RedirectLeft => RedirectKind::Input,
            Token::RedirectRight => RedirectKind::Output,
            Token::PipeOp => return Err(ParseError::UnexpectedPipe),
            Token::Word(word) | Token::Pattern(word) => {
                words.push(word);
                continue;
            }
        };

        let operator = operator_for(kind);
        let target = match tokens.next() {
            None => return Err(ParseError::MissingRedirectTarget(operator)),
            Some(next) => match next.operator() {
                Some(found) => return Err(ParseError::UnexpectedOperator { operator, found }),
                None => next.into_word().ok_or(ParseError::MissingRedirectTarget(operator))?,
            },
        };
        redirects.push(Redirect { kind, target });
    }

    Ok((words, redirects))
}

fn operator_for(kind: RedirectKind) -> &'static str {
    match kind {
        RedirectKind::Input => "<",
        RedirectKind::Output => ">",
    }
}

/// Open the file named by one redirection.
///
/// `>` creates or truncates the file with [`OUTPUT_FILE_MODE`].
pub fn open_redirect(redirect: &Redirect) -> Result<File> {
    let mut options = OpenOptions::new();
    match redirect.kind {
        RedirectKind::Input => options.read(true),
        RedirectKind::Output => options
            .write(true)
            .create(true)
            .truncate(true)
            .mode(OUTPUT_FILE_MODE),
    };
    options
        .open(&redirect.target)
        .map_err(|source| ShellError::Redirect {
            path: redirect.target.clone(),
            direction: redirect.kind,
            source,
        })
}

/// Open every redirection file and decide each stage's source and sink.
///
/// Stage `i` reads pipe `i - 1` and writes pipe `i`, except where the
/// pipeline's endpoints are bound to a file or left inherited. Repeated
/// redirections of the same kind are all opened in order; each one closes the
/// file chosen by the previous one.
pub fn resolve(spec: PipelineSpec) -> Result<Vec<Stage>> {
    let count = spec.len();
    let mut stages = Vec::with_capacity(count);

    for (index, CommandSpec { argv, redirects }) in spec.stages.into_iter().enumerate() {
        let mut input_file: Option<File> = None;
        let mut output_file: Option<File> = None;

        for redirect in &redirects {
            let file = open_redirect(redirect)?;
            let slot = match redirect.kind {
                RedirectKind::Input => &mut input_file,
                RedirectKind::Output => &mut output_file,
            };
            if slot.replace(file).is_some() {
                trace!(path = %redirect.target, "superseded earlier {} redirection", redirect.kind);
            }
        }

        let input = match input_file {
            Some(file) => Source::File(file),
            None if index == 0 => Source::Inherit,
            None => Source::Pipe(index - 1),
        };
        let output = match output_file {
            Some(file) => Sink::File(file),
            None if index + 1 == count => Sink::Inherit,
            None => Sink::Pipe(index),
        };
        stages.push(Stage { argv, input, output });
    }

    Ok(stages)
}
