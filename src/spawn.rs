//! Process creation and pipe wiring.
//!
//! An N-stage pipeline gets exactly N-1 anonymous pipes, all allocated before
//! the first child is spawned. Every pipe descriptor is created close-on-exec,
//! so a child keeps only the two ends it was handed as standard input and
//! output; each end is handed to exactly one child and the parent's copy is
//! closed as soon as that child has been spawned.

use std::io;
use std::os::fd::OwnedFd;
use std::process::{Child, Command, Stdio};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use tracing::{debug, trace, warn};

use crate::command::{ExitCode, Sink, Source, Stage};
use crate::errors::{Result, ShellError};
use crate::supervisor::abort_all;

/// Status of a stage whose program could not be found.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Status of a stage whose program was found but could not be run.
pub const EXIT_NOT_EXECUTABLE: ExitCode = 126;

#[derive(Debug, Default)]
struct PipeEnds {
    reader: Option<OwnedFd>,
    writer: Option<OwnedFd>,
}

/// The pipes connecting the stages of one pipeline.
///
/// Pipe `k` connects stage `k` (writer) to stage `k + 1` (reader). Ends are
/// moved out as stages are spawned; whatever is left is closed by
/// [`PipeSet::close_all`] or on drop.
#[derive(Debug)]
pub struct PipeSet {
    pipes: Vec<PipeEnds>,
}

impl PipeSet {
    /// Allocate `count` close-on-exec pipes.
    pub fn new(count: usize) -> Result<Self> {
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            let (reader, writer) =
                pipe2(OFlag::O_CLOEXEC).map_err(|e| ShellError::fatal("pipe", e))?;
            pipes.push(PipeEnds {
                reader: Some(reader),
                writer: Some(writer),
            });
        }
        trace!(count, "allocated pipes");
        Ok(Self { pipes })
    }

    /// Number of descriptors the parent still holds.
    pub fn open_descriptors(&self) -> usize {
        self.pipes
            .iter()
            .map(|p| p.reader.is_some() as usize + p.writer.is_some() as usize)
            .sum()
    }

    pub fn take_reader(&mut self, index: usize) -> Option<OwnedFd> {
        self.pipes.get_mut(index)?.reader.take()
    }

    pub fn take_writer(&mut self, index: usize) -> Option<OwnedFd> {
        self.pipes.get_mut(index)?.writer.take()
    }

    /// Close every descriptor the parent still holds.
    pub fn close_all(&mut self) {
        for pipe in &mut self.pipes {
            pipe.reader = None;
            pipe.writer = None;
        }
    }
}

/// How a stage got on after spawning.
#[derive(Debug)]
pub enum StageProcess {
    Running(Child),
    /// The program could not be started; the status stands in for the one
    /// the child would have exited with.
    FailedToStart(ExitCode),
}

/// A spawned pipeline position, in pipeline order.
#[derive(Debug)]
pub struct RunningStage {
    pub program: String,
    pub process: StageProcess,
}

/// Allocate the pipes for `stages` and spawn one process per stage.
pub fn spawn_pipeline(stages: Vec<Stage>) -> Result<Vec<RunningStage>> {
    let mut pipes = PipeSet::new(stages.len().saturating_sub(1))?;
    spawn_stages(stages, &mut pipes)
}

/// Spawn one process per stage, wiring standard streams from `pipes`.
///
/// A stage whose program cannot be found or run is reported and recorded as
/// [`StageProcess::FailedToStart`]; the rest of the pipeline still runs and
/// the failed stage's neighbours see their pipe ends closed. Any other spawn
/// failure kills and reaps the stages already running and is returned as
/// fatal. On return the parent holds no descriptor from `pipes`.
pub fn spawn_stages(stages: Vec<Stage>, pipes: &mut PipeSet) -> Result<Vec<RunningStage>> {
    let mut running: Vec<RunningStage> = Vec::with_capacity(stages.len());

    for stage in stages {
        let program = stage.argv.program().to_string();
        let spawned = bind_streams(stage.input, stage.output, pipes).and_then(|(stdin, stdout)| {
            // The command owns this stage's descriptors and closes them when dropped.
            let mut command = Command::new(&program);
            command
                .args(stage.argv.arguments())
                .stdin(stdin)
                .stdout(stdout);
            command
                .spawn()
                .map_err(|e| classify_spawn_error(&program, e))
        });

        match spawned {
            Ok(child) => {
                debug!(pid = child.id(), program = %program, "spawned stage");
                running.push(RunningStage {
                    program,
                    process: StageProcess::Running(child),
                });
            }
            Err(SpawnFailure::Program(code)) => running.push(RunningStage {
                program,
                process: StageProcess::FailedToStart(code),
            }),
            Err(SpawnFailure::Fatal(err)) => {
                pipes.close_all();
                warn!(spawned = running.len(), "tearing down partially spawned pipeline");
                abort_all(running);
                return Err(err);
            }
        }
    }

    pipes.close_all();
    Ok(running)
}

enum SpawnFailure {
    Program(ExitCode),
    Fatal(ShellError),
}

impl From<ShellError> for SpawnFailure {
    fn from(err: ShellError) -> Self {
        SpawnFailure::Fatal(err)
    }
}

fn bind_streams(
    input: Source,
    output: Sink,
    pipes: &mut PipeSet,
) -> std::result::Result<(Stdio, Stdio), SpawnFailure> {
    let stdin = match input {
        Source::Inherit => Stdio::inherit(),
        Source::File(file) => Stdio::from(file),
        Source::Pipe(k) => Stdio::from(pipes.take_reader(k).ok_or_else(|| missing_end("reader", k))?),
    };
    let stdout = match output {
        Sink::Inherit => Stdio::inherit(),
        Sink::File(file) => Stdio::from(file),
        Sink::Pipe(k) => Stdio::from(pipes.take_writer(k).ok_or_else(|| missing_end("writer", k))?),
    };
    Ok((stdin, stdout))
}

fn missing_end(end: &str, index: usize) -> ShellError {
    ShellError::fatal(
        "pipe",
        io::Error::other(format!("{} of pipe {} is not available", end, index)),
    )
}

/// Separate "this program cannot run" from "no process could be created".
///
/// Resource exhaustion is fatal to the interpreter; anything else is a
/// program error, reported here with one diagnostic line.
fn classify_spawn_error(program: &str, error: io::Error) -> SpawnFailure {
    if let Some(code) = error.raw_os_error() {
        if matches!(
            Errno::from_raw(code),
            Errno::EAGAIN | Errno::ENOMEM | Errno::EMFILE | Errno::ENFILE
        ) {
            return SpawnFailure::Fatal(ShellError::fatal("fork", error));
        }
    }

    if error.kind() == io::ErrorKind::NotFound {
        eprintln!("mysh: {}: command not found", program);
        SpawnFailure::Program(EXIT_NOT_FOUND)
    } else {
        eprintln!("mysh: {}: {}", program, error);
        SpawnFailure::Program(EXIT_NOT_EXECUTABLE)
    }
}
