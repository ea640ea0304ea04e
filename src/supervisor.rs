//! Waiting for a pipeline to finish and tracking the last exit status.

use std::process::ExitStatus;

use tracing::{debug, warn};

use crate::command::{EXIT_SUCCESS, ExitCode};
use crate::errors::{Result, ShellError};
use crate::spawn::{RunningStage, StageProcess};

/// Status of the most recently completed foreground pipeline.
///
/// Owned by the read loop and updated once per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitState {
    last: ExitCode,
}

impl Default for ExitState {
    fn default() -> Self {
        Self { last: EXIT_SUCCESS }
    }
}

impl ExitState {
    pub fn code(&self) -> ExitCode {
        self.last
    }

    pub fn is_success(&self) -> bool {
        self.last == EXIT_SUCCESS
    }

    pub fn record(&mut self, code: ExitCode) {
        self.last = code;
    }
}

/// Wait for every stage and return the status of the last one.
///
/// All children are reaped even when waiting on one of them fails; the first
/// such failure is then returned as fatal.
pub fn wait_all(stages: Vec<RunningStage>) -> Result<ExitCode> {
    let mut last = EXIT_SUCCESS;
    let mut failure = None;

    for RunningStage { program, process } in stages {
        last = match process {
            StageProcess::Running(mut child) => match child.wait() {
                Ok(status) => status_code(status),
                Err(e) => {
                    failure.get_or_insert(ShellError::fatal("wait", e));
                    continue;
                }
            },
            StageProcess::FailedToStart(code) => code,
        };
        debug!(program = %program, status = last, "stage finished");
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(last),
    }
}

/// Kill and reap stages that are still running.
pub fn abort_all(stages: Vec<RunningStage>) {
    for RunningStage { program, process } in stages {
        if let StageProcess::Running(mut child) = process {
            if let Err(e) = child.kill() {
                warn!(program = %program, error = %e, "failed to kill stage");
            }
            let _ = child.wait();
        }
    }
}

/// Shell-style status: the exit code, or 128 plus the signal number.
pub fn status_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    fn running(program: &str, args: &[&str]) -> RunningStage {
        RunningStage {
            program: program.to_string(),
            process: StageProcess::Running(Command::new(program).args(args).spawn().unwrap()),
        }
    }

    #[test]
    fn test_exit_state_starts_successful() {
        let mut state = ExitState::default();
        assert!(state.is_success());
        state.record(3);
        assert_eq!(state.code(), 3);
        assert!(!state.is_success());
    }

    #[test]
    fn test_last_stage_decides_the_status() {
        assert_eq!(wait_all(vec![running("false", &[]), running("true", &[])]).unwrap(), 0);
        assert_eq!(wait_all(vec![running("true", &[]), running("false", &[])]).unwrap(), 1);
    }

    #[test]
    fn test_failed_stage_status_is_used_when_last() {
        let stages = vec![
            running("true", &[]),
            RunningStage {
                program: "missing".to_string(),
                process: StageProcess::FailedToStart(127),
            },
        ];
        assert_eq!(wait_all(stages).unwrap(), 127);
    }

    #[test]
    fn test_signal_status_is_offset_by_128() {
        // raw wait status for SIGKILL
        assert_eq!(status_code(ExitStatus::from_raw(9)), 137);
        assert_eq!(status_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_abort_all_reaps_running_stages() {
        let stages = vec![running("sleep", &["30"])];
        // returns promptly because the child is killed, not waited out
        abort_all(stages);
    }
}
