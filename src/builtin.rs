use crate::command::{EXIT_SUCCESS, ExitCode};
use crate::env::Environment;
use crate::external::{DEFAULT_SEARCH_PATH, find_command_path};
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Built-in commands handled by the read loop itself.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. They never take part in a
/// pipeline.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Executes the command using provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Run `name` as a builtin if it is one.
///
/// Errors are reported as a single line on standard error and turned into
/// status 1.
pub(crate) fn run_builtin(
    name: &str,
    args: &[&str],
    stdout: &mut dyn Write,
    env: &mut Environment,
) -> Option<ExitCode> {
    match name {
        "cd" => Some(dispatch::<Cd>(args, stdout, env)),
        "exit" => Some(dispatch::<Exit>(args, stdout, env)),
        "which" => Some(dispatch::<Which>(args, stdout, env)),
        _ => None,
    }
}

pub(crate) fn is_builtin(name: &str) -> bool {
    matches!(name, "cd" | "exit" | "which")
}

fn dispatch<T: BuiltinCommand>(args: &[&str], stdout: &mut dyn Write, env: &mut Environment) -> ExitCode {
    let cmd = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            return match status {
                Ok(()) => {
                    let _ = write!(stdout, "{}", output);
                    EXIT_SUCCESS
                }
                Err(()) => {
                    eprint!("{}", output);
                    1
                }
            };
        }
    };
    match cmd.execute(stdout, env) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", T::name(), e);
            1
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow::anyhow!("no target and HOME not set")),
            },
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("{}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(EXIT_SUCCESS)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
/// Without an argument the shell exits with the status of the last command.
pub struct Exit {
    #[argh(positional)]
    /// exit status to report
    pub status: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.exit_request = Some(self.status);
        Ok(self.status.unwrap_or(EXIT_SUCCESS))
    }
}

#[derive(FromArgs)]
/// Print the full path of each program that would be run for the given names.
pub struct Which {
    #[argh(positional, greedy)]
    /// program names to look up in PATH
    pub programs: Vec<String>,
}

impl BuiltinCommand for Which {
    fn name() -> &'static str {
        "which"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if self.programs.is_empty() {
            return Err(anyhow::anyhow!("missing argument"));
        }

        let search_paths = env
            .get_var("PATH")
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string());
        let mut code = EXIT_SUCCESS;
        for program in &self.programs {
            match find_command_path(OsStr::new(&search_paths), Path::new(program)) {
                Some(path) => writeln!(stdout, "{}", path.display())?,
                None => {
                    eprintln!("which: {} not found in PATH", program);
                    code = 1;
                }
            }
        }
        Ok(code)
    }
}
