use crate::builtin::{is_builtin, run_builtin};
use crate::command::ExitCode;
use crate::config::Config;
use crate::env::Environment;
use crate::errors::ShellError;
use crate::lexer::{self, Token};
use crate::pipeline;
use crate::supervisor::ExitState;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// What the read loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop reading and exit the process with this status.
    Exit(ExitCode),
}

/// A minimal shell that runs one line at a time as a pipeline of external
/// programs.
///
/// The interpreter owns the [`ExitState`] and threads it through the read
/// loop: every line that runs updates it, and it becomes the process exit
/// status when input ends.
///
/// Example
/// ```
/// use mysh::{Config, Flow, Interpreter};
/// let mut sh = Interpreter::new(Config::default());
/// assert_eq!(sh.handle_line("true").unwrap(), Flow::Continue);
/// assert_eq!(sh.status(), 0);
/// ```
pub struct Interpreter {
    env: Environment,
    config: Config,
    state: ExitState,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self {
            env: Environment::new(),
            config,
            state: ExitState::default(),
        }
    }

    /// Status of the most recently completed line.
    pub fn status(&self) -> ExitCode {
        self.state.code()
    }

    /// Run one line without reporting errors.
    ///
    /// Built-ins run in-process when the line is a single command with no
    /// operators. Everything else goes through the pipeline. Empty lines
    /// return the current status unchanged.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let tokens = lexer::split_into_tokens(line);
        if tokens.is_empty() {
            return Ok(self.state.code());
        }

        if let Some(code) = self.try_builtin(&tokens) {
            return Ok(code);
        }

        pipeline::execute(tokens, &self.env.current_dir, self.config.max_args)
    }

    /// Run one line, report any error and update the exit status.
    ///
    /// Only fatal errors are returned; the caller must stop reading input.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match self.execute_line(line) {
            Ok(code) => self.state.record(code),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                eprintln!("mysh: {}", e);
                self.state.record(e.exit_code());
            }
        }
        debug!(status = self.state.code(), success = self.state.is_success(), "line finished");

        if !self.env.should_exit() {
            return Ok(Flow::Continue);
        }
        let code = self.env.exit_request.flatten().unwrap_or(self.state.code());
        Ok(Flow::Exit(code))
    }

    fn try_builtin(&mut self, tokens: &[Token]) -> Option<ExitCode> {
        let words: Vec<&str> = tokens
            .iter()
            .map(|t| t.operator().is_none().then(|| t.as_str()))
            .collect::<Option<_>>()?;
        let (name, args) = words.split_first()?;
        if !is_builtin(name) {
            return None;
        }
        // Keep the last status for a bare `exit`.
        let before = self.state.code();
        let code = run_builtin(name, args, &mut io::stdout(), &mut self.env)?;
        Some(match self.env.exit_request {
            Some(None) => before,
            _ => code,
        })
    }

    /// Interactive read-eval-print loop.
    ///
    /// Ctrl-C abandons the current line, Ctrl-D ends the session. Returns the
    /// status the process should exit with.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Flow::Exit(code) = self.handle_line(&line)? {
                        return Ok(code);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(self.state.code())
    }

    /// Batch mode: run every line from `input` until it ends or `exit` runs.
    ///
    /// Each line is echoed after the prompt first unless echo is disabled.
    ///
    /// Lines are read as bytes; anything that is not valid UTF-8 is replaced
    /// rather than ending the script.
    pub fn run_script(&mut self, mut input: impl BufRead) -> anyhow::Result<ExitCode> {
        let mut stdout = io::stdout();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if self.config.echo_batch {
                writeln!(stdout, "{}{}", self.config.prompt, line)?;
                stdout.flush()?;
            }
            if let Flow::Exit(code) = self.handle_line(&line)? {
                return Ok(code);
            }
        }
        Ok(self.state.code())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;
    use std::io::Cursor;

    fn quiet() -> Interpreter {
        Interpreter::new(Config {
            echo_batch: false,
            ..Config::default()
        })
    }

    #[test]
    fn test_status_starts_at_success() {
        assert_eq!(quiet().status(), 0);
    }

    #[test]
    fn test_status_follows_the_last_line() {
        let mut sh = quiet();
        sh.handle_line("false").unwrap();
        assert_eq!(sh.status(), 1);
        sh.handle_line("true").unwrap();
        assert_eq!(sh.status(), 0);
    }

    #[test]
    fn test_blank_lines_keep_the_status() {
        let mut sh = quiet();
        sh.handle_line("false").unwrap();
        assert_eq!(sh.handle_line("   ").unwrap(), Flow::Continue);
        assert_eq!(sh.status(), 1);
    }

    #[test]
    fn test_parse_error_is_reported_and_recorded() {
        let mut sh = quiet();
        assert!(matches!(
            sh.execute_line("ls | | wc"),
            Err(ShellError::Parse(ParseError::EmptyStage))
        ));
        assert_eq!(sh.handle_line("ls |").unwrap(), Flow::Continue);
        assert_eq!(sh.status(), 2);
    }

    #[test]
    fn test_missing_program_sets_127() {
        let mut sh = quiet();
        sh.handle_line("mysh-no-such-program --flag").unwrap();
        assert_eq!(sh.status(), 127);
    }

    #[test]
    fn test_exit_uses_explicit_or_last_status() {
        let mut sh = quiet();
        assert_eq!(sh.handle_line("exit 4").unwrap(), Flow::Exit(4));

        let mut sh = quiet();
        sh.handle_line("false").unwrap();
        assert_eq!(sh.handle_line("exit").unwrap(), Flow::Exit(1));
    }

    #[test]
    fn test_builtin_names_in_pipelines_are_programs() {
        let mut sh = quiet();
        // `exit` is not a builtin here, so it is looked up as a program.
        assert_eq!(sh.handle_line("true | exit").unwrap(), Flow::Continue);
        assert_eq!(sh.status(), 127);
    }

    #[test]
    fn test_script_stops_at_exit() {
        let mut sh = quiet();
        let script = Cursor::new("true\nexit 7\nfalse\n");
        assert_eq!(sh.run_script(script).unwrap(), 7);
    }

    #[test]
    fn test_script_returns_last_status_at_end_of_input() {
        let mut sh = quiet();
        let script = Cursor::new("true\n\nfalse\n");
        assert_eq!(sh.run_script(script).unwrap(), 1);
    }

    #[test]
    fn test_script_without_trailing_newline_runs_last_line() {
        let mut sh = quiet();
        let script = Cursor::new("true\r\nexit 5");
        assert_eq!(sh.run_script(script).unwrap(), 5);
    }
}
