/// Default sentinel-inclusive bound on one argument vector.
pub const DEFAULT_MAX_ARGS: usize = 10_000;

pub const DEFAULT_PROMPT: &str = "mysh> ";

/// Interpreter settings, fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on the length of an argument vector, counting its sentinel.
    pub max_args: usize,
    /// Prompt shown in interactive mode and used to echo batch lines.
    pub prompt: String,
    /// Echo each batch line before running it.
    pub echo_batch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_args: DEFAULT_MAX_ARGS,
            prompt: DEFAULT_PROMPT.to_string(),
            echo_batch: true,
        }
    }
}
