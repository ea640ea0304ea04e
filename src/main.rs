use anyhow::{Context, Result};
use argh::FromArgs;
use mysh::config::DEFAULT_MAX_ARGS;
use mysh::{Config, Interpreter, logging};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Run commands interactively, from a script file, or from standard input.
struct Cli {
    #[argh(positional)]
    /// script to run line by line instead of reading commands interactively
    script: Option<PathBuf>,

    #[argh(option)]
    /// log level: error, warn, info, debug or trace (overrides MYSH_LOG)
    log_level: Option<String>,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// maximum number of words in one command, counting the terminator
    max_args: usize,

    #[argh(switch, short = 'q')]
    /// do not echo commands read in batch mode
    quiet: bool,
}

fn run(cli: Cli) -> Result<i32> {
    logging::init_logging(cli.log_level.as_deref())?;

    let config = Config {
        max_args: cli.max_args,
        echo_batch: !cli.quiet,
        ..Config::default()
    };
    let mut sh = Interpreter::new(config);

    let status = match cli.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            sh.run_script(BufReader::new(file))?
        }
        None if io::stdin().is_terminal() => sh.repl()?,
        None => sh.run_script(io::stdin().lock())?,
    };
    Ok(status)
}

fn main() {
    let cli: Cli = argh::from_env();
    match run(cli) {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("mysh: {:#}", e);
            std::process::exit(1);
        }
    }
}
