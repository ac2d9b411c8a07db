//! mysh entry point.
//!
//! Usage:
//!   mysh                 # interactive when stdin is a terminal, batch otherwise
//!   mysh script.sh       # run every line of a script

use std::fs::File;
use std::io::{self, IsTerminal};
use std::os::fd::AsFd;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use argh::FromArgs;
use mysh::{Config, Interpreter, LineReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// A small command interpreter with redirection, one pipe, wildcards and
/// then/else conditionals.
struct Args {
    #[argh(positional)]
    /// script to run line by line; standard input is used when omitted.
    script: Option<PathBuf>,

    #[argh(option, default = "String::from(\"warn\")")]
    /// log filter used when RUST_LOG is not set (e.g. "debug").
    log: String,

    #[argh(option)]
    /// directory searched for command names, in order; may be repeated and
    /// replaces the default list.
    search_dir: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    // RUST_LOG wins over --log
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mysh: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::default().with_search_dirs(args.search_dir);
    let chunk = config.read_chunk;
    let mut sh = Interpreter::new(config);

    match args.script {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
            info!("batch mode: {}", path.display());
            sh.run_batch(LineReader::new(file, chunk));
        }
        None if io::stdin().is_terminal() => {
            info!("interactive mode");
            sh.repl().context("line editor")?;
        }
        None => {
            info!("batch mode: standard input");
            // read the descriptor directly instead of through the buffered Stdin
            let stdin = io::stdin().as_fd().try_clone_to_owned()?;
            sh.run_batch(LineReader::new(File::from(stdin), chunk));
        }
    }
    Ok(())
}
