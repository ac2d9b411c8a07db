use nix::errno::Errno;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a single command line from running.
///
/// None of these end the interpreter: the caller prints the error, records a
/// failing Last-Status and moves on to the next line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: `{0}` needs a file name")]
    MissingRedirectTarget(String),

    #[error("syntax error: missing command")]
    MissingCommand,

    #[error("syntax error: empty pipeline stage")]
    EmptyPipelineStage,

    #[error("only one pipe per command line is supported")]
    ChainedPipe,

    #[error("command line is longer than {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("open input file {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("open output file {}: {source}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("fork: {0}")]
    Fork(#[source] Errno),

    #[error("redirect standard stream: {0}")]
    Stream(#[source] Errno),

    #[error("{}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("wait: {0}")]
    Wait(#[source] io::Error),

    #[error(transparent)]
    Builtin(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;
