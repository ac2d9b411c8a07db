//! Splitting a command line at its pipe and running the two stages as
//! concurrent child processes.

use crate::command::{ExitCode, FAILURE};
use crate::error::{Result, ShellError};
use crate::lexer::PIPE;
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::io::{self, Write};
use tracing::{debug, error};

/// A command line with at most one pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stages {
    Single(Vec<String>),
    Pair(Vec<String>, Vec<String>),
}

/// Split `tokens` at the first `|`.
///
/// Only one pipe is supported: a second `|` is rejected rather than passed on
/// as an argument. Both sides of the pipe must hold a command.
pub fn split(mut tokens: Vec<String>) -> Result<Stages> {
    let Some(at) = tokens.iter().position(|t| t == PIPE) else {
        return Ok(Stages::Single(tokens));
    };
    let second = tokens.split_off(at + 1);
    tokens.pop();
    if second.iter().any(|t| t == PIPE) {
        return Err(ShellError::ChainedPipe);
    }
    if tokens.is_empty() || second.is_empty() {
        return Err(ShellError::EmptyPipelineStage);
    }
    Ok(Stages::Pair(tokens, second))
}

/// Retry a system call interrupted by a signal.
fn syscall<F, T>(f: F) -> nix::Result<T>
where
    F: Fn() -> nix::Result<T>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => (),
            result => return result,
        }
    }
}

/// Run `first | second`.
///
/// Each stage runs in its own forked process through `run_stage`, with its
/// stdout (first) or stdin (second) wired to one end of a fresh pipe and the
/// other end closed. The caller waits for both children and gets the exit
/// code of the second one.
pub fn run_pair<F>(first: Vec<String>, second: Vec<String>, mut run_stage: F) -> Result<ExitCode>
where
    F: FnMut(Vec<String>) -> ExitCode,
{
    let (reader, writer) = unistd::pipe().map_err(ShellError::Pipe)?;
    // anything still buffered would otherwise be written by every child
    io::stdout().flush()?;

    let forked = unsafe { unistd::fork() };
    let first_pid = match forked.map_err(ShellError::Fork)? {
        ForkResult::Child => {
            drop(reader);
            let wired = unistd::dup2_stdout(&writer);
            drop(writer);
            finish_stage(wired, first, &mut run_stage)
        }
        ForkResult::Parent { child } => child,
    };
    debug!(pid = %first_pid, "spawned first stage");

    let forked = unsafe { unistd::fork() };
    let second_pid = match forked {
        Ok(ForkResult::Child) => {
            drop(writer);
            let wired = unistd::dup2_stdin(&reader);
            drop(reader);
            finish_stage(wired, second, &mut run_stage)
        }
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = %child, "spawned second stage");
            Ok(child)
        }
        Err(e) => Err(ShellError::Fork(e)),
    };

    drop(reader);
    drop(writer);

    let first_status = reap(first_pid);
    let second_status = reap(second_pid?);
    debug!(first_status, second_status, "pipeline finished");
    Ok(second_status)
}

fn finish_stage<F>(wired: nix::Result<()>, tokens: Vec<String>, run_stage: &mut F) -> !
where
    F: FnMut(Vec<String>) -> ExitCode,
{
    let code = match wired {
        Ok(()) => run_stage(tokens),
        Err(e) => {
            eprintln!("{}", ShellError::Stream(e));
            FAILURE
        }
    };
    let _ = io::stdout().flush();
    std::process::exit(code)
}

/// Wait for `pid` and map how it ended to an exit code.
fn reap(pid: Pid) -> ExitCode {
    match syscall(|| waitpid(pid, None)) {
        Ok(WaitStatus::Exited(_, code)) => code,
        Ok(WaitStatus::Signaled(_, signal, _)) => 128 + signal as i32,
        Ok(other) => {
            debug!(?other, "unexpected wait status");
            FAILURE
        }
        Err(e) => {
            error!(pid = %pid, "waitpid: {e}");
            FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_without_pipe_is_single_stage() {
        assert_eq!(
            split(tokens(&["ls", "-l"])).unwrap(),
            Stages::Single(tokens(&["ls", "-l"]))
        );
    }

    #[test]
    fn test_pipe_is_removed_between_stages() {
        assert_eq!(
            split(tokens(&["ls", "-l", "|", "wc", "-l", ">", "n"])).unwrap(),
            Stages::Pair(tokens(&["ls", "-l"]), tokens(&["wc", "-l", ">", "n"]))
        );
    }

    #[test]
    fn test_second_pipe_is_rejected() {
        assert!(matches!(
            split(tokens(&["a", "|", "b", "|", "c"])),
            Err(ShellError::ChainedPipe)
        ));
    }

    #[test]
    fn test_empty_stage_is_rejected() {
        for line in [&["|", "wc"][..], &["ls", "|"][..], &["|"][..]] {
            assert!(
                matches!(split(tokens(line)), Err(ShellError::EmptyPipelineStage)),
                "{line:?}"
            );
        }
    }
}
