//! `<` and `>` handling.
//!
//! Redirections are pulled out of the token sequence first
//! ([`Redirections::extract`]) and only opened when the command actually
//! runs. Built-ins run inside the interpreter, so their redirections replace
//! the interpreter's own standard streams for the duration of a
//! [`StreamGuard`]; launched programs get the opened files as their stdio.

use crate::error::{Result, ShellError};
use crate::lexer::{REDIRECT_IN, REDIRECT_OUT};
use nix::unistd;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use tracing::{debug, error};

/// Permissions for files created by `>`: read-write for owner and group.
pub const OUTPUT_MODE: u32 = 0o640;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`: standard input comes from the file.
    Input,
    /// `>`: standard output goes to the file, created or truncated.
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub target: PathBuf,
}

/// Redirections of one command, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    redirects: Vec<Redirect>,
}

/// Files opened for a command. `None` keeps the inherited stream.
#[derive(Debug, Default)]
pub struct OpenedStreams {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl Redirections {
    /// Remove every `<` / `>` and its operand from `tokens`.
    ///
    /// An operator in last position has no operand and is a usage error.
    pub fn extract(tokens: &mut Vec<String>) -> Result<Self> {
        let mut redirects = Vec::new();
        let mut kept = Vec::with_capacity(tokens.len());
        let mut iter = std::mem::take(tokens).into_iter();

        while let Some(token) = iter.next() {
            let kind = match token.as_str() {
                REDIRECT_IN => RedirectKind::Input,
                REDIRECT_OUT => RedirectKind::Output,
                _ => {
                    kept.push(token);
                    continue;
                }
            };
            let target = iter
                .next()
                .ok_or_else(|| ShellError::MissingRedirectTarget(token.clone()))?;
            redirects.push(Redirect {
                kind,
                target: PathBuf::from(target),
            });
        }

        *tokens = kept;
        Ok(Self { redirects })
    }

    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Redirect> {
        self.redirects.iter()
    }

    /// Open every target in order. The last redirection of each kind wins,
    /// but each `>` target is still created or truncated.
    pub fn open(&self) -> Result<OpenedStreams> {
        let mut streams = OpenedStreams::default();
        for redirect in &self.redirects {
            match redirect.kind {
                RedirectKind::Input => {
                    let file =
                        File::open(&redirect.target).map_err(|source| ShellError::OpenInput {
                            path: redirect.target.clone(),
                            source,
                        })?;
                    streams.stdin = Some(file);
                }
                RedirectKind::Output => {
                    let file = OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .mode(OUTPUT_MODE)
                        .open(&redirect.target)
                        .map_err(|source| ShellError::OpenOutput {
                            path: redirect.target.clone(),
                            source,
                        })?;
                    streams.stdout = Some(file);
                }
            }
        }
        Ok(streams)
    }
}

/// Standard input/output of the interpreter replaced for one command.
///
/// Dropping the guard flushes stdout and puts the original descriptors back,
/// whichever way the command ended.
#[derive(Debug)]
pub struct StreamGuard {
    saved_stdin: Option<OwnedFd>,
    saved_stdout: Option<OwnedFd>,
}

impl StreamGuard {
    pub fn install(streams: OpenedStreams) -> Result<Self> {
        let mut guard = Self {
            saved_stdin: None,
            saved_stdout: None,
        };
        if let Some(file) = streams.stdin {
            guard.saved_stdin = Some(unistd::dup(io::stdin().as_fd()).map_err(ShellError::Stream)?);
            unistd::dup2_stdin(&file).map_err(ShellError::Stream)?;
            debug!("stdin redirected");
        }
        if let Some(file) = streams.stdout {
            io::stdout().flush()?;
            guard.saved_stdout =
                Some(unistd::dup(io::stdout().as_fd()).map_err(ShellError::Stream)?);
            unistd::dup2_stdout(&file).map_err(ShellError::Stream)?;
            debug!("stdout redirected");
        }
        Ok(guard)
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved_stdout.take() {
            if let Err(e) = io::stdout().flush() {
                error!("flush redirected stdout: {e}");
            }
            if let Err(e) = unistd::dup2_stdout(&saved) {
                error!("restore stdout: {e}");
            }
        }
        if let Some(saved) = self.saved_stdin.take() {
            if let Err(e) = unistd::dup2_stdin(&saved) {
                error!("restore stdin: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_extract_removes_operators_and_operands() {
        let mut t = tokens(&["sort", "<", "in", "-r", ">", "out"]);
        let r = Redirections::extract(&mut t).unwrap();
        assert_eq!(t, vec!["sort", "-r"]);
        let kinds: Vec<_> = r.iter().map(|x| (x.kind, x.target.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                (RedirectKind::Input, PathBuf::from("in")),
                (RedirectKind::Output, PathBuf::from("out")),
            ]
        );
    }

    #[test]
    fn test_no_redirections_leaves_tokens_alone() {
        let mut t = tokens(&["ls", "-l"]);
        let r = Redirections::extract(&mut t).unwrap();
        assert!(r.is_empty());
        assert_eq!(t, vec!["ls", "-l"]);
    }

    #[test]
    fn test_trailing_operator_is_usage_error() {
        let mut t = tokens(&["echo", "hi", ">"]);
        let err = Redirections::extract(&mut t).unwrap_err();
        assert!(matches!(err, ShellError::MissingRedirectTarget(op) if op == ">"));
    }

    #[test]
    fn test_open_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = tokens(&["cat", "<"]);
        t.push(dir.path().join("absent").display().to_string());
        let r = Redirections::extract(&mut t).unwrap();
        assert!(matches!(r.open(), Err(ShellError::OpenInput { .. })));
    }

    #[test]
    fn test_output_created_truncated_and_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::write(&second, "old contents").unwrap();

        let mut t = vec![
            "echo".to_string(),
            ">".to_string(),
            first.display().to_string(),
            ">".to_string(),
            second.display().to_string(),
        ];
        let r = Redirections::extract(&mut t).unwrap();
        let streams = r.open().unwrap();

        assert!(streams.stdin.is_none());
        assert!(streams.stdout.is_some());
        assert!(first.exists());
        assert_eq!(fs::read_to_string(&second).unwrap(), "");
        let mode = fs::metadata(&first).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0, "no execute bits");
        assert_eq!(mode & 0o007, 0, "no world access");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_guard_restores_stdout() {
        let _lock = crate::test_support::serial();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("captured");
        let before = fs::read_link("/proc/self/fd/1").ok();

        let mut t = tokens(&["pwd", ">"]);
        t.push(target.display().to_string());
        let r = Redirections::extract(&mut t).unwrap();
        {
            let _guard = StreamGuard::install(r.open().unwrap()).unwrap();
            let mut out = io::stdout().lock();
            out.write_all(b"redirected\n").unwrap();
        }

        assert_eq!(fs::read_link("/proc/self/fd/1").ok(), before);
        assert_eq!(fs::read_to_string(&target).unwrap(), "redirected\n");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_guard_restores_stdin() {
        let _lock = crate::test_support::serial();
        let dir = tempfile::tempdir().unwrap();
        let source = fs::canonicalize(dir.path()).unwrap().join("source");
        fs::write(&source, "data\n").unwrap();
        let before = fs::read_link("/proc/self/fd/0").ok();

        let mut t = tokens(&["cat", "<"]);
        t.push(source.display().to_string());
        let r = Redirections::extract(&mut t).unwrap();
        {
            let _guard = StreamGuard::install(r.open().unwrap()).unwrap();
            assert_eq!(fs::read_link("/proc/self/fd/0").unwrap(), source);
        }

        assert_eq!(fs::read_link("/proc/self/fd/0").ok(), before);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_failed_output_open_leaves_stdin_alone() {
        let _lock = crate::test_support::serial();
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs::write(&source, "data\n").unwrap();
        let before = fs::read_link("/proc/self/fd/0").ok();

        let mut t = tokens(&["cat", "<"]);
        t.push(source.display().to_string());
        t.push(">".to_string());
        t.push(dir.path().join("missing/out").display().to_string());
        let r = Redirections::extract(&mut t).unwrap();

        let result = r.open().and_then(StreamGuard::install);
        assert!(matches!(result, Err(ShellError::OpenOutput { .. })));
        assert_eq!(fs::read_link("/proc/self/fd/0").ok(), before);
    }
}
