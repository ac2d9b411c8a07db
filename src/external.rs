use crate::command::{CommandFactory, ExecutableCommand, ExitCode, FAILURE};
use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::redirect::Redirections;
use nix::unistd::{AccessFlags, access};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tracing::debug;

/// Command that is not a builtin.
pub struct ExternalCommand {
    program: PathBuf,
    argv0: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: PathBuf, argv0: String, args: Vec<String>) -> Self {
        Self {
            program,
            argv0,
            args,
        }
    }
}

/// Creates [`ExternalCommand`]s for names that are paths or that are found
/// in a fixed list of directories.
pub struct ExternalFactory {
    search_dirs: Vec<PathBuf>,
}

impl ExternalFactory {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }
}

impl CommandFactory for ExternalFactory {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let program = find_command_path(&self.search_dirs, name)?;
        debug!("{name} resolved to {}", program.display());
        Some(Box::new(ExternalCommand::new(
            program,
            name.to_string(),
            args.iter().map(|x| x.to_string()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        redirections: Redirections,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let streams = redirections.open()?;
        let mut cmd = std::process::Command::new(&self.program);
        cmd.arg0(&self.argv0)
            .args(&self.args)
            .env_clear()
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(file) = streams.stdin {
            cmd.stdin(Stdio::from(file));
        }
        if let Some(file) = streams.stdout {
            cmd.stdout(Stdio::from(file));
        }

        let mut child = cmd.spawn().map_err(|source| ShellError::Spawn {
            path: self.program.clone(),
            source,
        })?;
        debug!(pid = child.id(), "spawned {}", self.program.display());
        let exit_status = child.wait().map_err(ShellError::Wait)?;
        debug!(pid = child.id(), %exit_status, "reaped");
        Ok(status_code(exit_status))
    }
}

/// Map an exit status to a Last-Status value.
pub fn status_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match exit_status.signal() {
        Some(signal) => 128 + signal,
        None => FAILURE,
    }
}

/// Resolve a command name the way this shell does.
///
/// Behavior:
/// - Name containing a `/`: used as-is, without checking it exists; running it
///   reports any problem.
/// - Otherwise: each directory of `search_dirs` is tried in order and the first
///   executable regular file wins.
/// - Empty name: `None`.
pub fn find_command_path(search_dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    search_dirs
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
