use crate::command::{CommandFactory, ExecutableCommand, ExitCode, FAILURE, SUCCESS};
use crate::env::Environment;
use crate::error::Result as ShellResult;
use crate::external::is_executable;
use crate::interpreter::Factory;
use crate::redirect::{Redirections, StreamGuard};
use anyhow::{Context, Result, bail};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Names handled inside the interpreter instead of by a launched program.
pub const BUILTIN_NAMES: [&str; 4] = ["cd", "pwd", "which", "exit"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing regular output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        redirections: Redirections,
        env: &mut Environment,
    ) -> ShellResult<ExitCode> {
        let _guard = StreamGuard::install(redirections.open()?)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let code = BuiltinCommand::execute(*self, &mut out, env)?;
        out.flush()?;
        Ok(code)
    }
}

/// Arguments `argh` could not turn into a command.
struct InvalidArgs {
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _redirections: Redirections,
        _env: &mut Environment,
    ) -> ShellResult<ExitCode> {
        eprintln!("{}", self.output.trim_end());
        Ok(FAILURE)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        debug!("{name} is a builtin");
        // words after `--` are never taken as flags or `help`
        let args: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        Some(match T::from_args(&[name], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs { output }),
        })
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {
    #[argh(positional)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let cwd = env::current_dir().context("pwd")?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current directory;
    /// further words are ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.args.into_iter().next().filter(|t| !t.is_empty()) else {
            bail!("cd: missing argument");
        };
        env::set_current_dir(&target).with_context(|| format!("cd: {target}"))?;
        debug!("working directory is now {target}");
        Ok(SUCCESS)
    }
}

#[derive(FromArgs)]
/// Locate a program in the directories listed in PATH.
pub struct Which {
    #[argh(positional, greedy)]
    /// exactly one program name; built-in names are rejected.
    pub names: Vec<String>,
}

impl Which {
    fn search(path_var: &str, name: &str) -> Option<PathBuf> {
        path_var
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(|dir| Path::new(dir).join(name))
            .find(|candidate| is_executable(candidate))
    }
}

impl BuiltinCommand for Which {
    fn name() -> &'static str {
        "which"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let [name] = self.names.as_slice() else {
            bail!("which: incorrect arguments");
        };
        if is_builtin(name) {
            bail!("which: incorrect arguments");
        }
        let found = env
            .get_var("PATH")
            .and_then(|path_var| Self::search(path_var, name));
        match found {
            Some(path) => {
                writeln!(stdout, "{}", path.display())?;
                Ok(SUCCESS)
            }
            None => bail!("which: no command found in PATH"),
        }
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

/// Printed by `exit` before the interpreter stops.
pub const FAREWELL: &str = "Exiting mysh";

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{FAREWELL}")?;
        env.should_exit = true;
        Ok(SUCCESS)
    }
}
