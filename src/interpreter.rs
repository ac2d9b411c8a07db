use crate::builtin::{Cd, Exit, Pwd, Which};
use crate::command::{CommandFactory, ExitCode, FAILURE};
use crate::condition;
use crate::config::Config;
use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::external::ExternalFactory;
use crate::lexer;
use crate::pipeline::{self, Stages};
use crate::reader::LineReader;
use crate::redirect::Redirections;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Read;
use tracing::{debug, info};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-in commands of this crate, see [`crate::builtin`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A small command interpreter: tokenizes lines, honours `then`/`else`,
/// redirections and a single pipe, and runs built-ins or programs.
///
/// The interpreter owns an [`Environment`] holding Last-Status, and a list of
/// [`CommandFactory`] objects that are asked in order to create a command for
/// a name. See [`Interpreter::new`] for the default set.
///
/// Example
/// ```no_run
/// use mysh::{Config, Interpreter};
/// let mut sh = Interpreter::new(Config::default());
/// let code = sh.execute_line("ls -l | wc -l");
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    config: Config,
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with the built-ins `cd`, `pwd`, `which`, `exit`
    /// followed by the external command launcher.
    pub fn new(config: Config) -> Self {
        Self::with_environment(config, Environment::new())
    }

    pub fn with_environment(config: Config, env: Environment) -> Self {
        let commands: Vec<Box<dyn CommandFactory>> = vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Which>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(ExternalFactory::new(config.search_dirs.clone())),
        ];
        Self {
            config,
            env,
            commands,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Exit code of the last command that ran.
    pub fn last_status(&self) -> ExitCode {
        self.env.last_status
    }

    /// Whether `exit` has been executed.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Run one command line and return the resulting Last-Status.
    ///
    /// Blank lines and commands vetoed by `then`/`else` leave Last-Status as
    /// it was.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        if line.len() > self.config.max_command_len {
            return self.fail(ShellError::LineTooLong {
                limit: self.config.max_command_len,
            });
        }
        let tokens = lexer::split_into_tokens(line, self.config.max_tokens);
        if tokens.is_empty() {
            return self.env.last_status;
        }

        match pipeline::split(tokens) {
            Ok(Stages::Single(tokens)) => self.execute_command(tokens),
            Ok(Stages::Pair(first, second)) => {
                match pipeline::run_pair(first, second, |stage| self.execute_command(stage)) {
                    Ok(code) => self.record(code),
                    Err(e) => self.fail(e),
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// Run a single pipeline stage: conditional check, redirections, then
    /// the built-in or program.
    pub fn execute_command(&mut self, mut tokens: Vec<String>) -> ExitCode {
        if !condition::should_run(&mut tokens, self.env.last_status) {
            debug!(last_status = self.env.last_status, "skipped by condition");
            return self.env.last_status;
        }
        match self.dispatch(tokens) {
            Ok(code) => self.record(code),
            Err(e) => self.fail(e),
        }
    }

    fn dispatch(&mut self, mut tokens: Vec<String>) -> Result<ExitCode> {
        let redirections = Redirections::extract(&mut tokens)?;
        let (name, args) = tokens.split_first().ok_or(ShellError::MissingCommand)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let command = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, &args))
            .ok_or_else(|| ShellError::CommandNotFound(name.clone()))?;
        command.execute(redirections, &mut self.env)
    }

    fn record(&mut self, code: ExitCode) -> ExitCode {
        debug!(code, "last status");
        self.env.last_status = code;
        code
    }

    fn fail(&mut self, err: ShellError) -> ExitCode {
        eprintln!("{err:#}");
        self.record(FAILURE)
    }

    /// Execute every line of `reader` until input ends or `exit` runs.
    pub fn run_batch<R: Read>(&mut self, reader: LineReader<R>) {
        for line in reader {
            self.execute_line(&line);
            if self.env.should_exit {
                info!("exit requested");
                break;
            }
        }
    }

    /// Interactive read-eval-print loop with line editing and history.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        println!("{}", self.config.welcome);

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.execute_line(&line);
                    if self.env.should_exit {
                        info!("exit requested");
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        println!("{}", self.config.goodbye);
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
