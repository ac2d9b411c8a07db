use crate::command::{ExitCode, SUCCESS};
use std::collections::HashMap;
use std::env as stdenv;

/// Mutable state threaded through every command the interpreter runs.
///
/// The environment contains:
/// - `vars`: variables visible to launched programs and used for the `PATH` lookup of `which`.
/// - `last_status`: exit code of the most recently executed command (Last-Status).
/// - `should_exit`: set by the `exit` built-in; the read loop stops once it is true.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Outcome of the previous command; 0 means success.
    pub last_status: ExitCode,
    /// When set to true, indicates that the read loop should stop.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the variables of the current process. Last-Status starts as success.
    pub fn new() -> Self {
        Self {
            vars: stdenv::vars().collect(),
            last_status: SUCCESS,
            should_exit: false,
        }
    }

    /// An environment with no variables at all; handy for tests.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
            last_status: SUCCESS,
            should_exit: false,
        }
    }

    /// Get the value of a variable from `self.vars`.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Whether the previous command succeeded.
    pub fn last_succeeded(&self) -> bool {
        self.last_status == SUCCESS
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
