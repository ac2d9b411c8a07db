//! A small command interpreter.
//!
//! Lines are read with [`LineReader`] (or an interactive editor), split into
//! tokens with wildcard expansion, and executed by an [`Interpreter`]. The
//! interpreter understands:
//!
//! - `then CMD` / `else CMD`: run `CMD` only after a success / a failure;
//! - `< FILE` and `> FILE` redirections;
//! - a single pipe `A | B`, with both stages running as separate processes;
//! - the built-ins `cd`, `pwd`, `which` and `exit`.
//!
//! Anything else is looked up in a fixed list of directories (see
//! [`Config::search_dirs`]) or, when it contains a `/`, run as a path.

mod builtin;
pub mod command;
pub mod condition;
pub mod config;
pub mod env;
pub mod error;
mod external;
pub mod glob;
mod interpreter;
pub mod lexer;
pub mod pipeline;
pub mod reader;
pub mod redirect;

pub use config::Config;
pub use error::ShellError;
pub use interpreter::Interpreter;
pub use reader::LineReader;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that change the working directory, swap standard
    /// streams or launch programs sharing the test's stdout.
    pub fn serial() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
