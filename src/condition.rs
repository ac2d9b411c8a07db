//! `then` / `else` prefixes that run a command depending on Last-Status.

use crate::command::ExitCode;

/// Prefix that runs the rest of the line only after a success.
pub const THEN: &str = "then";
/// Prefix that runs the rest of the line only after a failure.
pub const ELSE: &str = "else";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Then,
    Else,
}

impl Condition {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            THEN => Some(Self::Then),
            ELSE => Some(Self::Else),
            _ => None,
        }
    }

    pub fn holds(self, last_status: ExitCode) -> bool {
        match self {
            Self::Then => last_status == 0,
            Self::Else => last_status != 0,
        }
    }
}

/// Decide whether the command in `tokens` runs.
///
/// A leading `then` or `else` is removed from `tokens` when the command is
/// allowed to run. A vetoed command is left untouched and nothing else should
/// happen for it: no file is opened, no process is spawned and Last-Status
/// keeps its value.
pub fn should_run(tokens: &mut Vec<String>, last_status: ExitCode) -> bool {
    let Some(condition) = tokens.first().and_then(|t| Condition::from_token(t)) else {
        return true;
    };
    if !condition.holds(last_status) {
        return false;
    }
    tokens.remove(0);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_then_runs_after_success_only() {
        let mut t = tokens(&["then", "echo", "ok"]);
        assert!(should_run(&mut t, 0));
        assert_eq!(t, vec!["echo", "ok"]);

        let mut t = tokens(&["then", "echo", "ok"]);
        assert!(!should_run(&mut t, 1));
        assert_eq!(t, vec!["then", "echo", "ok"]);
    }

    #[test]
    fn test_else_is_complement_of_then() {
        for status in [0, 1, 2, 127] {
            let mut then = tokens(&["then", "true"]);
            let mut otherwise = tokens(&["else", "true"]);
            assert_ne!(should_run(&mut then, status), should_run(&mut otherwise, status));
        }
    }

    #[test]
    fn test_other_commands_are_unconditional() {
        let mut t = tokens(&["echo", "then"]);
        assert!(should_run(&mut t, 1));
        assert_eq!(t, vec!["echo", "then"]);
        assert!(should_run(&mut Vec::new(), 1));
    }
}
