//! Turns a raw command line into a sequence of owned tokens.
//!
//! Splitting happens in two passes. [`normalize_operators`] surrounds each of
//! `|`, `<` and `>` with whitespace so operators never stick to words, then
//! [`split_into_tokens`] cuts the result on whitespace and expands wildcard
//! tokens in place.

use crate::glob;
use tracing::debug;

/// Pipe operator token.
pub const PIPE: &str = "|";
/// Input redirection token.
pub const REDIRECT_IN: &str = "<";
/// Output redirection token.
pub const REDIRECT_OUT: &str = ">";

const OPERATORS: [char; 3] = ['|', '<', '>'];
const SEPARATORS: [char; 3] = [' ', '\t', '\n'];

fn is_separator(ch: char) -> bool {
    SEPARATORS.contains(&ch)
}

/// Insert a space before and after every operator that is not already
/// next to whitespace.
///
/// Applying it twice gives the same string as applying it once.
pub fn normalize_operators(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if !OPERATORS.contains(&ch) {
            out.push(ch);
            continue;
        }
        if out.chars().next_back().is_some_and(|prev| !is_separator(prev)) {
            out.push(' ');
        }
        out.push(ch);
        if chars.peek().is_some_and(|&next| !is_separator(next)) {
            out.push(' ');
        }
    }
    out
}

/// Split a command line into tokens.
///
/// Tokens whose file-name part contains `*` are replaced by the matching file
/// names, which may be none at all. At most `max_tokens - 1` tokens are kept;
/// the rest are dropped.
pub fn split_into_tokens(line: &str, max_tokens: usize) -> Vec<String> {
    let capacity = max_tokens.saturating_sub(1);
    let normalized = normalize_operators(line);
    let mut tokens = Vec::new();

    for word in normalized.split(is_separator).filter(|w| !w.is_empty()) {
        match glob::expand(word) {
            Some(matches) => tokens.extend(matches),
            None => tokens.push(word.to_string()),
        }
        if tokens.len() >= capacity {
            break;
        }
    }
    if tokens.len() > capacity {
        debug!("dropping {} token(s) over the limit", tokens.len() - capacity);
        tokens.truncate(capacity);
    }
    debug!(?tokens, "tokenized");
    tokens
}
