use std::path::PathBuf;

/// Tunables of the interpreter.
///
/// [`Default`] reproduces the classic behaviour: commands are looked up in
/// `/usr/local/bin`, `/usr/bin` and `/bin`, in that order.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directories searched, in order, for command names without a `/`.
    pub search_dirs: Vec<PathBuf>,
    /// Capacity of a token sequence; at most `max_tokens - 1` tokens are kept.
    pub max_tokens: usize,
    /// Longest command line accepted, in bytes.
    pub max_command_len: usize,
    /// Size of the chunks the line reader pulls from its source.
    pub read_chunk: usize,
    /// Interactive prompt.
    pub prompt: String,
    /// Printed once when an interactive session starts.
    pub welcome: String,
    /// Printed when interactive input ends.
    pub goodbye: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_dirs: ["/usr/local/bin", "/usr/bin", "/bin"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            max_tokens: 1000,
            max_command_len: 10_000,
            read_chunk: 16,
            prompt: "mysh> ".to_string(),
            welcome: "Welcome to my shell!".to_string(),
            goodbye: "Exiting".to_string(),
        }
    }
}

impl Config {
    /// Replace the search list, keeping every other setting.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        if !dirs.is_empty() {
            self.search_dirs = dirs;
        }
        self
    }
}
