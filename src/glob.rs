//! Single-`*` wildcard expansion against directory entries.

use std::fs;
use std::path::Path;
use tracing::debug;

/// The character that turns a token into a pattern.
pub const WILDCARD: char = '*';

/// A token split into the pieces needed for matching.
///
/// `dir/pre*suf` becomes `dir = Some("dir")`, `prefix = "pre"`, `suffix = "suf"`.
/// Only the first `*` of the name part is a wildcard; later ones are literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern<'a> {
    dir: Option<&'a str>,
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> Pattern<'a> {
    /// Returns `None` when the name part (after the last `/`) has no `*`.
    pub fn parse(token: &'a str) -> Option<Self> {
        let (dir, name) = match token.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, token),
        };
        let (prefix, suffix) = name.split_once(WILDCARD)?;
        Some(Self {
            dir,
            prefix,
            suffix,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        name.len() >= self.prefix.len() + self.suffix.len()
            && name.starts_with(self.prefix)
            && name.ends_with(self.suffix)
    }

    /// List the matching regular, non-hidden files, sorted by name.
    ///
    /// An unreadable directory yields no matches.
    pub fn expand(&self) -> Vec<String> {
        let listing = match self.dir {
            Some("") => Path::new("/"),
            Some(dir) => Path::new(dir),
            None => Path::new("."),
        };
        let entries = match fs::read_dir(listing) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("cannot list {}: {e}", listing.display());
                return Vec::new();
            }
        };

        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(raw) => {
                        debug!("skipping non-UTF-8 entry {raw:?}");
                        return None;
                    }
                };
                if name.starts_with('.') || !self.matches(&name) {
                    return None;
                }
                // follow symlinks, like stat(2)
                let meta = fs::metadata(entry.path()).ok()?;
                meta.is_file().then(|| self.join(&name))
            })
            .collect();
        found.sort();
        found
    }

    fn join(&self, name: &str) -> String {
        match self.dir {
            Some(dir) => format!("{dir}/{name}"),
            None => name.to_string(),
        }
    }
}

/// Expand `token` if it is a pattern.
///
/// `None` means the token is not a pattern and should be kept verbatim;
/// `Some` holds the matches, possibly none.
pub fn expand(token: &str) -> Option<Vec<String>> {
    let pattern = Pattern::parse(token)?;
    let matches = pattern.expand();
    debug!("{token} expanded to {} file(s)", matches.len());
    Some(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use tempfile::TempDir;

    fn sample_dir() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.txt", "b.txt", "note.md", ".hidden.txt", "aba"] {
            File::create(dir.path().join(name)).expect("touch");
        }
        fs::create_dir(dir.path().join("sub.txt")).expect("mkdir");
        dir
    }

    fn in_dir(dir: &TempDir, pattern: &str) -> String {
        format!("{}/{pattern}", dir.path().display())
    }

    #[test]
    fn test_parse_splits_directory_and_name() {
        let p = Pattern::parse("src/ma*.rs").unwrap();
        assert_eq!(
            p,
            Pattern {
                dir: Some("src"),
                prefix: "ma",
                suffix: ".rs"
            }
        );
        assert_eq!(Pattern::parse("plain"), None);
        assert_eq!(Pattern::parse("*/plain"), None);
    }

    #[test]
    fn test_only_first_star_is_wildcard() {
        let p = Pattern::parse("a*b*").unwrap();
        assert!(p.matches("axxb*"));
        assert!(!p.matches("axxbyy"));
    }

    #[test]
    fn test_prefix_and_suffix_may_not_overlap() {
        let p = Pattern::parse("ab*ba").unwrap();
        assert!(!p.matches("aba"));
        assert!(p.matches("abba"));
    }

    #[test]
    fn test_expands_regular_visible_files_only() {
        let dir = sample_dir();
        let found: HashSet<String> = expand(&in_dir(&dir, "*.txt")).unwrap().into_iter().collect();
        let expected: HashSet<String> = ["a.txt", "b.txt"].iter().map(|n| in_dir(&dir, n)).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_results_are_sorted() {
        let dir = sample_dir();
        let found = expand(&in_dir(&dir, "*")).unwrap();
        let expected: Vec<String> = ["a.txt", "aba", "b.txt", "note.md"]
            .iter()
            .map(|n| in_dir(&dir, n))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let dir = sample_dir();
        assert_eq!(expand(&in_dir(&dir, "*.rs")), Some(Vec::new()));
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let dir = sample_dir();
        assert_eq!(expand(&in_dir(&dir, "nope/*.txt")), Some(Vec::new()));
    }

    #[test]
    fn test_non_pattern_is_not_expanded() {
        assert_eq!(expand("note.md"), None);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = sample_dir();
        File::create(dir.path().join(OsStr::from_bytes(b"c\xff.txt"))).expect("touch");
        let found = expand(&in_dir(&dir, "*.txt")).unwrap();
        assert_eq!(found, vec![in_dir(&dir, "a.txt"), in_dir(&dir, "b.txt")]);
    }
}
