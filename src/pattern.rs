//! Glob matching and recursive file enumeration.
//!
//! This module provides the shell-style wildcard matching used in two places:
//!
//! - **File enumeration**: [`FileEnumerator`] walks directory roots and keeps
//!   the regular files accepted by include/exclude patterns.
//! - **Collection queries**: [`WildcardFilter`] matches data source names and
//!   metadata values, with an optional leading `!` that inverts the match.
//!
//! # Pattern Syntax
//!
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]` / `[a-z]` character classes are accepted as well
//!
//! A pattern without a `/` is matched against the file's base name. A pattern
//! containing `/` is matched against the path relative to the enumeration
//! root, written with `/` separators on every platform.
//!
//! # Ordering
//!
//! Roots are processed in the order given. Within a root, files are sorted by
//! their `/`-separated relative path as plain strings (`a.txt` before
//! `a/b.txt`), so the same tree always yields the same sequence. Files reached through several roots are listed
//! once per root.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tmplgen_cli::pattern::FileEnumerator;
//! use std::path::Path;
//!
//! # fn example() -> tmplgen_cli::core::Result<()> {
//! let enumerator = FileEnumerator::new(&["*.csv".to_string()], &["tmp/*".to_string()])?;
//! for file in enumerator.enumerate(&[Path::new("data")])? {
//!     println!("{} ({})", file.path.display(), file.relative_path);
//! }
//! # Ok(())
//! # }
//! ```

use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::{DataSourceError, Result};

/// A compiled glob pattern.
///
/// Matching is case-sensitive on every platform.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    original_pattern: String,
}

impl PatternMatcher {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::InvalidPattern`] for malformed patterns such
    /// as an unclosed character class.
    pub fn new(pattern_str: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern_str).map_err(|e| DataSourceError::InvalidPattern {
            pattern: pattern_str.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            original_pattern: pattern_str.to_string(),
        })
    }

    /// Checks a plain string against the pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern.matches(candidate)
    }

    /// Checks a file against the pattern.
    ///
    /// `relative_path` uses `/` separators. Patterns without a separator only
    /// look at the last path segment.
    pub fn matches_file(&self, relative_path: &str) -> bool {
        if self.original_pattern.contains('/') {
            self.pattern.matches(relative_path)
        } else {
            let base_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
            self.pattern.matches(base_name)
        }
    }

    /// Returns the pattern string used to create this matcher.
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }
}

/// Wildcard filter with optional `!` negation.
///
/// `"*.csv"` keeps everything ending in `.csv`; `"!pom.xml"` keeps everything
/// except `pom.xml`.
#[derive(Debug, Clone)]
pub struct WildcardFilter {
    matcher: PatternMatcher,
    negated: bool,
}

impl WildcardFilter {
    /// Compiles a filter, stripping a leading `!`.
    pub fn new(pattern: &str) -> Result<Self> {
        let (negated, rest) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };

        Ok(Self {
            matcher: PatternMatcher::new(rest)?,
            negated,
        })
    }

    /// Returns true if `value` passes the filter.
    pub fn accepts(&self, value: &str) -> bool {
        self.matcher.matches(value) != self.negated
    }
}

/// A regular file found under an enumeration root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// The root the file was found under, as given.
    pub root: PathBuf,
    /// Path of the file, `root` joined with the relative path.
    pub path: PathBuf,
    /// Path relative to `root` with `/` separators. For a root that is itself
    /// a file this is the file name.
    pub relative_path: String,
}

/// Recursively lists regular files accepted by include and exclude patterns.
///
/// A file is accepted if it matches any include pattern (no include patterns
/// means everything matches) and no exclude pattern. Blank patterns are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct FileEnumerator {
    includes: Vec<PatternMatcher>,
    excludes: Vec<PatternMatcher>,
}

impl FileEnumerator {
    /// Compiles include and exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::InvalidPattern`] for the first pattern that
    /// does not compile.
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self> {
        Ok(Self {
            includes: compile_all(includes)?,
            excludes: compile_all(excludes)?,
        })
    }

    /// Returns true if no include or exclude pattern is configured.
    pub fn is_unfiltered(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Applies the include/exclude rule to a relative, `/`-separated path.
    pub fn accepts(&self, relative_path: &str) -> bool {
        let included = self.includes.is_empty()
            || self.includes.iter().any(|p| p.matches_file(relative_path));
        let excluded = self.excludes.iter().any(|p| p.matches_file(relative_path));

        trace!("Checking '{}': included={} excluded={}", relative_path, included, excluded);
        included && !excluded
    }

    /// Walks every root and returns the accepted regular files.
    ///
    /// # Errors
    ///
    /// Returns [`DataSourceError::RootNotFound`] for a root that does not
    /// exist, or [`DataSourceError::Io`] when the walk fails part way. An
    /// existing root with no accepted files yields an empty list.
    pub fn enumerate<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Vec<MatchedFile>> {
        let mut matches = Vec::new();

        for root in roots {
            self.enumerate_root(root.as_ref(), &mut matches)?;
        }

        Ok(matches)
    }

    fn enumerate_root(&self, root: &Path, matches: &mut Vec<MatchedFile>) -> Result<()> {
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DataSourceError::RootNotFound {
                path: root.display().to_string(),
            },
            _ => DataSourceError::Io(e),
        })?;

        let before = matches.len();

        if metadata.is_file() {
            let relative_path = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.accepts(&relative_path) {
                matches.push(MatchedFile {
                    root: root.to_path_buf(),
                    path: root.to_path_buf(),
                    relative_path,
                });
            }
            return Ok(());
        }

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative_path = to_slash_path(relative);

            if self.accepts(&relative_path) {
                matches.push(MatchedFile {
                    root: root.to_path_buf(),
                    path: entry.path().to_path_buf(),
                    relative_path,
                });
            }
        }

        matches[before..].sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        debug!("Enumerated {} file(s) under {}", matches.len() - before, root.display());
        Ok(())
    }
}

/// Lists the files under `roots` accepted by the patterns.
///
/// Convenience wrapper around [`FileEnumerator`] returning plain paths.
pub fn enumerate_files<P: AsRef<Path>, S: AsRef<str>>(
    roots: &[P],
    includes: &[S],
    excludes: &[S],
) -> Result<Vec<PathBuf>> {
    let enumerator = FileEnumerator::new(includes, excludes)?;
    Ok(enumerator.enumerate(roots)?.into_iter().map(|m| m.path).collect())
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PatternMatcher>> {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PatternMatcher::new)
        .collect()
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NONE: &[&str] = &[];

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::create_dir_all(base.join("nested/deeper")).unwrap();
        fs::write(base.join("pom.xml"), "<project/>").unwrap();
        fs::write(base.join("README.md"), "# readme").unwrap();
        fs::write(base.join("users.csv"), "name\n").unwrap();
        fs::write(base.join("nested/contract.md"), "contract").unwrap();
        fs::write(base.join("nested/deeper/data.json"), "{}").unwrap();

        temp_dir
    }

    fn relative_paths(files: &[MatchedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_pattern_matcher_wildcards() {
        let pattern = PatternMatcher::new("*.md").unwrap();
        assert!(pattern.matches("README.md"));
        assert!(pattern.matches(".md"));
        assert!(!pattern.matches("README.mdx"));

        let pattern = PatternMatcher::new("user?.csv").unwrap();
        assert!(pattern.matches("users.csv"));
        assert!(!pattern.matches("user.csv"));
        assert!(!pattern.matches("userss.csv"));
    }

    #[test]
    fn test_pattern_matcher_is_case_sensitive() {
        let pattern = PatternMatcher::new("*.MD").unwrap();
        assert!(!pattern.matches("test.md"));
        assert!(pattern.matches("test.MD"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(PatternMatcher::new("[abc"), Err(DataSourceError::InvalidPattern { .. })));
    }

    #[test]
    fn test_matches_file_uses_base_name_without_separator() {
        let pattern = PatternMatcher::new("*.json").unwrap();
        assert!(pattern.matches_file("nested/deeper/data.json"));

        let pattern = PatternMatcher::new("nested/*.md").unwrap();
        assert!(pattern.matches_file("nested/contract.md"));
        assert!(!pattern.matches_file("contract.md"));
    }

    #[test]
    fn test_wildcard_filter_negation() {
        let filter = WildcardFilter::new("!pom.xml").unwrap();
        assert!(!filter.accepts("pom.xml"));
        assert!(filter.accepts("README.md"));

        let filter = WildcardFilter::new("*.xml").unwrap();
        assert!(filter.accepts("pom.xml"));
        assert!(!filter.accepts("README.md"));
    }

    #[test]
    fn test_enumerate_all_files_in_order() {
        let temp_dir = sample_tree();
        let enumerator = FileEnumerator::new(NONE, NONE).unwrap();

        let files = enumerator.enumerate(&[temp_dir.path()]).unwrap();
        assert_eq!(
            relative_paths(&files),
            vec!["README.md", "nested/contract.md", "nested/deeper/data.json", "pom.xml", "users.csv"]
        );
    }

    #[test]
    fn test_order_is_by_whole_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a")).unwrap();
        fs::write(temp_dir.path().join("a/b.txt"), "nested").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "top").unwrap();

        let files = FileEnumerator::new(NONE, NONE).unwrap().enumerate(&[temp_dir.path()]).unwrap();
        assert_eq!(relative_paths(&files), vec!["a.txt", "a/b.txt"]);
    }

    #[test]
    fn test_enumerate_is_deterministic() {
        let temp_dir = sample_tree();
        let enumerator = FileEnumerator::new(&["*.md", "*.csv"], NONE).unwrap();

        let first = enumerator.enumerate(&[temp_dir.path()]).unwrap();
        let second = enumerator.enumerate(&[temp_dir.path()]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_include_single_extension() {
        let temp_dir = sample_tree();
        let files = enumerate_files(&[temp_dir.path()], &["*.xml"], NONE).unwrap();
        assert_eq!(files, vec![temp_dir.path().join("pom.xml")]);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let temp_dir = sample_tree();
        let enumerator = FileEnumerator::new(&["*.md"], &["nested/*"]).unwrap();

        let files = enumerator.enumerate(&[temp_dir.path()]).unwrap();
        assert_eq!(relative_paths(&files), vec!["README.md"]);
    }

    #[test]
    fn test_blank_patterns_are_ignored() {
        let enumerator = FileEnumerator::new(&["", "  "], &[""]).unwrap();
        assert!(enumerator.is_unfiltered());
        assert!(enumerator.accepts("anything.txt"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let result = FileEnumerator::default().enumerate(&[missing]);
        assert!(matches!(result, Err(DataSourceError::RootNotFound { .. })));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let temp_dir = sample_tree();
        let files = enumerate_files(&[temp_dir.path()], &["*.nothing"], NONE).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_file_root_is_filtered_by_name() {
        let temp_dir = sample_tree();
        let pom = temp_dir.path().join("pom.xml");
        let readme = temp_dir.path().join("README.md");

        let enumerator = FileEnumerator::new(&["*.xml"], NONE).unwrap();
        let files = enumerator.enumerate(&[&pom, &readme]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, pom);
        assert_eq!(files[0].relative_path, "pom.xml");
    }

    #[test]
    fn test_duplicate_roots_are_not_deduplicated() {
        let temp_dir = sample_tree();
        let files = enumerate_files(&[temp_dir.path(), temp_dir.path()], &["*.csv"], NONE).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], files[1]);
    }
}
