use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;

/// Exclude patterns behave like `fnmatch`: `*` may cross `/`.
const EXCLUDE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Expansion follows the shell and skips dot files unless asked for.
const EXPAND_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compiled glob patterns matched against full paths.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile every pattern, failing on the first malformed one.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Error> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True if any pattern matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.patterns
            .iter()
            .any(|p| p.matches_with(&path, EXCLUDE_OPTIONS))
    }
}

/// Expand a glob expression against the filesystem, in sorted order.
///
/// With `recursive` unset `**` degrades to `*`, so the expansion never
/// descends more than one level per path component. Entries that cannot be
/// read while expanding are skipped with a warning.
pub fn expand(pattern: &str, recursive: bool) -> Result<Vec<PathBuf>, Error> {
    let pattern = if recursive {
        pattern.to_string()
    } else {
        pattern.replace("**", "*")
    };

    let paths = glob::glob_with(&pattern, EXPAND_OPTIONS).map_err(|source| {
        Error::InvalidPattern {
            pattern: pattern.clone(),
            source,
        }
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => matches.push(path),
            Err(err) => warn!("Cannot read {}: {}", err.path().display(), err.error()),
        }
    }
    Ok(matches)
}

/// Lazy stream of the files under one root.
///
/// Created by [`walk`].
pub struct Walk<'a> {
    inner: Box<dyn Iterator<Item = io::Result<PathBuf>> + 'a>,
}

impl Iterator for Walk<'_> {
    type Item = io::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Enumerate the files under `root`, depth first in file name order.
///
/// A plain file is yielded as is. For a directory, subdirectories matching
/// an exclude pattern are pruned before they are read, and files matching
/// one are dropped. A missing root yields nothing.
pub fn walk<'a>(root: &Path, excludes: &'a PatternSet) -> Walk<'a> {
    let root = root.to_path_buf();

    if root.is_file() {
        return Walk {
            inner: Box::new(std::iter::once(Ok(root))),
        };
    }
    if !root.is_dir() {
        debug!("Nothing to walk at {}", root.display());
        return Walk {
            inner: Box::new(std::iter::empty()),
        };
    }

    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let pruned = excludes.matches(entry.path());
            if pruned {
                debug!("Pruning {}", entry.path().display());
            }
            !pruned
        })
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let path = entry.into_path();
                (path.is_file() && !excludes.matches(&path)).then_some(Ok(path))
            }
            Err(err) => Some(Err(io::Error::from(err))),
        });

    Walk {
        inner: Box::new(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, relative).unwrap();
        path
    }

    fn collect(root: &Path, excludes: &[&str]) -> Vec<PathBuf> {
        let excludes = PatternSet::compile(excludes).unwrap();
        walk(root, &excludes).collect::<io::Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "file.txt");
        // Exclusion only applies while traversing directories
        assert_eq!(collect(&file, &["**/file.txt"]), vec![file]);
    }

    #[test]
    fn test_directory_without_exclusions() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.txt");
        let b = touch(dir.path(), "sub/b.txt");
        let c = touch(dir.path(), "sub/deeper/c.txt");
        assert_eq!(collect(dir.path(), &[]), vec![a, b, c]);
    }

    #[test]
    fn test_excluded_file() {
        let dir = TempDir::new().unwrap();
        let keep = touch(dir.path(), "keep.txt");
        touch(dir.path(), "skip.txt");
        assert_eq!(collect(dir.path(), &["**/skip.txt"]), vec![keep]);
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        let keep = touch(dir.path(), "src/main.rs");
        touch(dir.path(), "src/__pycache__/main.pyc");
        touch(dir.path(), "target/debug/out.bin");
        let found = collect(dir.path(), &["**/__pycache__", "*/target"]);
        assert_eq!(found, vec![keep]);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(collect(&dir.path().join("nope"), &[]).is_empty());
    }

    #[test]
    fn test_walk_is_lazy_and_restartable() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.txt");
        touch(dir.path(), "b.txt");
        let excludes = PatternSet::default();

        let first = walk(dir.path(), &excludes).next().unwrap().unwrap();
        assert_eq!(first, a);
        assert_eq!(walk(dir.path(), &excludes).count(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternSet::compile(&["a[b"]).unwrap_err();
        assert!(err.to_string().contains("a[b"));
    }

    #[test]
    fn test_pattern_crosses_separators() {
        let set = PatternSet::compile(&["*ignore.txt"]).unwrap();
        assert!(set.matches(Path::new("/tmp/x/ignore.txt")));
        assert!(!set.matches(Path::new("/tmp/x/keep.txt")));
    }

    #[test]
    fn test_expand() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "a.txt");
        let b = touch(dir.path(), "b.txt");
        let nested = touch(dir.path(), "sub/c.txt");
        touch(dir.path(), ".hidden.txt");
        let root = dir.path().to_string_lossy().into_owned();

        assert_eq!(expand(&format!("{root}/*.txt"), false).unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(
            expand(&format!("{root}/**/*.txt"), true).unwrap(),
            vec![a, b, nested]
        );
        assert!(expand(&format!("{root}/missing.txt"), false).unwrap().is_empty());
    }
}
