//! Glob-based file enumeration with include/exclude semantics.
//!
//! A pattern list mixes includes and `!`-prefixed excludes. The result is
//! the union of include matches minus the union of exclude matches,
//! deduplicated and ordered lexicographically by relative path. Matching
//! is case-sensitive on every platform so enumeration is deterministic
//! across machines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::util::fs::to_slash;

/// Split a pattern list into include and exclude patterns.
pub fn split_patterns(patterns: &[String]) -> (Vec<&str>, Vec<&str>) {
    let includes = patterns
        .iter()
        .filter(|p| !p.starts_with('!'))
        .map(String::as_str)
        .collect();
    let excludes = patterns
        .iter()
        .filter_map(|p| p.strip_prefix('!'))
        .collect();
    (includes, excludes)
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    // Character classes are not part of the pattern language; brackets
    // match themselves.
    let literal_brackets = pattern.replace('[', "[[]");
    Pattern::new(&literal_brackets).map_err(|e| Error::Ingest {
        path: PathBuf::from(pattern),
        message: format!("invalid glob pattern: {}", e),
    })
}

/// Per-pass cache of directory listings.
///
/// Globbing the same base repeatedly (hdrs and srcs of every target)
/// would otherwise rescan the tree; the cache is discarded between
/// generate passes.
#[derive(Default)]
pub struct GlobCache {
    listings: HashMap<PathBuf, Rc<Vec<PathBuf>>>,
}

impl GlobCache {
    pub fn new() -> Self {
        GlobCache::default()
    }

    /// All files beneath `base`, as base-relative paths in lexicographic
    /// order. A missing base yields the empty listing.
    fn listing(&mut self, base: &Path) -> Rc<Vec<PathBuf>> {
        if let Some(cached) = self.listings.get(base) {
            return Rc::clone(cached);
        }
        let mut files = Vec::new();
        if base.is_dir() {
            for entry in WalkDir::new(base)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() {
                    if let Ok(rel) = entry.path().strip_prefix(base) {
                        files.push(rel.to_path_buf());
                    }
                }
            }
        }
        files.sort_by_key(|p| to_slash(p));
        let files = Rc::new(files);
        self.listings.insert(base.to_path_buf(), Rc::clone(&files));
        files
    }
}

/// A file matched by an include pattern, remembered with the base its
/// pattern was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Absolute path of the file on disk.
    pub path: PathBuf,
    /// The glob's base directory.
    pub base: PathBuf,
    /// Position of the file beneath the base.
    pub relpath: PathBuf,
}

/// Evaluate include patterns against their bases, then subtract excludes.
///
/// Each entry of `includes` and `excludes` pairs a base directory with a
/// base-relative pattern. Results are deduplicated by absolute path and
/// sorted lexicographically by slash-separated relative path.
pub fn enumerate(
    includes: &[(PathBuf, String)],
    excludes: &[(PathBuf, String)],
    cache: &mut GlobCache,
) -> Result<Vec<MatchedFile>> {
    let options = match_options();

    let mut matched: Vec<MatchedFile> = Vec::new();
    for (base, pattern) in includes {
        let compiled = compile(pattern)?;
        for rel in cache.listing(base).iter() {
            if compiled.matches_path_with(rel, options) {
                matched.push(MatchedFile {
                    path: base.join(rel),
                    base: base.clone(),
                    relpath: rel.clone(),
                });
            }
        }
    }

    let compiled_excludes: Vec<(&PathBuf, Pattern)> = excludes
        .iter()
        .map(|(base, pattern)| compile(pattern).map(|p| (base, p)))
        .collect::<Result<_>>()?;

    matched.retain(|file| {
        !compiled_excludes.iter().any(|(base, pattern)| {
            file.path
                .strip_prefix(base)
                .map(|rel| pattern.matches_path_with(rel, options))
                .unwrap_or(false)
        })
    });

    matched.sort_by(|a, b| to_slash(&a.relpath).cmp(&to_slash(&b.relpath)));
    matched.dedup_by(|a, b| a.path == b.path);
    Ok(matched)
}

/// Enumerate a pattern list against a single base directory.
pub fn enumerate_under(
    base: &Path,
    patterns: &[String],
    cache: &mut GlobCache,
) -> Result<Vec<MatchedFile>> {
    let (includes, excludes) = split_patterns(patterns);
    let includes: Vec<(PathBuf, String)> = includes
        .into_iter()
        .map(|p| (base.to_path_buf(), p.to_string()))
        .collect();
    let excludes: Vec<(PathBuf, String)> = excludes
        .into_iter()
        .map(|p| (base.to_path_buf(), p.to_string()))
        .collect();
    enumerate(&includes, &excludes, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn rels(files: &[MatchedFile]) -> Vec<String> {
        files.iter().map(|f| to_slash(&f.relpath)).collect()
    }

    #[test]
    fn test_include_exclude_union_semantics() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.cpp");
        touch(tmp.path(), "src/platform/win.cpp");
        touch(tmp.path(), "src/b_test.cpp");
        touch(tmp.path(), "src/c.cpp");

        let patterns = vec![
            "src/**/*.cpp".to_string(),
            "!src/platform/**".to_string(),
            "!src/**/*_test.cpp".to_string(),
        ];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a.cpp", "src/c.cpp"]);
    }

    #[test]
    fn test_missing_base_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let patterns = vec!["src/**/*.cpp".to_string()];
        let files = enumerate_under(&tmp.path().join("nope"), &patterns, &mut GlobCache::new())
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_exclude_matching_nothing_is_noop() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.cpp");

        let patterns = vec!["src/*.cpp".to_string(), "!gen/**".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a.cpp"]);
    }

    #[test]
    fn test_star_does_not_cross_separators() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.cpp");
        touch(tmp.path(), "src/sub/b.cpp");

        let patterns = vec!["src/*.cpp".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a.cpp"]);
    }

    #[test]
    fn test_question_mark_single_character() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.c");
        touch(tmp.path(), "src/ab.c");

        let patterns = vec!["src/?.c".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a.c"]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/Main.cpp");

        let patterns = vec!["src/main.cpp".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_overlapping_includes_dedup() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/a.cpp");

        let patterns = vec!["src/*.cpp".to_string(), "src/**/*.cpp".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a.cpp"]);
    }

    #[test]
    fn test_brackets_are_literal() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/[x].c");
        touch(tmp.path(), "src/x.c");

        let patterns = vec!["src/[x].c".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/[x].c"]);
    }

    #[test]
    fn test_deterministic_lexicographic_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/z.cpp");
        touch(tmp.path(), "src/a/deep.cpp");
        touch(tmp.path(), "src/b.cpp");

        let patterns = vec!["src/**/*.cpp".to_string()];
        let files = enumerate_under(tmp.path(), &patterns, &mut GlobCache::new()).unwrap();
        assert_eq!(rels(&files), vec!["src/a/deep.cpp", "src/b.cpp", "src/z.cpp"]);
    }
}
