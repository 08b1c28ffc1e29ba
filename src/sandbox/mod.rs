//! Sandbox materialization.
//!
//! A sandboxed target gets a managed mirror of its declared headers and
//! sources under `<sandbox_root>/<pkg>/<target>/{hdrs,srcs}/`. Sandbox
//! contents are a pure function of the declared globs and the source
//! file contents: commit writes a file only when its bytes would change,
//! and removes files no longer in the plan. Both properties are
//! observable - IDEs watch these trees, and a clean second pass performs
//! zero writes.

pub mod vcs;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::util::fs::copy_if_changed;

/// The mirror groups beneath a target's sandbox directory.
pub const HDRS_DIR: &str = "hdrs";
pub const SRCS_DIR: &str = "srcs";
/// Output directory for `generate_files` targets.
pub const OUT_DIR: &str = "out";
/// Repository checkouts live outside the per-target mirrors.
pub const VCS_DIR: &str = ".vcs";

/// A planned mirror for one target: destination relpath -> source file.
///
/// Keyed by destination so a later glob entry deterministically wins
/// when two bases map distinct files onto one relative path.
#[derive(Debug, Default)]
pub struct SandboxPlan {
    /// Absolute sandbox directory of the target
    /// (`<sandbox_root>/<pkg>/<target>`).
    root: PathBuf,
    hdrs: BTreeMap<PathBuf, PathBuf>,
    srcs: BTreeMap<PathBuf, PathBuf>,
}

/// What a commit did, for logging and idempotence tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub written: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl CommitStats {
    pub fn merge(&mut self, other: CommitStats) {
        self.written += other.written;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
    }

    /// True when the pass touched nothing.
    pub fn is_clean(&self) -> bool {
        self.written == 0 && self.removed == 0
    }
}

impl SandboxPlan {
    /// Plan for the target sandbox directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SandboxPlan {
            root: root.into(),
            ..Default::default()
        }
    }

    /// The target's sandbox directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Schedule a header file. `relpath` mirrors the file's position
    /// beneath its declaring glob's base.
    pub fn add_hdr(&mut self, relpath: impl Into<PathBuf>, source: impl Into<PathBuf>) {
        self.hdrs.insert(relpath.into(), source.into());
    }

    /// Schedule a source file.
    pub fn add_src(&mut self, relpath: impl Into<PathBuf>, source: impl Into<PathBuf>) {
        self.srcs.insert(relpath.into(), source.into());
    }

    /// The absolute destination a header lands at.
    pub fn hdr_dest(&self, relpath: &Path) -> PathBuf {
        self.root.join(HDRS_DIR).join(relpath)
    }

    /// The absolute destination a source lands at.
    pub fn src_dest(&self, relpath: &Path) -> PathBuf {
        self.root.join(SRCS_DIR).join(relpath)
    }

    /// Materialize the plan: copy changed files, sweep obsolete ones.
    pub fn commit(&self) -> Result<CommitStats> {
        let mut stats = CommitStats::default();
        for (group, files) in [(HDRS_DIR, &self.hdrs), (SRCS_DIR, &self.srcs)] {
            let group_root = self.root.join(group);
            let mut expected = Vec::with_capacity(files.len());
            for (relpath, source) in files {
                let dest = group_root.join(relpath);
                match copy_if_changed(source, &dest) {
                    Ok(true) => {
                        debug!(dest = %dest.display(), "sandbox write");
                        stats.written += 1;
                    }
                    Ok(false) => stats.unchanged += 1,
                    Err(e) => {
                        let io = std::io::Error::other(format!("{:#}", e));
                        return Err(Error::sandbox_io(dest, io));
                    }
                }
                expected.push(dest);
            }
            stats.removed += sweep_obsolete(&group_root, &expected)?;
        }
        Ok(stats)
    }
}

/// Remove files under `root` that are not in `expected`, then prune
/// directories left empty.
fn sweep_obsolete(root: &Path, expected: &[PathBuf]) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let expected: std::collections::HashSet<&Path> =
        expected.iter().map(PathBuf::as_path).collect();
    let mut removed = 0;
    for entry in WalkDir::new(root)
        .contents_first(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() {
            if !expected.contains(path) {
                fs::remove_file(path).map_err(|e| Error::sandbox_io(path, e))?;
                debug!(path = %path.display(), "sandbox sweep");
                removed += 1;
            }
        } else if entry.file_type().is_dir() && path != root {
            // Succeeds only on empty directories.
            let _ = fs::remove_dir(path);
        }
    }
    Ok(removed)
}

/// The sandbox directory of a target.
pub fn target_root(sandbox_root: &Path, package: &str, target: &str) -> PathBuf {
    sandbox_root.join(package).join(target)
}

/// The checkout directory of a repository target.
pub fn vcs_root(sandbox_root: &Path, package: &str, target: &str) -> PathBuf {
    sandbox_root.join(VCS_DIR).join(package).join(target)
}
