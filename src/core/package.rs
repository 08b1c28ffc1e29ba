//! Package - a directory of targets.
//!
//! A package's name equals its workspace-relative directory path.
//! Targets keep their declaration order; names are unique per package.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::target::Target;
use crate::error::{Error, Result};
use crate::util::InternedString;

/// A directory containing a `BUILD.builderer` description.
#[derive(Debug, Clone)]
pub struct Package {
    /// Workspace-relative directory path, forward-slash separated.
    name: InternedString,

    /// Same path as `name`, as a `Path` for joining.
    dir: PathBuf,

    /// Targets in declaration order.
    targets: Vec<Target>,

    /// Name -> index into `targets`.
    index: HashMap<InternedString, usize>,
}

impl Package {
    /// Create an empty package for the given workspace-relative directory.
    pub fn new(name: impl Into<InternedString>) -> Self {
        let name = name.into();
        Package {
            name,
            dir: PathBuf::from(name.as_str()),
            targets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert a target; duplicate names within a package are fatal.
    pub fn add_target(&mut self, target: impl Into<Target>) -> Result<()> {
        let target = target.into();
        let name = target.name();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateTarget {
                package: self.name.to_string(),
                target: name.to_string(),
            });
        }
        self.index.insert(name, self.targets.len());
        self.targets.push(target);
        Ok(())
    }

    /// The package name (equals its workspace-relative directory).
    pub fn name(&self) -> InternedString {
        self.name
    }

    /// The package directory relative to the workspace root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All targets in declaration order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.index
            .get(name)
            .map(|&i| &self.targets[i])
    }

    /// Whether this package has no targets left (after elision).
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Drop targets not satisfying `keep`, preserving declaration order.
    pub(crate) fn retain_targets(&mut self, mut keep: impl FnMut(&Target) -> bool) {
        self.targets.retain(|t| keep(t));
        self.index = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name(), i))
            .collect();
    }
}
