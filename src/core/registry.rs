//! Target registry - everything ingestion produces.
//!
//! The registry collects buildtools, named configs, packages and rule
//! wrappers while description files are evaluated. Once a `Workspace` is
//! configured from it, the registry is frozen.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::ConfigRecord;
use crate::core::package::Package;
use crate::error::{Error, Result};
use crate::generators::GeneratorFactory;
use crate::util::InternedString;

/// A user-defined rule wrapper; always reduces to builtin target
/// constructors on the package it is applied to.
pub type Rule = Arc<dyn Fn(&mut Package) -> Result<()> + Send + Sync>;

/// The mutable ingestion-time registry.
#[derive(Default)]
pub struct Registry {
    buildtools: HashMap<String, GeneratorFactory>,
    configs: Vec<ConfigRecord>,
    packages: Vec<Package>,
    package_index: HashMap<InternedString, usize>,
    rules: HashMap<String, Rule>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("buildtools", &self.buildtools.keys().collect::<Vec<_>>())
            .field("configs", &self.configs)
            .field("packages", &self.packages)
            .field("package_index", &self.package_index)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a back-end factory under a unique buildtool name.
    pub fn add_buildtool(
        &mut self,
        name: impl Into<String>,
        factory: GeneratorFactory,
    ) -> Result<()> {
        let name = name.into();
        if self.buildtools.contains_key(&name) {
            return Err(Error::DuplicateBuildtool { buildtool: name });
        }
        self.buildtools.insert(name, factory);
        Ok(())
    }

    /// Register a named configuration record.
    pub fn add_config(&mut self, config: ConfigRecord) -> Result<()> {
        if self.configs.iter().any(|c| c.name() == config.name()) {
            return Err(Error::DuplicateConfig {
                config: config.name().to_string(),
            });
        }
        self.configs.push(config);
        Ok(())
    }

    /// Create a package bound to the description file's directory.
    ///
    /// The supplied name must equal the workspace-relative directory the
    /// description lives in.
    pub fn add_package(&mut self, name: &str, dir: &str) -> Result<&mut Package> {
        if name != dir {
            return Err(Error::PackageDirMismatch {
                package: name.to_string(),
                dir: dir.to_string(),
            });
        }
        let name = InternedString::new(name);
        if self.package_index.contains_key(&name) {
            return Err(Error::DuplicatePackage {
                package: name.to_string(),
            });
        }
        self.package_index.insert(name, self.packages.len());
        self.packages.push(Package::new(name));
        Ok(self.packages.last_mut().expect("just pushed"))
    }

    /// Register a rule wrapper under a unique name.
    pub fn add_rule(&mut self, name: impl Into<String>, rule: Rule) -> Result<()> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(Error::DuplicateRule { rule: name });
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Apply a registered rule to a package.
    pub fn apply_rule(&mut self, package: &str, rule: &str) -> Result<()> {
        let rule = self
            .rules
            .get(rule)
            .cloned()
            .ok_or_else(|| Error::Ingest {
                path: package.into(),
                message: format!("no rule named `{}`", rule),
            })?;
        let index = *self
            .package_index
            .get(package)
            .ok_or_else(|| Error::UnknownTarget {
                label: format!("{}:", package),
            })?;
        rule(&mut self.packages[index])
    }

    /// Look up a buildtool factory.
    pub fn buildtool(&self, name: &str) -> Option<GeneratorFactory> {
        self.buildtools.get(name).copied()
    }

    /// Look up a config by name.
    pub fn config(&self, name: &str) -> Option<&ConfigRecord> {
        self.configs.iter().find(|c| c.name() == name)
    }

    /// All registered configs in declaration order.
    pub fn configs(&self) -> &[ConfigRecord] {
        &self.configs
    }

    /// All packages in ingestion order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a package by name.
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.package_index.get(name).map(|&i| &self.packages[i])
    }

    /// Decompose into parts for workspace construction.
    pub(crate) fn into_parts(self) -> (HashMap<String, GeneratorFactory>, Vec<ConfigRecord>, Vec<Package>) {
        (self.buildtools, self.configs, self.packages)
    }
}
