//! Workspace - the facade back-ends see.
//!
//! A `Workspace` binds a frozen registry to one selected matrix config.
//! Configuration elides conditional targets, resolves dependency labels
//! and builds the graph; afterwards the workspace is immutable and every
//! facade call is deterministic for a fixed filesystem.
//!
//! Target elision and `deps` resolution run against the matrix record,
//! so they may only touch scalar axes - a condition on a sequence axis
//! there surfaces as `MatrixLeakage` at the baking boundary. Per-value
//! attributes resolve later against baked configs and never see it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::config::{keys, BakedConfig, ConfigRecord, Scalar};
use crate::core::conditional::Value;
use crate::core::glob::{self, GlobCache, MatchedFile};
use crate::core::label::Label;
use crate::core::package::Package;
use crate::core::pathref::{self, RefContext};
use crate::core::registry::Registry;
use crate::core::target::Target;
use crate::error::{Error, Result};
use crate::generators::GeneratorFactory;
use crate::graph::DependencyGraph;
use crate::sandbox::vcs::{Fetcher, GitCli};
use crate::sandbox::{self, CommitStats, SandboxPlan, OUT_DIR};
use crate::util::process::ProcessBuilder;
use crate::util::InternedString;

/// Enumerated hdrs and srcs of a target, workspace-absolute (or
/// sandbox-absolute for sandboxed targets).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub hdrs: Vec<PathBuf>,
    pub srcs: Vec<PathBuf>,
}

/// Collected compile and link inputs for a target under one baked
/// config.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EffectiveFlags {
    pub includes: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub c_flags: Vec<String>,
    pub cxx_flags: Vec<String>,
    pub link_flags: Vec<String>,
}

/// The configured workspace.
pub struct Workspace {
    root: PathBuf,
    config: ConfigRecord,
    build_root: PathBuf,
    sandbox_root: PathBuf,
    packages: Vec<Package>,
    package_index: HashMap<InternedString, usize>,
    graph: DependencyGraph,
    buildtools: HashMap<String, GeneratorFactory>,
    fetcher: Box<dyn Fetcher>,
    glob_cache: RefCell<GlobCache>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("build_root", &self.build_root)
            .field("sandbox_root", &self.sandbox_root)
            .field("packages", &self.packages)
            .field("package_index", &self.package_index)
            .field("graph", &self.graph)
            .field("buildtools", &self.buildtools.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Configure a workspace from an ingested registry.
    ///
    /// `working_set` optionally restricts the workspace to the given
    /// `Pkg:Tgt` labels plus their transitive dependencies.
    pub fn configure(
        root: impl Into<PathBuf>,
        registry: Registry,
        config_name: &str,
        working_set: &[String],
    ) -> Result<Workspace> {
        let root: PathBuf = root.into();
        let root = crate::util::fs::normalize_path(&root);
        let (buildtools, configs, packages) = registry.into_parts();

        let config = configs
            .into_iter()
            .find(|c| c.name() == config_name)
            .ok_or_else(|| Error::UnknownConfig {
                config: config_name.to_string(),
            })?;

        let build_root = root.join(required_path(&config, keys::BUILD_ROOT)?);
        let sandbox_root = root.join(required_path(&config, keys::SANDBOX_ROOT)?);

        let mut workspace = Workspace {
            root,
            config,
            build_root,
            sandbox_root,
            packages,
            package_index: HashMap::new(),
            graph: DependencyGraph::new(),
            buildtools,
            fetcher: Box::new(GitCli::new()),
            glob_cache: RefCell::new(GlobCache::new()),
        };

        workspace.elide_targets()?;
        workspace.reindex();
        workspace.build_graph()?;
        if !working_set.is_empty() {
            workspace.restrict_to(working_set)?;
        }
        info!(
            config = workspace.config.name(),
            targets = workspace.graph.len(),
            "workspace configured"
        );
        Ok(workspace)
    }

    /// Replace the VCS fetcher (tests substitute a mock).
    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    // --- configuration phases ---

    fn elide_targets(&mut self) -> Result<()> {
        let config = self.config.clone();
        for package in &mut self.packages {
            let mut keep = Vec::with_capacity(package.targets().len());
            for target in package.targets() {
                keep.push(target.condition().eval(&config)?);
            }
            let mut it = keep.into_iter();
            package.retain_targets(|_| it.next().unwrap_or(false));
        }
        self.packages.retain(|p| !p.is_empty());
        Ok(())
    }

    fn reindex(&mut self) {
        self.packages.sort_by_key(|p| p.name());
        self.package_index = self
            .packages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name(), i))
            .collect();
    }

    fn build_graph(&mut self) -> Result<()> {
        let mut graph = DependencyGraph::new();
        for (package, target) in self.iter_targets() {
            graph.add_node(Label::new(package.name(), target.name()));
        }
        for (package, target) in self.iter_targets() {
            let from = Label::new(package.name(), target.name());
            for label in self.declared_deps(package, target)? {
                if !graph.contains(label) {
                    return Err(Error::UnknownDependency {
                        label: label.to_string(),
                        referrer: from.to_string(),
                    });
                }
                graph.add_edge(from, label);
            }
        }
        graph.ensure_acyclic()?;
        self.graph = graph;
        Ok(())
    }

    fn declared_deps(&self, package: &Package, target: &Target) -> Result<Vec<Label>> {
        let Some(deps) = target.deps() else {
            return Ok(Vec::new());
        };
        deps.resolve_strings(&self.config)?
            .iter()
            .map(|dep| Label::parse(dep, Some(package.name().as_str())))
            .collect()
    }

    fn restrict_to(&mut self, working_set: &[String]) -> Result<()> {
        let mut allowed: HashSet<Label> = HashSet::new();
        for requested in working_set {
            let label = Label::parse(requested, None)?;
            if !self.graph.contains(label) {
                return Err(Error::UnknownTarget {
                    label: label.to_string(),
                });
            }
            allowed.insert(label);
            allowed.extend(self.graph.all_dependencies(label));
        }
        for package in &mut self.packages {
            let name = package.name();
            package.retain_targets(|t| allowed.contains(&Label::new(name, t.name())));
        }
        self.packages.retain(|p| !p.is_empty());
        self.reindex();
        self.build_graph()
    }

    // --- facade: structure ---

    /// The absolute workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The selected (matrix) config record.
    pub fn config(&self) -> &ConfigRecord {
        &self.config
    }

    /// Where generated build files go.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Where sandboxes and checkouts go.
    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// The baked configs of the selected matrix, in matrix order.
    pub fn baked_configs(&self) -> Vec<BakedConfig> {
        self.config.bake()
    }

    /// The generator factory registered for a buildtool name.
    pub fn buildtool(&self, name: &str) -> Result<GeneratorFactory> {
        self.buildtools
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingGenerator {
                buildtool: name.to_string(),
            })
    }

    /// All (package, target) pairs: packages sorted by name, targets in
    /// declaration order.
    pub fn iter_targets(&self) -> impl Iterator<Item = (&Package, &Target)> {
        self.packages
            .iter()
            .flat_map(|p| p.targets().iter().map(move |t| (p, t)))
    }

    /// All packages, sorted by name.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a target by label.
    pub fn find_target(&self, label: Label) -> Result<(&Package, &Target)> {
        let package = self
            .package_index
            .get(&label.package())
            .map(|&i| &self.packages[i])
            .ok_or_else(|| Error::UnknownTarget {
                label: label.to_string(),
            })?;
        let target = package
            .target(label.target().as_str())
            .ok_or_else(|| Error::UnknownTarget {
                label: label.to_string(),
            })?;
        Ok((package, target))
    }

    /// Direct dependencies, in `deps` declaration order.
    pub fn direct_dependencies(&self, label: Label) -> Vec<Label> {
        self.graph.direct_dependencies(label)
    }

    /// Transitive dependencies in deterministic post-order, excluding
    /// `label` itself.
    pub fn all_dependencies(&self, label: Label) -> Vec<Label> {
        self.graph.all_dependencies(label)
    }

    /// Every target label, dependencies before dependents.
    pub fn topological_order(&self) -> Vec<Label> {
        self.graph.topological_order()
    }

    // --- facade: resolution ---

    /// Resolve a conditional value under a baked config.
    pub fn resolve(&self, config: &BakedConfig, value: &Value) -> Result<Vec<Scalar>> {
        value.resolve(config.record())
    }

    /// The effective source root of a target for the given reference
    /// context.
    pub fn effective_root(&self, label: Label, ctx: RefContext) -> Result<PathBuf> {
        let (package, target) = self.find_target(label)?;
        let pkg = package.name();
        let tgt = target.name();
        Ok(match target {
            Target::GitRepository(_) => {
                sandbox::vcs_root(&self.sandbox_root, pkg.as_str(), tgt.as_str())
            }
            Target::GenerateFiles(_) => {
                sandbox::target_root(&self.sandbox_root, pkg.as_str(), tgt.as_str())
                    .join(OUT_DIR)
            }
            Target::CppLibrary(_) | Target::CppBinary(_) => {
                if target.is_sandboxed() {
                    let group = match ctx {
                        RefContext::Include => sandbox::HDRS_DIR,
                        RefContext::Source => sandbox::SRCS_DIR,
                    };
                    sandbox::target_root(&self.sandbox_root, pkg.as_str(), tgt.as_str())
                        .join(group)
                } else {
                    self.root.join(package.dir())
                }
            }
        })
    }

    /// Resolve a `{P:T}` reference appearing in `owner`'s attributes.
    ///
    /// The reference must be in `owner`'s transitive dependencies.
    fn ref_root(
        &self,
        owner: Label,
        deps: &HashSet<Label>,
        reference: &str,
        ctx: RefContext,
    ) -> Result<PathBuf> {
        let label = Label::parse(reference, Some(owner.package().as_str()))?;
        if !deps.contains(&label) {
            return Err(Error::UnreferencedPathTarget {
                reference: reference.to_string(),
                target: owner.to_string(),
            });
        }
        self.effective_root(label, ctx)
    }

    fn transitive_set(&self, label: Label) -> HashSet<Label> {
        self.graph.all_dependencies(label).into_iter().collect()
    }

    /// Expand a directory-valued attribute (includes) to absolute paths.
    fn expand_dirs(
        &self,
        config: &ConfigRecord,
        owner: Label,
        value: &Value,
        ctx: RefContext,
    ) -> Result<Vec<PathBuf>> {
        let deps = self.transitive_set(owner);
        let own_root = self.effective_root(owner, ctx)?;
        value
            .resolve_strings(config)?
            .iter()
            .map(|entry| {
                let expanded =
                    pathref::expand_refs(entry, |r| self.ref_root(owner, &deps, r, ctx))?;
                let path = PathBuf::from(expanded);
                Ok(if path.is_absolute() {
                    path
                } else {
                    own_root.join(path)
                })
            })
            .collect()
    }

    /// Enumerate a glob-valued attribute against package and reference
    /// bases.
    fn matched_files(
        &self,
        config: &ConfigRecord,
        owner: Label,
        value: &Value,
        ctx: RefContext,
    ) -> Result<Vec<MatchedFile>> {
        let patterns = value.resolve_strings(config)?;
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        let deps = self.transitive_set(owner);
        let package_base = {
            let (package, _) = self.find_target(owner)?;
            self.root.join(package.dir())
        };

        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for pattern in &patterns {
            let (negated, body) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };
            let (base, rel) = match pathref::split_leading_ref(body)? {
                Some(split) => (
                    self.ref_root(owner, &deps, split.reference, ctx)?,
                    split.rest.to_string(),
                ),
                None => (package_base.clone(), body.to_string()),
            };
            if negated {
                excludes.push((base, rel));
            } else {
                includes.push((base, rel));
            }
        }
        glob::enumerate(&includes, &excludes, &mut self.glob_cache.borrow_mut())
    }

    /// Enumerate hdrs and srcs of a target under a baked config.
    ///
    /// Paths are workspace-absolute, or sandbox-absolute when the target
    /// is sandboxed.
    pub fn enumerate_sources(&self, config: &BakedConfig, label: Label) -> Result<SourceSet> {
        let (package, target) = self.find_target(label)?;
        let pkg = package.name();
        let (hdrs_value, srcs_value) = match target {
            Target::CppLibrary(lib) => (Some(&lib.hdrs), Some(&lib.srcs)),
            Target::CppBinary(bin) => (None, Some(&bin.srcs)),
            Target::GitRepository(_) | Target::GenerateFiles(_) => (None, None),
        };

        let sandbox_dir = target.is_sandboxed().then(|| {
            sandbox::target_root(&self.sandbox_root, pkg.as_str(), target.name().as_str())
        });

        let mut sources = SourceSet::default();
        if let Some(value) = hdrs_value {
            let files = self.matched_files(config.record(), label, value, RefContext::Include)?;
            sources.hdrs = map_into_group(&files, sandbox_dir.as_deref(), sandbox::HDRS_DIR);
        }
        if let Some(value) = srcs_value {
            let files = self.matched_files(config.record(), label, value, RefContext::Source)?;
            sources.srcs = map_into_group(&files, sandbox_dir.as_deref(), sandbox::SRCS_DIR);
        }
        Ok(sources)
    }

    /// Collect effective includes, defines and flags for a target under
    /// a baked config, propagating public properties of `cc_library`
    /// dependencies in `all_dependencies` order.
    pub fn effective_flags(&self, config: &BakedConfig, label: Label) -> Result<EffectiveFlags> {
        let record = config.record();
        let (_, target) = self.find_target(label)?;
        let mut flags = EffectiveFlags::default();

        match target {
            Target::CppLibrary(lib) => {
                flags.includes.extend(self.expand_dirs(
                    record,
                    label,
                    &lib.private_includes,
                    RefContext::Include,
                )?);
                flags.includes.extend(self.expand_dirs(
                    record,
                    label,
                    &lib.public_includes,
                    RefContext::Include,
                )?);
                flags.defines.extend(lib.private_defines.resolve_strings(record)?);
                flags.defines.extend(lib.public_defines.resolve_strings(record)?);
                flags.c_flags = lib.c_flags.resolve_strings(record)?;
                flags.cxx_flags = lib.cxx_flags.resolve_strings(record)?;
                flags.link_flags = lib.link_flags.resolve_strings(record)?;
            }
            Target::CppBinary(bin) => {
                flags.includes.extend(self.expand_dirs(
                    record,
                    label,
                    &bin.private_includes,
                    RefContext::Include,
                )?);
                flags.defines.extend(bin.private_defines.resolve_strings(record)?);
                flags.c_flags = bin.c_flags.resolve_strings(record)?;
                flags.cxx_flags = bin.cxx_flags.resolve_strings(record)?;
                flags.link_flags = bin.link_flags.resolve_strings(record)?;
            }
            Target::GitRepository(_) | Target::GenerateFiles(_) => return Ok(flags),
        }

        for dep in self.all_dependencies(label) {
            let (_, dep_target) = self.find_target(dep)?;
            if let Target::CppLibrary(lib) = dep_target {
                flags.includes.extend(self.expand_dirs(
                    record,
                    dep,
                    &lib.public_includes,
                    RefContext::Include,
                )?);
                flags.defines.extend(lib.public_defines.resolve_strings(record)?);
                flags.link_flags.extend(lib.link_flags.resolve_strings(record)?);
            }
        }
        Ok(flags)
    }

    // --- facade: sandbox ---

    /// Materialize every sandbox: checkouts, generated files, and
    /// hdrs/srcs mirrors, dependencies first. Idempotent; a clean second
    /// pass performs zero writes.
    pub fn sandbox_commit(&self) -> Result<CommitStats> {
        let mut stats = CommitStats::default();
        for label in self.topological_order() {
            let (package, target) = self.find_target(label)?;
            match target {
                Target::GitRepository(repo) => {
                    let dest = sandbox::vcs_root(
                        &self.sandbox_root,
                        package.name().as_str(),
                        repo.name.as_str(),
                    );
                    if !dest.is_dir() {
                        self.fetcher.fetch(&repo.remote, &repo.sha, &dest)?;
                        stats.written += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                }
                Target::GenerateFiles(generate) => {
                    stats.merge(self.run_generate_files(label, package, generate)?);
                }
                Target::CppLibrary(_) | Target::CppBinary(_) if target.is_sandboxed() => {
                    let plan = self.sandbox_plan(label)?;
                    stats.merge(plan.commit()?);
                }
                _ => {}
            }
        }
        debug!(
            written = stats.written,
            removed = stats.removed,
            unchanged = stats.unchanged,
            "sandbox committed"
        );
        Ok(stats)
    }

    /// Plan the hdrs/srcs mirror of a sandboxed target.
    ///
    /// Sandbox contents are independent of the baked configs, so the
    /// declared globs resolve against the matrix record here; a glob
    /// conditional on a matrix axis is `MatrixLeakage`.
    pub fn sandbox_plan(&self, label: Label) -> Result<SandboxPlan> {
        let (package, target) = self.find_target(label)?;
        let mut plan = SandboxPlan::new(sandbox::target_root(
            &self.sandbox_root,
            package.name().as_str(),
            target.name().as_str(),
        ));
        let (hdrs_value, srcs_value) = match target {
            Target::CppLibrary(lib) => (Some(&lib.hdrs), Some(&lib.srcs)),
            Target::CppBinary(bin) => (None, Some(&bin.srcs)),
            _ => (None, None),
        };
        if let Some(value) = hdrs_value {
            for file in self.matched_files(&self.config, label, value, RefContext::Include)? {
                plan.add_hdr(file.relpath, file.path);
            }
        }
        if let Some(value) = srcs_value {
            for file in self.matched_files(&self.config, label, value, RefContext::Source)? {
                plan.add_src(file.relpath, file.path);
            }
        }
        Ok(plan)
    }

    fn run_generate_files(
        &self,
        label: Label,
        package: &Package,
        generate: &crate::core::target::GenerateFiles,
    ) -> Result<CommitStats> {
        let mut stats = CommitStats::default();
        let target_dir = sandbox::target_root(
            &self.sandbox_root,
            package.name().as_str(),
            generate.name.as_str(),
        );
        let out_dir = target_dir.join(OUT_DIR);

        let outputs = generate.outputs.resolve_strings(&self.config)?;
        let missing = outputs.is_empty() || outputs.iter().any(|o| !out_dir.join(o).is_file());
        if !missing {
            stats.unchanged += 1;
            return Ok(stats);
        }

        let deps = self.transitive_set(label);
        let argv: Vec<String> = generate
            .generator
            .resolve_strings(&self.config)?
            .iter()
            .map(|arg| {
                pathref::expand_refs(arg, |r| {
                    // `{__sandbox__}` names the target's own sandbox dir,
                    // everything else is a dependency reference.
                    if r == "__sandbox__" {
                        Ok(target_dir.clone())
                    } else {
                        self.ref_root(label, &deps, r, RefContext::Source)
                    }
                })
            })
            .collect::<Result<_>>()?;

        let (program, args) = argv.split_first().ok_or_else(|| Error::GeneratorFailure {
            target: label.to_string(),
            message: "generate_files requires a command".to_string(),
        })?;

        std::fs::create_dir_all(&out_dir).map_err(|e| Error::sandbox_io(&out_dir, e))?;
        info!(target = %label, command = %program, "generating files");
        ProcessBuilder::new(program)
            .args(args)
            .cwd(self.root.join(package.dir()))
            .exec_checked()
            .map_err(|e| Error::GeneratorFailure {
                target: label.to_string(),
                message: format!("{:#}", e),
            })?;

        for output in &outputs {
            if !out_dir.join(output).is_file() {
                return Err(Error::GeneratorFailure {
                    target: label.to_string(),
                    message: format!("declared output `{}` was not produced", output),
                });
            }
        }
        stats.written += 1;
        Ok(stats)
    }
}

fn required_path(config: &ConfigRecord, key: &str) -> Result<PathBuf> {
    config
        .get_str(key)
        .map(PathBuf::from)
        .ok_or_else(|| Error::UnknownConfigKey {
            key: key.to_string(),
        })
}

fn map_into_group(
    files: &[MatchedFile],
    sandbox_dir: Option<&Path>,
    group: &str,
) -> Vec<PathBuf> {
    files
        .iter()
        .map(|file| match sandbox_dir {
            Some(dir) => dir.join(group).join(&file.relpath),
            None => file.path.clone(),
        })
        .collect()
}
