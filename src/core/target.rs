//! Target definitions - what gets described.
//!
//! A target is a named unit of buildable or fetchable content within a
//! package. Buildable targets (libraries, binaries) carry attribute
//! values as conditional expression trees; repository and generator
//! targets materialize content into the sandbox before back-end emission.

use crate::core::conditional::{Condition, Value};
use crate::util::InternedString;

/// A C/C++ library.
#[derive(Debug, Clone, Default)]
pub struct CppLibrary {
    pub name: InternedString,
    pub condition: Condition,
    pub hdrs: Value,
    pub srcs: Value,
    pub public_includes: Value,
    pub private_includes: Value,
    pub public_defines: Value,
    pub private_defines: Value,
    pub c_flags: Value,
    pub cxx_flags: Value,
    pub link_flags: Value,
    pub deps: Value,
    pub sandbox: bool,
}

impl CppLibrary {
    pub fn new(name: impl Into<InternedString>) -> Self {
        CppLibrary {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_hdrs(mut self, hdrs: impl Into<Value>) -> Self {
        self.hdrs = hdrs.into();
        self
    }

    pub fn with_srcs(mut self, srcs: impl Into<Value>) -> Self {
        self.srcs = srcs.into();
        self
    }

    pub fn with_public_includes(mut self, includes: impl Into<Value>) -> Self {
        self.public_includes = includes.into();
        self
    }

    pub fn with_deps(mut self, deps: impl Into<Value>) -> Self {
        self.deps = deps.into();
        self
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// A library without sources compiles nothing and archives nothing.
    pub fn is_header_only(&self) -> bool {
        self.srcs.is_trivially_empty()
    }
}

/// A C/C++ executable.
#[derive(Debug, Clone, Default)]
pub struct CppBinary {
    pub name: InternedString,
    pub condition: Condition,
    pub srcs: Value,
    pub private_includes: Value,
    pub private_defines: Value,
    pub c_flags: Value,
    pub cxx_flags: Value,
    pub link_flags: Value,
    pub deps: Value,
    pub output_path: Option<Value>,
    pub sandbox: bool,
}

impl CppBinary {
    pub fn new(name: impl Into<InternedString>) -> Self {
        CppBinary {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_srcs(mut self, srcs: impl Into<Value>) -> Self {
        self.srcs = srcs.into();
        self
    }

    pub fn with_deps(mut self, deps: impl Into<Value>) -> Self {
        self.deps = deps.into();
        self
    }
}

/// A pinned external checkout; non-buildable.
///
/// Its "output" is the checked-out tree under `<sandbox_root>/.vcs/`,
/// used by cross-package path references.
#[derive(Debug, Clone, Default)]
pub struct GitRepository {
    pub name: InternedString,
    pub condition: Condition,
    pub remote: String,
    pub sha: String,
}

impl GitRepository {
    pub fn new(
        name: impl Into<InternedString>,
        remote: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        GitRepository {
            name: name.into(),
            condition: Condition::new(),
            remote: remote.into(),
            sha: sha.into(),
        }
    }
}

/// A target whose files are produced by running a command before
/// back-end emission. Outputs land under the target's `out/` sandbox
/// directory.
#[derive(Debug, Clone, Default)]
pub struct GenerateFiles {
    pub name: InternedString,
    pub condition: Condition,
    /// Command line: program followed by arguments.
    pub generator: Value,
    pub inputs: Value,
    pub outputs: Value,
}

impl GenerateFiles {
    pub fn new(name: impl Into<InternedString>, generator: impl Into<Value>) -> Self {
        GenerateFiles {
            name: name.into(),
            generator: generator.into(),
            ..Default::default()
        }
    }
}

/// A named unit of content within a package.
#[derive(Debug, Clone)]
pub enum Target {
    CppLibrary(CppLibrary),
    CppBinary(CppBinary),
    GitRepository(GitRepository),
    GenerateFiles(GenerateFiles),
}

impl Target {
    /// The target name within its package.
    pub fn name(&self) -> InternedString {
        match self {
            Target::CppLibrary(t) => t.name,
            Target::CppBinary(t) => t.name,
            Target::GitRepository(t) => t.name,
            Target::GenerateFiles(t) => t.name,
        }
    }

    /// The top-level elision condition.
    pub fn condition(&self) -> &Condition {
        match self {
            Target::CppLibrary(t) => &t.condition,
            Target::CppBinary(t) => &t.condition,
            Target::GitRepository(t) => &t.condition,
            Target::GenerateFiles(t) => &t.condition,
        }
    }

    /// Declared dependencies, where the kind supports them.
    pub fn deps(&self) -> Option<&Value> {
        match self {
            Target::CppLibrary(t) => Some(&t.deps),
            Target::CppBinary(t) => Some(&t.deps),
            Target::GitRepository(_) | Target::GenerateFiles(_) => None,
        }
    }

    /// Whether this target's sources are mirrored into the sandbox.
    ///
    /// Repository and generator targets always live in the sandbox;
    /// libraries and binaries opt in.
    pub fn is_sandboxed(&self) -> bool {
        match self {
            Target::CppLibrary(t) => t.sandbox,
            Target::CppBinary(t) => t.sandbox,
            Target::GitRepository(_) | Target::GenerateFiles(_) => true,
        }
    }

    /// Whether the back-end emits build rules for this target.
    pub fn is_buildable(&self) -> bool {
        matches!(self, Target::CppLibrary(_) | Target::CppBinary(_))
    }

    /// Whether this target produces its content before the native build
    /// (repository checkouts and generated files).
    pub fn is_prebuild(&self) -> bool {
        matches!(self, Target::GitRepository(_) | Target::GenerateFiles(_))
    }

    /// Rule name, as spelled in description files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Target::CppLibrary(_) => "cc_library",
            Target::CppBinary(_) => "cc_binary",
            Target::GitRepository(_) => "git_repository",
            Target::GenerateFiles(_) => "generate_files",
        }
    }
}

impl From<CppLibrary> for Target {
    fn from(t: CppLibrary) -> Self {
        Target::CppLibrary(t)
    }
}

impl From<CppBinary> for Target {
    fn from(t: CppBinary) -> Self {
        Target::CppBinary(t)
    }
}

impl From<GitRepository> for Target {
    fn from(t: GitRepository) -> Self {
        Target::GitRepository(t)
    }
}

impl From<GenerateFiles> for Target {
    fn from(t: GenerateFiles) -> Self {
        Target::GenerateFiles(t)
    }
}
