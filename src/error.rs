//! Error taxonomy for the workspace core.
//!
//! Every failure is fatal: it aborts the generate pass before any build
//! file is written under `build_root`. Writes already made to
//! `sandbox_root` are left in place; the next pass reconciles them.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// All fatal error kinds, surfaced as `(kind, label-or-path, message)`.
#[derive(Debug, Error)]
pub enum Error {
    // --- ingestion ---
    #[error("target `{target}` already exists in package `{package}`")]
    DuplicateTarget { package: String, target: String },

    #[error("package `{package}` already exists")]
    DuplicatePackage { package: String },

    #[error("config `{config}` has already been registered")]
    DuplicateConfig { config: String },

    #[error("buildtool `{buildtool}` has already been registered")]
    DuplicateBuildtool { buildtool: String },

    #[error("rule `{rule}` has already been registered")]
    DuplicateRule { rule: String },

    #[error("package name `{package}` does not match its directory `{dir}`")]
    PackageDirMismatch { package: String, dir: String },

    #[error("failed to ingest {path}: {message}")]
    Ingest { path: PathBuf, message: String },

    // --- graph build ---
    #[error("unknown dependency `{label}` referenced by `{referrer}`")]
    UnknownDependency { label: String, referrer: String },

    #[error("dependency cycle: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    // --- resolution ---
    #[error("condition references unknown config key `{key}`")]
    UnknownConfigKey { key: String },

    #[error("condition evaluated against unbaked matrix axis `{key}`")]
    MatrixLeakage { key: String },

    // --- path expansion ---
    #[error("`{target}` references `{{{reference}}}` which is not among its dependencies")]
    UnreferencedPathTarget { reference: String, target: String },

    #[error("malformed path reference in `{value}`")]
    MalformedPathReference { value: String },

    #[error("malformed label `{label}`: {message}")]
    MalformedLabel { label: String, message: String },

    // --- lookup ---
    #[error("no target named `{label}`")]
    UnknownTarget { label: String },

    #[error("no config named `{config}`")]
    UnknownConfig { config: String },

    // --- back-end dispatch ---
    #[error("no generator registered for buildtool `{buildtool}`")]
    MissingGenerator { buildtool: String },

    #[error("platform `{platform}` is not supported by the `{generator}` generator")]
    UnsupportedPlatform { platform: String, generator: String },

    #[error("generator failed for `{target}`: {message}")]
    GeneratorFailure { target: String, message: String },

    // --- sandbox ---
    #[error("sandbox I/O failure at {}: {source}", .path.display())]
    SandboxIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch `{remote}`: {message}")]
    VcsFetch { remote: String, message: String },
}

impl Error {
    /// Wrap an I/O error with the offending sandbox path.
    pub fn sandbox_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::SandboxIo {
            path: path.into(),
            source,
        }
    }

    /// Stable taxonomy tag, printed by the CLI alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DuplicateTarget { .. } => "DuplicateTarget",
            Error::DuplicatePackage { .. } => "DuplicatePackage",
            Error::DuplicateConfig { .. } => "DuplicateConfig",
            Error::DuplicateBuildtool { .. } => "DuplicateBuildtool",
            Error::DuplicateRule { .. } => "DuplicateRule",
            Error::PackageDirMismatch { .. } => "PackageDirMismatch",
            Error::Ingest { .. } => "Ingest",
            Error::UnknownDependency { .. } => "UnknownDependency",
            Error::DependencyCycle { .. } => "DependencyCycle",
            Error::UnknownConfigKey { .. } => "UnknownConfigKey",
            Error::MatrixLeakage { .. } => "MatrixLeakage",
            Error::UnreferencedPathTarget { .. } => "UnreferencedPathTarget",
            Error::MalformedPathReference { .. } => "MalformedPathReference",
            Error::MalformedLabel { .. } => "MalformedLabel",
            Error::UnknownTarget { .. } => "UnknownTarget",
            Error::UnknownConfig { .. } => "UnknownConfig",
            Error::MissingGenerator { .. } => "MissingGenerator",
            Error::UnsupportedPlatform { .. } => "UnsupportedPlatform",
            Error::GeneratorFailure { .. } => "GeneratorFailure",
            Error::SandboxIo { .. } => "SandboxIOFailure",
            Error::VcsFetch { .. } => "VcsFetch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_path() {
        let err = Error::DependencyCycle {
            cycle: vec!["A:x".into(), "B:y".into(), "A:x".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: A:x -> B:y -> A:x");
        assert_eq!(err.kind(), "DependencyCycle");
    }

    #[test]
    fn test_sandbox_io_names_path() {
        let err = Error::sandbox_io(
            "/tmp/sandbox/pkg/tgt/hdrs/a.h",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/sandbox/pkg/tgt/hdrs/a.h"));
        assert_eq!(err.kind(), "SandboxIOFailure");
    }
}
