//! Builderer - a meta-build-system generator for C/C++ workspaces.
//!
//! Builderer consumes a declarative workspace description of C/C++ build
//! targets and emits standalone, native build files for third-party
//! build tools. The generated files never reference Builderer; they are
//! self-contained and transferable.
//!
//! This crate provides the workspace analysis and build-graph core:
//! configuration matrices and conditional expressions, the target
//! registry, the dependency graph, glob-based source enumeration, the
//! sandboxing substrate, and the workspace facade consumed by back-end
//! generators.

pub mod core;
pub mod error;
pub mod generators;
pub mod graph;
pub mod ingest;
pub mod ops;
pub mod sandbox;
pub mod util;

/// Test utilities and fixtures for Builderer unit tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    BakedConfig, Case, Condition, ConfigRecord, ConfigValue, CppBinary, CppLibrary,
    EffectiveFlags, GenerateFiles, GitRepository, Label, Package, Registry, Scalar, SourceSet,
    Target, Value, Workspace,
};
pub use crate::error::{Error, Result};
