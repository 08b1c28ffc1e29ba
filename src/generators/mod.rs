//! Back-end generator contract.
//!
//! A generator emits native build files for one build tool. It receives
//! the selected (possibly matrix) config record and the workspace facade;
//! a generator that keeps configuration dimensions native to its format
//! (MSBuild-style) may consume the matrix directly, anything else bakes
//! it through the facade. All writes go under `build_root` and must be
//! idempotent.

pub mod make;

use crate::core::config::ConfigRecord;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};

/// A native build-file emitter for one build tool.
pub trait Generator {
    /// The buildtool kind this generator implements.
    fn name(&self) -> &'static str;

    /// Reject configurations this back-end cannot express. Runs before
    /// any sandbox or build-root write.
    fn validate(&self, _config: &ConfigRecord, _workspace: &Workspace) -> Result<()> {
        Ok(())
    }

    /// Emit build files under `build_root`.
    fn generate(&self, config: &ConfigRecord, workspace: &Workspace) -> Result<()>;
}

/// Constructor registered under a buildtool name.
pub type GeneratorFactory = fn() -> Box<dyn Generator>;

/// Look up the built-in generator for a kind name, as referenced from
/// `CONFIG.builderer`.
pub fn builtin_factory(kind: &str) -> Result<GeneratorFactory> {
    match kind {
        "make" => Ok(|| Box::new(make::MakeGenerator::new())),
        _ => Err(Error::MissingGenerator {
            buildtool: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_factory_lookup() {
        assert!(builtin_factory("make").is_ok());
        let err = builtin_factory("ninja").unwrap_err();
        assert_eq!(err.kind(), "MissingGenerator");
    }
}
