//! The generate pass: sandbox materialization and back-end dispatch.

use tracing::info;

use crate::core::config::keys;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};

/// Run one full generate pass over a configured workspace.
///
/// The generator is validated before anything touches the filesystem,
/// so a pass that fails up front writes nothing under `build_root`.
/// Sandbox writes happen next and are safe to keep on failure; the
/// back-end write phase runs last.
pub fn generate(workspace: &Workspace) -> Result<()> {
    let buildtool = workspace
        .config()
        .get_str(keys::BUILDTOOL)
        .ok_or_else(|| Error::UnknownConfigKey {
            key: keys::BUILDTOOL.to_string(),
        })?
        .to_string();

    let generator = workspace.buildtool(&buildtool)?();
    generator.validate(workspace.config(), workspace)?;

    let stats = workspace.sandbox_commit()?;
    info!(
        written = stats.written,
        removed = stats.removed,
        "sandbox synchronized"
    );

    generator.generate(workspace.config(), workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Registry;
    use crate::core::workspace::Workspace;
    use crate::test_support::fixtures::{dev_config, hello_registry, scratch_workspace};

    #[test]
    fn test_generate_writes_build_files() {
        let tmp = scratch_workspace();
        let ws = Workspace::configure(tmp.path(), hello_registry(), "dev", &[]).unwrap();
        generate(&ws).unwrap();
        assert!(ws.build_root().join("Makefile").is_file());
    }

    #[test]
    fn test_missing_generator_writes_nothing() {
        let tmp = scratch_workspace();
        let mut registry = Registry::new();
        // No buildtool registered under the name the config asks for.
        let mut config = dev_config();
        config.set(crate::core::config::keys::BUILDTOOL, "xcode");
        registry.add_config(config).unwrap();

        let ws = Workspace::configure(tmp.path(), registry, "dev", &[]).unwrap();
        let err = generate(&ws).unwrap_err();
        assert_eq!(err.kind(), "MissingGenerator");
        assert!(!ws.build_root().exists());
    }
}
