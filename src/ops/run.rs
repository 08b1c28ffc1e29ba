//! Build-and-execute for binary targets.

use crate::core::config::keys;
use crate::core::label::Label;
use crate::core::target::Target;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::ops::build::{build, BuildOptions};
use crate::util::process::ProcessBuilder;

/// Options for a run invocation.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub build_config: Option<String>,
    pub build_arch: Option<String>,
    /// Arguments forwarded to the binary after `--`.
    pub args: Vec<String>,
}

/// Build one `cc_binary` target and execute it. Returns the binary's
/// exit code.
///
/// The target must declare an `output_path` so the produced executable
/// has a workspace-relative location independent of the build tool's
/// internal layout.
pub fn run(workspace: &Workspace, target: &str, options: &RunOptions) -> Result<i32> {
    let label = Label::parse(target, None)?;
    let (_, found) = workspace.find_target(label)?;
    let binary = match found {
        Target::CppBinary(binary) => binary,
        other => {
            return Err(Error::GeneratorFailure {
                target: label.to_string(),
                message: format!("`run` requires a cc_binary, got {}", other.kind_name()),
            });
        }
    };
    let output_path = binary.output_path.clone().ok_or_else(|| {
        Error::GeneratorFailure {
            target: label.to_string(),
            message: "`run` requires the target to declare an output_path".to_string(),
        }
    })?;

    let exit = build(
        workspace,
        &BuildOptions {
            target: Some(label.to_string()),
            build_config: options.build_config.clone(),
            build_arch: options.build_arch.clone(),
        },
    )?;
    if exit != 0 {
        return Ok(exit);
    }

    // Resolve the output path under the baked config the build used:
    // the requested narrowing, or the first point of each axis.
    let baked = workspace
        .baked_configs()
        .into_iter()
        .find(|b| {
            options
                .build_config
                .as_deref()
                .map(|v| b.get_str(keys::BUILD_CONFIG) == Some(v))
                .unwrap_or(true)
                && options
                    .build_arch
                    .as_deref()
                    .map(|v| b.get_str(keys::ARCHITECTURE) == Some(v))
                    .unwrap_or(true)
        })
        .ok_or_else(|| Error::UnknownConfig {
            config: format!(
                "{}/{}",
                options.build_arch.as_deref().unwrap_or("*"),
                options.build_config.as_deref().unwrap_or("*")
            ),
        })?;

    let resolved = output_path.resolve_strings(baked.record())?.join("");
    if resolved.is_empty() {
        return Err(Error::GeneratorFailure {
            target: label.to_string(),
            message: "output_path resolved to nothing under the selected config".to_string(),
        });
    }
    let binary_path = workspace.root().join(resolved);

    ProcessBuilder::new(&binary_path)
        .args(&options.args)
        .cwd(workspace.root())
        .exec_interactive()
        .map_err(|e| Error::GeneratorFailure {
            target: label.to_string(),
            message: format!("{:#}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::test_support::fixtures::{hello_registry, scratch_workspace};

    #[test]
    fn test_run_requires_binary_target() {
        let tmp = scratch_workspace();
        let ws = Workspace::configure(tmp.path(), hello_registry(), "dev", &[]).unwrap();
        let err = run(&ws, "App:util", &RunOptions::default()).unwrap_err();
        assert!(err.to_string().contains("requires a cc_binary"));
    }

    #[test]
    fn test_run_requires_output_path() {
        let tmp = scratch_workspace();
        let ws = Workspace::configure(tmp.path(), hello_registry(), "dev", &[]).unwrap();
        let err = run(&ws, "App:hello", &RunOptions::default()).unwrap_err();
        assert!(err.to_string().contains("output_path"));
    }
}
