//! Native build invocation.
//!
//! Generates build files and then drives the native tool. Only the Make
//! back-end supports being driven directly; other buildtools are built
//! from their own IDEs or runners.

use crate::core::config::keys;
use crate::core::label::Label;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::ops::generate;
use crate::util::process::ProcessBuilder;

/// Options narrowing a build invocation.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    /// Optional single `Pkg:Tgt` to build instead of everything.
    pub target: Option<String>,
    /// Narrow the matrix to one build config at build time.
    pub build_config: Option<String>,
    /// Narrow the matrix to one architecture at build time.
    pub build_arch: Option<String>,
}

/// Generate and run the native build. Returns the tool's exit code.
pub fn build(workspace: &Workspace, options: &BuildOptions) -> Result<i32> {
    generate::generate(workspace)?;

    let buildtool = workspace
        .config()
        .get_str(keys::BUILDTOOL)
        .unwrap_or_default()
        .to_string();
    match buildtool.as_str() {
        "make" => build_with_make(workspace, options),
        other => Err(Error::GeneratorFailure {
            target: workspace.config().name().to_string(),
            message: format!("buildtool `{}` cannot be driven directly", other),
        }),
    }
}

fn build_with_make(workspace: &Workspace, options: &BuildOptions) -> Result<i32> {
    let jobs = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let mut command = ProcessBuilder::new("make")
        .arg("-C")
        .arg(workspace.build_root())
        .arg(format!("-j{}", jobs));
    if let Some(arch) = &options.build_arch {
        command = command.arg(format!("ARCH={}", arch));
    }
    if let Some(config) = &options.build_config {
        command = command.arg(format!("CONFIG={}", config));
    }
    match &options.target {
        Some(target) => {
            let label = Label::parse(target, None)?;
            workspace.find_target(label)?;
            command = command.arg(format!("{}@{}", label.package(), label.target()));
        }
        None => {
            command = command.arg("build");
        }
    }
    command.exec_interactive().map_err(|e| Error::GeneratorFailure {
        target: options.target.clone().unwrap_or_else(|| "build".to_string()),
        message: format!("{:#}", e),
    })
}
