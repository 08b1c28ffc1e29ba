//! Command implementations

pub mod build;
pub mod completions;
pub mod generate;
pub mod graph;
pub mod licenses;
pub mod run;
pub mod sources;
pub mod validate;

use anyhow::Result;
use builderer::{ingest, Workspace};

use crate::cli::Selection;

/// Ingest the current directory and configure a workspace from it.
pub fn configure(selection: &Selection) -> Result<Workspace> {
    configure_named(&selection.config, &selection.targets)
}

pub fn configure_named(config: &str, targets: &[String]) -> Result<Workspace> {
    let root = std::env::current_dir()?;
    let registry = ingest::load_workspace(&root)?;
    Ok(Workspace::configure(&root, registry, config, targets)?)
}
