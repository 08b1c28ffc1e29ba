//! Workspace validation listing.
//!
//! The expensive checks (duplicates, unknown deps, cycles) already ran
//! while the workspace was configured; this op prints every target with
//! its resolved direct dependencies so CI logs show the full graph.

use std::io::Write;

use crate::core::label::Label;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};

/// Print each target label followed by its direct dependencies.
pub fn validate(workspace: &Workspace, out: &mut impl Write) -> Result<()> {
    for (package, target) in workspace.iter_targets() {
        let label = Label::new(package.name(), target.name());
        writeln!(out, "{}", label).map_err(|e| Error::sandbox_io("<stdout>", e))?;
        for dep in workspace.direct_dependencies(label) {
            writeln!(out, "  {}", dep).map_err(|e| Error::sandbox_io("<stdout>", e))?;
        }
    }
    Ok(())
}
