//! DOT dump of the dependency graph.

use std::io::Write;

use crate::core::label::Label;
use crate::core::workspace::Workspace;
use crate::error::Result;

/// Write the dependency graph as DOT, one cluster per package.
/// Pre-build targets (checkouts, generated files) draw as boxes,
/// buildable targets as ovals.
pub fn write_dot(workspace: &Workspace, out: &mut impl Write) -> Result<()> {
    let mut emit = || -> std::io::Result<()> {
        writeln!(out, "digraph DependencyGraph {{")?;
        for (index, package) in workspace.packages().iter().enumerate() {
            writeln!(out, "  subgraph cluster{} {{", index)?;
            writeln!(out, "    label = \"{}\";", package.name())?;
            for target in package.targets() {
                let shape = if target.is_prebuild() { "box" } else { "oval" };
                writeln!(
                    out,
                    "    \"{}:{}\" [label=\"{}\", shape={}];",
                    package.name(),
                    target.name(),
                    target.name(),
                    shape
                )?;
            }
            writeln!(out, "  }}")?;
        }
        for (package, target) in workspace.iter_targets() {
            let label = Label::new(package.name(), target.name());
            let deps: Vec<String> = workspace
                .direct_dependencies(label)
                .iter()
                .map(|d| format!("\"{}\"", d))
                .collect();
            writeln!(out, "  \"{}\" -> {{{}}};", label, deps.join(", "))?;
        }
        writeln!(out, "}}")?;
        Ok(())
    };
    emit().map_err(|e| crate::error::Error::sandbox_io("<stdout>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::test_support::fixtures::{hello_registry, scratch_workspace};

    #[test]
    fn test_dot_output_shape() {
        let tmp = scratch_workspace();
        let ws = Workspace::configure(tmp.path(), hello_registry(), "dev", &[]).unwrap();

        let mut out = Vec::new();
        write_dot(&ws, &mut out).unwrap();
        let dot = String::from_utf8(out).unwrap();

        assert!(dot.starts_with("digraph DependencyGraph {"));
        assert!(dot.contains("label = \"App\";"));
        assert!(dot.contains("\"App:hello\" [label=\"hello\", shape=oval];"));
        assert!(dot.contains("\"App:hello\" -> {\"App:util\"};"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
