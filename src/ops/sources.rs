//! Per-target source listing with line counts.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::label::Label;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::util::fs::relative_path;

fn count_lines(path: &Path, cache: &mut HashMap<PathBuf, usize>) -> usize {
    if let Some(&count) = cache.get(path) {
        return count;
    }
    let count = std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).lines().count())
        .unwrap_or(0);
    cache.insert(path.to_path_buf(), count);
    count
}

/// Print the source tree with line counts per package, target and
/// attribute. Enumeration uses the first baked config of the matrix.
pub fn sources(workspace: &Workspace, out: &mut impl Write) -> Result<()> {
    let Some(baked) = workspace.baked_configs().into_iter().next() else {
        return Ok(());
    };
    let mut cache = HashMap::new();
    let mut total = 0usize;

    let mut emit = |line: String| -> Result<()> {
        writeln!(out, "{}", line).map_err(|e| Error::sandbox_io("<stdout>", e))
    };

    for package in workspace.packages() {
        let mut package_lines = Vec::new();
        let mut pkg_loc = 0usize;
        for target in package.targets() {
            let label = Label::new(package.name(), target.name());
            let sources = workspace.enumerate_sources(&baked, label)?;
            let mut target_lines = Vec::new();
            let mut target_loc = 0usize;
            for (attr, files) in [("hdrs", &sources.hdrs), ("srcs", &sources.srcs)] {
                if files.is_empty() {
                    continue;
                }
                let attr_loc: usize =
                    files.iter().map(|f| count_lines(f, &mut cache)).sum();
                target_lines.push(format!("    {} : {} lines", attr, attr_loc));
                for file in files {
                    target_lines.push(format!(
                        "      {} : {} lines",
                        relative_path(workspace.root(), file).display(),
                        count_lines(file, &mut cache)
                    ));
                }
                target_loc += attr_loc;
            }
            package_lines.push(format!("  {} : {} lines", target.name(), target_loc));
            package_lines.extend(target_lines);
            pkg_loc += target_loc;
        }
        emit(format!("{} : {} lines", package.name(), pkg_loc))?;
        for line in package_lines {
            emit(line)?;
        }
        total += pkg_loc;
    }
    emit(format!("\nTotal : {} lines", total))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::Workspace;
    use crate::test_support::fixtures::{hello_registry, scratch_workspace};

    #[test]
    fn test_sources_report() {
        let tmp = scratch_workspace();
        let ws = Workspace::configure(tmp.path(), hello_registry(), "dev", &[]).unwrap();

        let mut out = Vec::new();
        sources(&ws, &mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("App :"));
        assert!(report.contains("  util :"));
        assert!(report.contains("    hdrs :"));
        assert!(report.contains("App/include/u.h"));
        assert!(report.contains("Total :"));
    }
}
