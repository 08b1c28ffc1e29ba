//! License report over repository targets.
//!
//! Collects `LICENSE*` / `COPYING*` files from the root of every
//! repository checkout and prints their contents, most conventional
//! filename first.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::target::Target;
use crate::core::workspace::Workspace;
use crate::error::{Error, Result};
use crate::sandbox;

const LICENSE_PRIORITY: &[&str] = &[
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
    "LICENSE.rst",
    "COPYING",
    "COPYING.txt",
    "COPYING.md",
    "COPYING.rst",
];

fn priority(name: &str) -> usize {
    let lowered = name.to_lowercase();
    LICENSE_PRIORITY
        .iter()
        .position(|p| p.to_lowercase() == lowered)
        .unwrap_or(LICENSE_PRIORITY.len())
}

fn collect_license_files(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = match std::fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_lowercase();
                name.starts_with("license") || name.starts_with("copying")
            })
            .map(|e| e.path())
            .collect(),
        Err(_) => Vec::new(),
    };
    found.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        (priority(&name), name.to_lowercase())
    });
    found
}

/// Print license texts for every repository target.
pub fn licenses(workspace: &Workspace, out: &mut impl Write) -> Result<()> {
    let mut emit = |line: String| -> Result<()> {
        writeln!(out, "{}", line).map_err(|e| Error::sandbox_io("<stdout>", e))
    };

    let repositories: Vec<_> = workspace
        .iter_targets()
        .filter_map(|(package, target)| match target {
            Target::GitRepository(repo) => Some((package, repo)),
            _ => None,
        })
        .collect();
    if repositories.is_empty() {
        emit("No repository targets found.".to_string())?;
        return Ok(());
    }

    for (package, repo) in repositories {
        let label = format!("{}:{}", package.name(), repo.name);
        let root = sandbox::vcs_root(
            workspace.sandbox_root(),
            package.name().as_str(),
            repo.name.as_str(),
        );
        if !root.is_dir() {
            emit(format!("{}: repository not checked out at {}", label, root.display()))?;
            continue;
        }

        let files = collect_license_files(&root);
        if files.is_empty() {
            emit(format!("{}: no license file found under {}", label, root.display()))?;
            continue;
        }
        for file in files {
            let relative = file.strip_prefix(&root).unwrap_or(&file);
            emit("#".repeat(80))?;
            emit(format!("## {} ({})", label, relative.display()))?;
            emit("#".repeat(80))?;
            let text = std::fs::read(&file)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            if text.trim().is_empty() {
                emit("<empty license file>".to_string())?;
            } else {
                emit(text.trim_end().to_string())?;
            }
            emit(String::new())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::GitRepository;
    use crate::core::workspace::Workspace;
    use crate::sandbox::vcs::testing::MockFetcher;
    use crate::test_support::fixtures::{hello_registry, scratch_workspace, write_file};

    #[test]
    fn test_license_priority_ordering() {
        assert!(priority("LICENSE") < priority("LICENSE.md"));
        assert!(priority("COPYING") < priority("copying.weird"));
        assert_eq!(priority("license"), priority("LICENSE"));
    }

    #[test]
    fn test_licenses_report() {
        let tmp = scratch_workspace();
        let mut registry = hello_registry();
        registry
            .add_package("Ext", "Ext")
            .unwrap()
            .add_target(GitRepository::new(
                "zlib",
                "https://example.com/zlib.git",
                "abc123",
            ))
            .unwrap();

        let ws = Workspace::configure(tmp.path(), registry, "dev", &[])
            .unwrap()
            .with_fetcher(Box::new(MockFetcher::default()));
        ws.sandbox_commit().unwrap();
        write_file(
            ws.sandbox_root(),
            ".vcs/Ext/zlib/LICENSE",
            "zlib license text\n",
        );

        let mut out = Vec::new();
        licenses(&ws, &mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("## Ext:zlib (LICENSE)"));
        assert!(report.contains("zlib license text"));
    }
}
