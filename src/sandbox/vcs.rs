//! VCS fetcher - realizes `git_repository` targets.
//!
//! Checkouts are pinned to a commit and land under
//! `<sandbox_root>/.vcs/<pkg>/<target>`. A checkout is fetched into a
//! dot-prefixed sibling directory and renamed into place, so an
//! interrupted fetch never leaves a half-populated checkout behind. An
//! existing checkout is trusted and left untouched.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::util::process::ProcessBuilder;

/// Realizes repository checkouts.
pub trait Fetcher {
    /// Materialize `remote` at `sha` into `dest`. Called only when
    /// `dest` does not exist yet.
    fn fetch(&self, remote: &str, sha: &str, dest: &Path) -> Result<()>;
}

/// Shallow-fetches a pinned commit with the git CLI.
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        GitCli
    }

    fn git(cwd: &Path, args: &[&str], remote: &str) -> Result<()> {
        ProcessBuilder::new("git")
            .args(args)
            .cwd(cwd)
            .exec_checked()
            .map_err(|e| Error::VcsFetch {
                remote: remote.to_string(),
                message: format!("{:#}", e),
            })?;
        Ok(())
    }
}

impl Fetcher for GitCli {
    fn fetch(&self, remote: &str, sha: &str, dest: &Path) -> Result<()> {
        info!(remote, sha, "cloning");
        let parent = dest.parent().ok_or_else(|| Error::VcsFetch {
            remote: remote.to_string(),
            message: format!("checkout path {} has no parent", dest.display()),
        })?;
        let checkout_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkout".to_string());
        let staging = parent.join(format!(".{}.fetch", checkout_name));

        let result = (|| {
            fs::create_dir_all(&staging).map_err(|e| Error::sandbox_io(&staging, e))?;
            Self::git(&staging, &["init", "--quiet"], remote)?;
            Self::git(&staging, &["remote", "add", "origin", remote], remote)?;
            Self::git(
                &staging,
                &["fetch", "--quiet", "--depth", "1", "origin", sha],
                remote,
            )?;
            Self::git(&staging, &["checkout", "--quiet", "FETCH_HEAD"], remote)?;
            fs::rename(&staging, dest).map_err(|e| Error::sandbox_io(dest, e))
        })();

        if result.is_err() {
            let _ = fs::remove_dir_all(&staging);
        }
        result
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Writes a marker file instead of talking to the network, and
    /// records every fetch it performed.
    #[derive(Default)]
    pub struct MockFetcher {
        pub fetched: RefCell<Vec<(String, String)>>,
    }

    impl Fetcher for MockFetcher {
        fn fetch(&self, remote: &str, sha: &str, dest: &Path) -> Result<()> {
            self.fetched
                .borrow_mut()
                .push((remote.to_string(), sha.to_string()));
            fs::create_dir_all(dest).map_err(|e| Error::sandbox_io(dest, e))?;
            fs::write(dest.join("README"), format!("{} @ {}\n", remote, sha))
                .map_err(|e| Error::sandbox_io(dest, e))?;
            Ok(())
        }
    }
}
