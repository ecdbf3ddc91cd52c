// src/fetcher/mod.rs

//! Repository cloning
//!
//! Resolution talks to repositories through two traits. A
//! [`ProviderResolver`] turns a requirement into concrete package names, an
//! [`ArtifactFetcher`] downloads those packages into the output directory.
//! [`TdnfCloner`] implements both on top of tdnf running inside a worker
//! environment.

mod repo_file;
mod tdnf;
mod worker;

pub use repo_file::{RepoDefinition, parse_repo_file};
pub use tdnf::{TdnfCloner, parse_provides_output};
pub use worker::extract_worker_archive;

use crate::error::Result;
use crate::graph::VersionedPkg;
use crate::summary::ResolutionSummary;
use std::path::{Path, PathBuf};

/// Looks up which packages provide a requirement
pub trait ProviderResolver {
    /// Concrete package names satisfying `pkg`, best candidates first
    fn what_provides(&mut self, pkg: &VersionedPkg) -> Result<Vec<String>>;
}

/// Downloads packages into the output directory
pub trait ArtifactFetcher {
    /// Fetch `package` (and its dependencies when `clone_deps` is set)
    ///
    /// Returns true when the package was already available locally as a
    /// pre-built RPM rather than downloaded.
    fn clone_package(&mut self, clone_deps: bool, package: &str) -> Result<bool>;

    /// Turn the output directory into a repository usable by later stages
    fn convert_downloaded_packages_into_repo(&mut self) -> Result<()>;

    /// Everything fetched so far
    fn cloned_contents(&self) -> ResolutionSummary;

    /// Rebuild fetcher state from a saved summary
    fn restore_cloned_contents(&mut self, summary: &ResolutionSummary) -> Result<()>;
}

/// A full repository backend
pub trait RepoCloner: ProviderResolver + ArtifactFetcher {}

impl<T: ProviderResolver + ArtifactFetcher> RepoCloner for T {}

/// Local path of a cloned package
pub fn rpm_package_to_rpm_path(package: &str, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}.rpm", package))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_package_to_rpm_path() {
        assert_eq!(
            rpm_package_to_rpm_path("libfoo-1.0-2", Path::new("/out")),
            PathBuf::from("/out/libfoo-1.0-2.rpm")
        );
    }
}
