// src/resolver/conflict.rs

//! Competing package resolution
//!
//! When several packages provide the same requirement, they may not be
//! installable together (for example two releases of one library). A
//! [`CompetingResolver`] asks the package manager which of the candidates
//! form an installable set; [`select_competing_package`] applies the
//! selection policy on top of that answer.

use crate::error::{Error, Result};
use crate::graph::VersionedPkg;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tempfile::TempDir;
use tracing::{debug, error, warn};

/// Decides which of several candidate RPMs can be installed together
pub trait CompetingResolver {
    /// The installable subset of `candidates`
    fn resolve_competing_packages(&self, candidates: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

/// Pick one RPM out of several that all provide `requirement`
///
/// No installable candidate is an error. Several installable candidates are
/// not: the first one returned by the resolver is used.
pub fn select_competing_package(
    resolver: &dyn CompetingResolver,
    requirement: &VersionedPkg,
    candidates: &[PathBuf],
) -> Result<PathBuf> {
    debug!("Found {} candidates for '{}'. Resolving.", candidates.len(), requirement);

    let installable = resolver.resolve_competing_packages(candidates).map_err(|e| {
        error!(
            "Failed while trying to pick an RPM providing '{}' from {:?}",
            requirement.name, candidates
        );
        Error::CompetingResolutionError(format!("'{}': {}", requirement, e))
    })?;

    let Some(first) = installable.first() else {
        error!(
            "No RPM providing '{}' can be installed from {:?}",
            requirement.name, candidates
        );
        return Err(Error::CompetingResolutionError(format!(
            "no installable candidate provides '{}'",
            requirement
        )));
    };

    if installable.len() > 1 {
        warn!(
            "Found {} installable candidates to provide '{}'. Picking the first one.",
            installable.len(),
            requirement.name
        );
    }

    candidates
        .iter()
        .find(|candidate| same_file_name(candidate, first))
        .cloned()
        .ok_or_else(|| {
            Error::CompetingResolutionError(format!(
                "resolver chose '{}' which is not a candidate for '{}'",
                first.display(),
                requirement
            ))
        })
}

fn same_file_name(a: &Path, b: &Path) -> bool {
    a.file_name().is_some() && a.file_name() == b.file_name()
}

/// `D: ========== +++ <nevr> <arch>-linux 0x0` lines of `rpm -vv` mark
/// packages added to the transaction
static ADDED_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^D: =+ \+\+\+ (\S+) (\S+?)-linux").expect("valid rpm transaction regex"));

/// Packages added to an `rpm -Uvvh --test` transaction as `<nevr>.<arch>`,
/// in output order
pub fn parse_rpm_test_output(stderr: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    stderr
        .lines()
        .filter_map(|line| ADDED_PACKAGE.captures(line.trim_end()))
        .map(|caps| format!("{}.{}", &caps[1], &caps[2]))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Map `rpm --test` output back to RPM paths in `dir`
pub fn installable_rpm_paths(stderr: &str, dir: &Path) -> Vec<PathBuf> {
    parse_rpm_test_output(stderr)
        .into_iter()
        .map(|name| dir.join(format!("{}.rpm", name)))
        .collect()
}

/// Competing resolver backed by a test transaction of the `rpm` tool
pub struct RpmCompetingResolver {
    root: TempDir,
}

impl RpmCompetingResolver {
    /// Create a resolver whose throwaway RPM root lives under `tmp_dir`
    pub fn new(tmp_dir: Option<&Path>) -> Result<Self> {
        let root = match tmp_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                TempDir::new_in(dir)?
            }
            None => TempDir::new()?,
        };
        Ok(Self { root })
    }
}

impl CompetingResolver for RpmCompetingResolver {
    fn resolve_competing_packages(&self, candidates: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let output = Command::new("rpm")
            .args(["-Uvvh", "--replacepkgs", "--nodeps", "--test", "--root"])
            .arg(self.root.path())
            .args(candidates)
            .output()
            .map_err(|e| Error::CommandError(format!("Failed to run rpm: {}. Is rpm installed?", e)))?;

        // rpm exits non-zero when the set conflicts; the debug output still
        // lists what it managed to add
        let stderr = String::from_utf8_lossy(&output.stderr);
        if parse_rpm_test_output(&stderr).is_empty() && !output.status.success() {
            return Err(Error::CommandError(format!("rpm --test failed: {}", stderr.trim())));
        }

        let dir = candidates
            .first()
            .and_then(|c| c.parent())
            .unwrap_or_else(|| Path::new(""));
        Ok(installable_rpm_paths(&stderr, dir))
    }
}
