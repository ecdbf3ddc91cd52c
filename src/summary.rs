// src/summary.rs

//! Cloned package summaries
//!
//! A summary records every package the cloner fetched during a run, with the
//! local RPM path and whether it came from a pre-built directory. Feeding a
//! summary to a later run restores the cloner's state instead of resolving
//! the graph over the network.

use crate::error::{Error, Result};
use crate::fetcher::ArtifactFetcher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Current summary file format version
pub const SUMMARY_VERSION: u32 = 1;

/// A package fetched into the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClonedPackage {
    pub rpm_path: PathBuf,
    /// Found in a local pre-built directory rather than downloaded
    pub prebuilt: bool,
}

/// Mapping from cloned package name to its local artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub version: u32,
    #[serde(default)]
    pub packages: BTreeMap<String, ClonedPackage>,
}

impl Default for ResolutionSummary {
    fn default() -> Self {
        Self {
            version: SUMMARY_VERSION,
            packages: BTreeMap::new(),
        }
    }
}

impl ResolutionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, package: ClonedPackage) {
        self.packages.insert(name.into(), package);
    }

    pub fn get(&self, name: &str) -> Option<&ClonedPackage> {
        self.packages.get(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Load a summary file; any I/O or format problem is a restore error
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::SummaryRestoreError(format!("'{}': {}", path.display(), e)))?;

        let summary: Self = serde_json::from_str(&content)
            .map_err(|e| Error::SummaryRestoreError(format!("'{}': {}", path.display(), e)))?;

        if summary.version != SUMMARY_VERSION {
            return Err(Error::SummaryRestoreError(format!(
                "'{}' has unsupported version {} (expected {})",
                path.display(),
                summary.version,
                SUMMARY_VERSION
            )));
        }

        Ok(summary)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::SummarySaveError(e.to_string()))?;
        content.push('\n');

        std::fs::write(path, content)
            .map_err(|e| Error::SummarySaveError(format!("'{}': {}", path.display(), e)))
    }
}

/// Write the cloner's fetched packages to a summary file
pub fn save_cloned_repo_contents(fetcher: &dyn ArtifactFetcher, path: &Path) -> Result<()> {
    let summary = fetcher.cloned_contents();
    summary.save(path)?;
    info!("Saved summary of {} cloned packages to {}", summary.len(), path.display());
    Ok(())
}

/// Restore the cloner's fetched packages from a summary file
///
/// Nothing is applied unless the whole file parses.
pub fn restore_cloned_repo_contents(fetcher: &mut dyn ArtifactFetcher, path: &Path) -> Result<()> {
    let summary = ResolutionSummary::load(path)?;
    fetcher
        .restore_cloned_contents(&summary)
        .map_err(|e| match e {
            Error::SummaryRestoreError(_) => e,
            other => Error::SummaryRestoreError(other.to_string()),
        })?;
    info!("Restored {} cloned packages from {}", summary.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolutionSummary {
        let mut summary = ResolutionSummary::new();
        summary.insert(
            "zlib-1.2.13-1.x86_64",
            ClonedPackage {
                rpm_path: PathBuf::from("/out/zlib-1.2.13-1.x86_64.rpm"),
                prebuilt: false,
            },
        );
        summary.insert(
            "gcc-12.2.0-1.x86_64",
            ClonedPackage {
                rpm_path: PathBuf::from("/out/gcc-12.2.0-1.x86_64.rpm"),
                prebuilt: true,
            },
        );
        summary
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        sample().save(&path).unwrap();
        let loaded = ResolutionSummary::load(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(loaded.get("gcc-12.2.0-1.x86_64").unwrap().prebuilt);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ResolutionSummary::load(&dir.path().join("none.json"));
        assert!(matches!(result, Err(Error::SummaryRestoreError(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(ResolutionSummary::load(&path), Err(Error::SummaryRestoreError(_))));
    }

    #[test]
    fn test_load_wrong_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        std::fs::write(&path, r#"{ "version": 9, "packages": {} }"#).unwrap();
        assert!(matches!(ResolutionSummary::load(&path), Err(Error::SummaryRestoreError(_))));
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("summary.json");
        assert!(matches!(sample().save(&path), Err(Error::SummarySaveError(_))));
    }
}
