// src/toolchain.rs

//! Toolchain manifest
//!
//! The manifest lists the RPM file names produced by the bootstrap toolchain,
//! one per line. A node resolved to one of these RPMs, when the RPM was
//! already available locally, can be used by the scheduler straight away.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Read-only set of toolchain RPM file names
#[derive(Debug, Clone, Default)]
pub struct ToolchainManifest {
    rpms: HashSet<String>,
}

impl ToolchainManifest {
    /// Parse manifest text; blank lines and `#` comments are ignored
    pub fn parse(content: &str) -> Self {
        let rpms = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        Self { rpms }
    }

    /// Load a manifest file; no path means an empty manifest
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No toolchain manifest given, no packages will be marked pre-built");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ManifestReadError(format!("'{}': {}", path.display(), e)))?;

        let manifest = Self::parse(&content);
        debug!("Loaded {} toolchain RPMs from {}", manifest.len(), path.display());
        Ok(manifest)
    }

    /// Whether an RPM, given by path or bare file name, is a toolchain RPM
    pub fn contains(&self, rpm_path: &Path) -> bool {
        rpm_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.rpms.contains(name))
    }

    pub fn len(&self) -> usize {
        self.rpms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rpms.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ToolchainManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            rpms: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let manifest = ToolchainManifest::parse(
            "# toolchain\ngcc-12.2.0-1.x86_64.rpm\n\n  glibc-2.35-1.x86_64.rpm  \n",
        );
        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains(Path::new("glibc-2.35-1.x86_64.rpm")));
    }

    #[test]
    fn test_contains_uses_file_name() {
        let manifest: ToolchainManifest = ["gcc-toolchain-12.rpm"].into_iter().collect();
        assert!(manifest.contains(&PathBuf::from("/out/gcc-toolchain-12.rpm")));
        assert!(!manifest.contains(&PathBuf::from("/out/gcc-toolchain-13.rpm")));
        assert!(!manifest.contains(&PathBuf::from("/")));
    }

    #[test]
    fn test_load_without_path() {
        assert!(ToolchainManifest::load(None).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let result = ToolchainManifest::load(Some(&path));
        assert!(matches!(result, Err(Error::ManifestReadError(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolchain.txt");
        std::fs::write(&path, "binutils-2.39-1.x86_64.rpm\n").unwrap();

        let manifest = ToolchainManifest::load(Some(&path)).unwrap();
        assert!(manifest.contains(Path::new("binutils-2.39-1.x86_64.rpm")));
    }
}
