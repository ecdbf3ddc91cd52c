// src/config.rs

//! Fetcher configuration types

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// TLS client credentials for repository downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl TlsConfig {
    /// Combine an optional certificate and key; giving only one is an error
    pub fn from_parts(cert: Option<PathBuf>, key: Option<PathBuf>) -> Result<Option<Self>> {
        match (cert, key) {
            (Some(cert), Some(key)) => Ok(Some(Self { cert, key })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::ConfigError(
                "a TLS client certificate was given without a key".to_string(),
            )),
            (None, Some(_)) => Err(Error::ConfigError(
                "a TLS client key was given without a certificate".to_string(),
            )),
        }
    }
}

/// Settings for the repository cloner
#[derive(Debug, Clone)]
pub struct ClonerConfig {
    /// Directory RPMs are downloaded into
    pub out_dir: PathBuf,

    /// Directory of already built RPMs
    pub rpm_dir: PathBuf,

    /// Directory of already built toolchain RPMs
    pub toolchain_rpms_dir: PathBuf,

    /// Scratch space; a private temporary directory is used when unset
    pub tmp_dir: Option<PathBuf>,

    /// Gzipped tarball of the worker environment tdnf runs in
    pub worker_tar: PathBuf,

    /// Repository definitions to fetch from
    pub repo_files: Vec<PathBuf>,

    /// Enable repositories whose id marks them as preview repositories
    pub use_preview_repo: bool,

    /// Ignore the repositories shipped in the worker environment
    pub disable_default_repos: bool,

    /// Only use locally available RPMs
    pub disable_upstream_repos: bool,

    pub tls: Option<TlsConfig>,
}

impl ClonerConfig {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        rpm_dir: impl Into<PathBuf>,
        toolchain_rpms_dir: impl Into<PathBuf>,
        worker_tar: impl Into<PathBuf>,
    ) -> Self {
        Self {
            out_dir: out_dir.into(),
            rpm_dir: rpm_dir.into(),
            toolchain_rpms_dir: toolchain_rpms_dir.into(),
            tmp_dir: None,
            worker_tar: worker_tar.into(),
            repo_files: Vec::new(),
            use_preview_repo: false,
            disable_default_repos: false,
            disable_upstream_repos: false,
            tls: None,
        }
    }

    pub fn with_repo_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_files.push(path.into());
        self
    }

    pub fn with_tmp_dir(mut self, path: Option<PathBuf>) -> Self {
        self.tmp_dir = path;
        self
    }

    pub fn with_tls(mut self, tls: Option<TlsConfig>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_preview_repo(mut self, enabled: bool) -> Self {
        self.use_preview_repo = enabled;
        self
    }

    pub fn with_default_repos_disabled(mut self, disabled: bool) -> Self {
        self.disable_default_repos = disabled;
        self
    }

    pub fn with_upstream_repos_disabled(mut self, disabled: bool) -> Self {
        self.disable_upstream_repos = disabled;
        self
    }

    /// Check that every required input exists
    pub fn validate(&self) -> Result<()> {
        require_dir("rpm directory", &self.rpm_dir)?;
        require_dir("toolchain rpm directory", &self.toolchain_rpms_dir)?;
        require_file("worker archive", &self.worker_tar)?;

        if self.repo_files.is_empty() {
            return Err(Error::ConfigError("at least one repo file is required".to_string()));
        }
        for repo_file in &self.repo_files {
            require_file("repo file", repo_file)?;
        }

        if let Some(tls) = &self.tls {
            require_file("TLS client certificate", &tls.cert)?;
            require_file("TLS client key", &tls.key)?;
        }

        Ok(())
    }
}

/// Settings for one fetch run
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Graph to read
    pub input_graph: PathBuf,

    /// Where the updated graph is written
    pub output_graph: PathBuf,

    /// RPM file names produced by the toolchain
    pub toolchain_manifest: Option<PathBuf>,

    /// Fail the run if any node could not be resolved
    pub stop_on_failure: bool,

    /// Restore cloned packages from this summary instead of resolving
    pub input_summary: Option<PathBuf>,

    /// Save a summary of cloned packages here
    pub output_summary: Option<PathBuf>,

    /// Fetch the dependency closure of each provider
    pub clone_deps: bool,

    pub cloner: ClonerConfig,
}

impl FetcherConfig {
    pub fn new(input_graph: impl Into<PathBuf>, output_graph: impl Into<PathBuf>, cloner: ClonerConfig) -> Self {
        Self {
            input_graph: input_graph.into(),
            output_graph: output_graph.into(),
            toolchain_manifest: None,
            stop_on_failure: false,
            input_summary: None,
            output_summary: None,
            clone_deps: true,
            cloner,
        }
    }

    pub fn with_toolchain_manifest(mut self, path: Option<PathBuf>) -> Self {
        self.toolchain_manifest = path;
        self
    }

    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Blank paths are treated as unset
    pub fn with_input_summary(mut self, path: Option<PathBuf>) -> Self {
        self.input_summary = non_blank(path);
        self
    }

    /// Blank paths are treated as unset
    pub fn with_output_summary(mut self, path: Option<PathBuf>) -> Self {
        self.output_summary = non_blank(path);
        self
    }

    /// Directory resolved RPM paths point into
    pub fn out_dir(&self) -> &Path {
        &self.cloner.out_dir
    }
}

fn non_blank(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.to_string_lossy().trim().is_empty())
}

fn require_dir(what: &str, path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::ConfigError(format!("{} '{}' is not a directory", what, path.display())));
    }
    Ok(())
}

fn require_file(what: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::ConfigError(format!("{} '{}' does not exist", what, path.display())));
    }
    Ok(())
}
