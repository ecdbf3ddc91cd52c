// src/error.rs

//! Error types for graph package fetching
//!
//! Errors fall into two groups. Run-level errors (reading the graph or the
//! toolchain manifest, setting up the cloner, summaries, writing the graph,
//! repository conversion, stop-on-failure) abort the whole run. Node-level
//! errors (provider lookup, fetch, competing resolution) are recorded against
//! a single node and the run carries on.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The input graph could not be read or is malformed
    #[error("failed to read graph: {0}")]
    GraphReadError(String),

    /// The updated graph could not be written
    #[error("failed to write graph: {0}")]
    GraphWriteError(String),

    /// The graph was modified in a way that breaks one of its invariants
    #[error("graph error: {0}")]
    GraphError(String),

    /// The toolchain manifest could not be read
    #[error("failed to read toolchain manifest: {0}")]
    ManifestReadError(String),

    /// The repository cloner could not be constructed
    #[error("failed to set up package cloner: {0}")]
    FetcherSetupError(String),

    /// No package provides a requirement
    #[error("failed to resolve requirement: {0}")]
    ProviderResolutionError(String),

    /// A provider could not be cloned into the output directory
    #[error("failed to fetch package: {0}")]
    FetchError(String),

    /// None of several competing candidates can be installed
    #[error("failed to resolve competing packages: {0}")]
    CompetingResolutionError(String),

    /// A saved summary could not be restored
    #[error("failed to restore summary: {0}")]
    SummaryRestoreError(String),

    /// A summary could not be saved
    #[error("failed to save summary: {0}")]
    SummarySaveError(String),

    /// Some nodes failed and the run was configured to stop on failure
    #[error("failed to cache unresolved nodes: {0}")]
    StopOnFailure(String),

    /// Downloaded packages could not be turned into a local repository
    #[error("failed to convert downloaded packages into a repository: {0}")]
    RepoConversionError(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// An external command could not be run or exited unsuccessfully
    #[error("command failed: {0}")]
    CommandError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single node
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ProviderResolutionError(_) | Self::FetchError(_) | Self::CompetingResolutionError(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_level_errors_are_not_fatal() {
        assert!(!Error::ProviderResolutionError("gcc".to_string()).is_fatal());
        assert!(!Error::FetchError("gcc".to_string()).is_fatal());
        assert!(!Error::CompetingResolutionError("gcc".to_string()).is_fatal());
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert!(Error::GraphReadError("bad".to_string()).is_fatal());
        assert!(Error::SummaryRestoreError("bad".to_string()).is_fatal());
        assert!(Error::StopOnFailure("1 node".to_string()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("missing"));
    }
}
