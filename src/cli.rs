// src/cli.rs
//! Command line definition for pkgfetch

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pkgfetch")]
#[command(author = "Conary Contributors")]
#[command(version)]
#[command(
    about = "Resolve unresolved nodes of a package build graph to locally cached RPMs",
    long_about = None
)]
pub struct Cli {
    /// Input graph file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output graph file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory to download packages into
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Directory containing locally built RPMs
    #[arg(long)]
    pub rpm_dir: PathBuf,

    /// Directory containing RPMs built by the toolchain
    #[arg(long)]
    pub toolchain_rpms_dir: PathBuf,

    /// Directory for temporary files
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Worker environment archive (tar.gz) containing tdnf
    #[arg(long)]
    pub tdnf_worker: PathBuf,

    /// Repository file to use; may be given more than once
    #[arg(long = "repo-file", required = true)]
    pub repo_files: Vec<PathBuf>,

    /// Enable preview repositories
    #[arg(long)]
    pub use_preview_repo: bool,

    /// Do not use the worker's default repositories
    #[arg(long)]
    pub disable_default_repos: bool,

    /// Disable all upstream repositories, only local RPMs are used
    #[arg(long)]
    pub disable_upstream_repos: bool,

    /// File listing the RPMs produced by the toolchain
    #[arg(long)]
    pub toolchain_manifest: Option<PathBuf>,

    /// TLS client certificate for repository access
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// TLS client key for repository access
    #[arg(long)]
    pub tls_key: Option<PathBuf>,

    /// Fail if any node cannot be resolved
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Restore cloned packages from this summary instead of resolving nodes
    #[arg(long)]
    pub input_summary_file: Option<PathBuf>,

    /// Save a summary of cloned packages to this file
    #[arg(long)]
    pub output_summary_file: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "pkgfetch=trace" (overrides RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}
