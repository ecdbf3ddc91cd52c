// src/main.rs

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use pkgfetch::{
    ClonerConfig, FetcherConfig, RepoCloner, RpmCompetingResolver, TdnfCloner, TlsConfig, fetch_packages,
};
use std::fs::File;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = build_config(cli)?;
    let competing = RpmCompetingResolver::new(config.cloner.tmp_dir.as_deref())
        .context("Failed to set up the competing package resolver")?;

    let report = fetch_packages(&config, &competing, |cloner_config| {
        let cloner = TdnfCloner::new(cloner_config)?;
        Ok(Box::new(cloner) as Box<dyn RepoCloner>)
    })
    .with_context(|| format!("Failed to fetch packages for {}", config.input_graph.display()))?;

    match report {
        Some(report) if report.restored => info!("Restored cloned packages from summary"),
        Some(report) => {
            for failure in report.hard_failures() {
                warn!("Unresolved node {}", failure.node());
            }
            info!(
                "Resolved {} nodes, {} failed",
                report.resolved_count(),
                report.hard_failures().len()
            );
        }
        None => info!("Graph had no unresolved nodes"),
    }

    Ok(())
}

/// Log to stderr, and also to `--log-file` when given
///
/// `--log-level` wins over `RUST_LOG`; without either the level is info.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn build_config(cli: Cli) -> Result<FetcherConfig> {
    let tls = TlsConfig::from_parts(cli.tls_cert, cli.tls_key)?;

    let mut cloner = ClonerConfig::new(cli.output_dir, cli.rpm_dir, cli.toolchain_rpms_dir, cli.tdnf_worker)
        .with_tmp_dir(cli.tmp_dir)
        .with_tls(tls)
        .with_preview_repo(cli.use_preview_repo)
        .with_default_repos_disabled(cli.disable_default_repos)
        .with_upstream_repos_disabled(cli.disable_upstream_repos);
    for repo_file in cli.repo_files {
        cloner = cloner.with_repo_file(repo_file);
    }

    Ok(FetcherConfig::new(cli.input, cli.output, cloner)
        .with_toolchain_manifest(cli.toolchain_manifest)
        .with_stop_on_failure(cli.stop_on_failure)
        .with_input_summary(cli.input_summary_file)
        .with_output_summary(cli.output_summary_file))
}
