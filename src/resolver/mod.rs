// src/resolver/mod.rs

//! Node resolution
//!
//! Walks the unresolved run nodes of a build graph and resolves each one to a
//! locally cached RPM, or restores a previous run's cloned packages from a
//! summary file. [`fetch_packages`] drives a whole run: read the graph,
//! resolve, write the graph back and turn the downloads into a repository.
//!
//! Nodes are resolved one after another. Per-run state lives in a
//! [`FetchCache`] so each concrete package is cloned at most once.

mod cache;
mod conflict;
mod engine;
mod plan;

pub use cache::FetchCache;
pub use conflict::{
    CompetingResolver, RpmCompetingResolver, installable_rpm_paths, parse_rpm_test_output, select_competing_package,
};
pub use engine::{ResolveContext, is_prebuilt_toolchain, resolve_single_node};
pub use plan::{NodeOutcome, ResolutionReport};

use crate::config::{ClonerConfig, FetcherConfig};
use crate::error::{Error, Result};
use crate::fetcher::RepoCloner;
use crate::graph::{DependencyGraph, NodeId, read_graph_file, write_graph_file};
use crate::summary::{restore_cloned_repo_contents, save_cloned_repo_contents};
use crate::toolchain::ToolchainManifest;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Summary files and failure policy of a resolution run
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// Restore cloned packages from here instead of resolving nodes
    pub input_summary: Option<&'a Path>,
    /// Save cloned packages here once resolution is over
    pub output_summary: Option<&'a Path>,
    /// Turn any hard failure into an error for the whole run
    pub stop_on_failure: bool,
}

impl<'a> From<&'a FetcherConfig> for ResolveOptions<'a> {
    fn from(config: &'a FetcherConfig) -> Self {
        Self {
            input_summary: config.input_summary.as_deref(),
            output_summary: config.output_summary.as_deref(),
            stop_on_failure: config.stop_on_failure,
        }
    }
}

/// Resolve every unresolved run node of `graph`
///
/// With an input summary the cloner is restored from it and no node is
/// touched. The output summary is saved before the failure policy is
/// applied, so a failed run still records what it fetched.
pub fn resolve_graph_nodes(
    graph: &mut DependencyGraph,
    ctx: &mut ResolveContext<'_>,
    options: &ResolveOptions<'_>,
) -> Result<ResolutionReport> {
    let report = match options.input_summary {
        Some(path) => {
            info!("Restoring cloned packages from {}", path.display());
            restore_cloned_repo_contents(&mut *ctx.cloner, path).inspect_err(|e| {
                error!("Failed to restore cloned repo contents: {}", e);
            })?;
            ResolutionReport::restored()
        }
        None => resolve_unresolved_nodes(graph, ctx)?,
    };

    if let Some(path) = options.output_summary {
        save_cloned_repo_contents(&*ctx.cloner, path).inspect_err(|e| {
            error!("Failed to save cloned repo contents: {}", e);
        })?;
    }

    if options.stop_on_failure && report.has_hard_failures() {
        let failed: Vec<String> = report
            .hard_failures()
            .iter()
            .filter_map(|outcome| graph.node(outcome.node()))
            .map(|node| node.versioned_pkg.to_string())
            .collect();
        return Err(Error::StopOnFailure(format!(
            "failed to resolve {} node(s): {}",
            failed.len(),
            failed.join(", ")
        )));
    }

    Ok(report)
}

/// Node-level errors become outcomes; anything fatal ends the run
fn resolve_unresolved_nodes(graph: &mut DependencyGraph, ctx: &mut ResolveContext<'_>) -> Result<ResolutionReport> {
    let mut cache = FetchCache::new();
    let mut report = ResolutionReport::new();

    let unresolved = graph.unresolved_run_nodes();
    info!("Resolving {} unresolved nodes", unresolved.len());

    for id in unresolved {
        let Some(node) = graph.node_mut(id) else {
            continue;
        };
        let implicit = node.implicit;

        let outcome = match resolve_single_node(ctx, &mut cache, node) {
            Ok(()) => NodeOutcome::Resolved {
                node: id,
                rpm_path: node.rpm_path.clone().unwrap_or_default(),
                state: node.state,
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e @ Error::ProviderResolutionError(_)) if implicit => NodeOutcome::SoftFailure {
                node: id,
                reason: e.to_string(),
            },
            Err(e) => NodeOutcome::HardFailure {
                node: id,
                reason: e.to_string(),
            },
        };

        if let NodeOutcome::HardFailure { reason, .. } = &outcome {
            log_node_failure(graph, id, reason);
        }
        report.push(outcome);
    }

    info!(
        "Resolved {} nodes ({} unresolved implicit, {} failed), cloned {} packages",
        report.resolved_count(),
        report.soft_failure_count(),
        report.hard_failures().len(),
        cache.len()
    );
    Ok(report)
}

fn log_node_failure(graph: &DependencyGraph, id: NodeId, reason: &str) {
    let Some(node) = graph.node(id) else {
        return;
    };
    warn!("Failed to resolve graph node '{}':\n{}", node, reason);

    let mut message = format!(
        "Failed to resolve all nodes in the graph while resolving '{}'\nNodes which have this as a dependency:",
        node
    );
    for dependent in graph.dependents(id) {
        let _ = write!(message, "\n\t'{}' depends on '{}'", dependent, node);
    }
    debug!("{}", message);
}

/// Run one complete fetch
///
/// The cloner is only built when the graph has unresolved nodes. The output
/// graph is written only when resolution succeeds. Returns `None` when there
/// was nothing to resolve.
pub fn fetch_packages<F>(
    config: &FetcherConfig,
    competing: &dyn CompetingResolver,
    make_cloner: F,
) -> Result<Option<ResolutionReport>>
where
    F: FnOnce(&ClonerConfig) -> Result<Box<dyn RepoCloner>>,
{
    let mut graph = read_graph_file(&config.input_graph)?;
    let toolchain = ToolchainManifest::load(config.toolchain_manifest.as_deref())?;

    let merged = graph.merge_remote_nodes()?;
    debug!("Added {} remote nodes to the lookup table", merged);

    let stats = graph.stats();
    info!(
        "Graph has {} nodes, {} edges, {} run nodes ({} unresolved)",
        stats.total_nodes, stats.total_edges, stats.run_nodes, stats.unresolved_nodes
    );

    if stats.unresolved_nodes == 0 {
        info!("No unresolved packages to cache");
        write_graph_file(&graph, &config.output_graph)?;
        return Ok(None);
    }

    info!("Found unresolved packages to cache, downloading packages");
    let mut cloner = make_cloner(&config.cloner).map_err(|e| match e {
        Error::FetcherSetupError(_) => e,
        other => Error::FetcherSetupError(other.to_string()),
    })?;

    let report = {
        let mut ctx = ResolveContext {
            cloner: cloner.as_mut(),
            competing,
            toolchain: &toolchain,
            out_dir: config.out_dir(),
            clone_deps: config.clone_deps,
        };
        resolve_graph_nodes(&mut graph, &mut ctx, &ResolveOptions::from(config))?
    };

    write_graph_file(&graph, &config.output_graph)?;
    info!(
        "Wrote resolved graph to {} ({} run nodes still unresolved)",
        config.output_graph.display(),
        graph.stats().unresolved_nodes
    );

    cloner.convert_downloaded_packages_into_repo().map_err(|e| match e {
        Error::RepoConversionError(_) => e,
        other => Error::RepoConversionError(other.to_string()),
    })?;

    Ok(Some(report))
}
