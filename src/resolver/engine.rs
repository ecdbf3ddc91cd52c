// src/resolver/engine.rs

//! Single node resolution
//!
//! Resolving a node means finding the packages that provide its
//! requirement, cloning each of them once per run, choosing one RPM and
//! deciding whether the scheduler may use it straight away.

use crate::error::{Error, Result};
use crate::fetcher::{RepoCloner, rpm_package_to_rpm_path};
use crate::graph::{NodeState, NodeType, PkgNode};
use crate::toolchain::ToolchainManifest;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::cache::FetchCache;
use super::conflict::{CompetingResolver, select_competing_package};

/// Collaborators and settings shared by every node of a run
pub struct ResolveContext<'a> {
    pub cloner: &'a mut dyn RepoCloner,
    pub competing: &'a dyn CompetingResolver,
    pub toolchain: &'a ToolchainManifest,
    /// Directory cloned RPMs land in
    pub out_dir: &'a Path,
    /// Clone the dependency closure of each provider as well
    pub clone_deps: bool,
}

/// Resolve one unresolved node to a cached RPM
///
/// On success the node's RPM path, state and possibly type are updated. On
/// failure the node is left untouched.
pub fn resolve_single_node(ctx: &mut ResolveContext<'_>, cache: &mut FetchCache, node: &mut PkgNode) -> Result<()> {
    if node.state != NodeState::Unresolved {
        return Err(Error::GraphError(format!("{} is not unresolved", node)));
    }

    debug!("Adding node {} to the cache", node.friendly_name());
    let providers = find_providers(ctx, node)?;

    for provider in &providers {
        if cache.is_fetched(provider) {
            continue;
        }

        let prebuilt = ctx
            .cloner
            .clone_package(ctx.clone_deps, provider)
            .map_err(|e| match e {
                // The output directory itself is unusable
                Error::IoError(_) => e,
                other => Error::FetchError(format!("failed to clone '{}' from RPM repo: {}", provider, other)),
            })?;
        cache.record(provider, prebuilt);

        debug!("Fetched '{}' as potential candidate (is pre-built: {}).", provider, prebuilt);
    }

    let candidates: Vec<PathBuf> = providers
        .iter()
        .map(|provider| rpm_package_to_rpm_path(provider, ctx.out_dir))
        .collect();

    let index = if candidates.len() == 1 {
        0
    } else {
        let chosen = select_competing_package(ctx.competing, &node.versioned_pkg, &candidates)?;
        candidates
            .iter()
            .position(|candidate| *candidate == chosen)
            .ok_or_else(|| Error::CompetingResolutionError(format!("'{}' is not a candidate", chosen.display())))?
    };

    let rpm_path = candidates[index].clone();
    if is_prebuilt_toolchain(&rpm_path, cache.is_prebuilt(&providers[index]), ctx.toolchain) {
        debug!("Using a prebuilt toolchain package to resolve this dependency");
        node.state = NodeState::UpToDate;
        node.node_type = NodeType::PreBuilt;
    } else {
        node.state = NodeState::Cached;
    }

    info!(
        "Choosing '{}' to provide '{}'.",
        rpm_path.file_name().unwrap_or_default().to_string_lossy(),
        node.versioned_pkg.name
    );
    node.rpm_path = Some(rpm_path);

    Ok(())
}

/// Distinct providers of the node's requirement, in resolver order
fn find_providers(ctx: &mut ResolveContext<'_>, node: &PkgNode) -> Result<Vec<String>> {
    debug!("Searching for a package which supplies: {}", node.versioned_pkg.name);

    let found = ctx.cloner.what_provides(&node.versioned_pkg).and_then(|providers| {
        if providers.is_empty() {
            Err(Error::ProviderResolutionError(format!(
                "failed to find any packages providing '{}'",
                node.versioned_pkg
            )))
        } else {
            Ok(providers)
        }
    });

    match found {
        Ok(providers) => {
            let mut seen = HashSet::new();
            Ok(providers.into_iter().filter(|p| seen.insert(p.clone())).collect())
        }
        Err(e) => {
            let msg = format!("Failed to resolve ({}) to a package. Error: {}", node.versioned_pkg, e);
            // An implicit requirement may still be produced later in the build
            if node.implicit {
                debug!("{}", msg);
            } else {
                error!("{}", msg);
            }
            Err(match e {
                Error::ProviderResolutionError(_) => e,
                other => Error::ProviderResolutionError(other.to_string()),
            })
        }
    }
}

/// A locally pre-built RPM listed in the toolchain manifest can be used
/// without waiting on anything else
pub fn is_prebuilt_toolchain(rpm_path: &Path, prebuilt: bool, toolchain: &ToolchainManifest) -> bool {
    prebuilt && toolchain.contains(rpm_path)
}
