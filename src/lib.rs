// src/lib.rs

//! Graph package fetcher
//!
//! Reads a package build graph, resolves every unresolved run node to an RPM
//! cached in a local output directory and writes the updated graph back.
//!
//! # Architecture
//!
//! - Graph: nodes, edges and the requirement lookup table, stored as JSON
//! - Fetcher: provider lookup and package download, behind traits
//! - Resolver: per-node resolution, competing provider selection, failure policy
//! - Summary: a record of cloned packages that lets a later run skip resolution

pub mod config;
mod error;
pub mod fetcher;
pub mod graph;
pub mod resolver;
pub mod summary;
pub mod toolchain;

pub use config::{ClonerConfig, FetcherConfig, TlsConfig};
pub use error::{Error, Result};
pub use fetcher::{ArtifactFetcher, ProviderResolver, RepoCloner, TdnfCloner};
pub use graph::{DependencyGraph, NodeId, NodeState, NodeType, PkgNode, VersionedPkg};
pub use resolver::{
    CompetingResolver, NodeOutcome, ResolutionReport, ResolveOptions, RpmCompetingResolver, fetch_packages,
    resolve_graph_nodes,
};
pub use summary::{ClonedPackage, ResolutionSummary};
pub use toolchain::ToolchainManifest;
