// src/graph/mod.rs

//! Package build graph
//!
//! The graph is produced by the build planner. Each node is a package
//! requirement in a given state, and an edge `a -> b` means "a depends on b".
//! Fetching only ever rewrites node fields (state, type, RPM path); the edge
//! set is left untouched.
//!
//! Requirements are also indexed in a lookup table whose "run slot" points at
//! the node that satisfies the requirement at run time. Run nodes are
//! registered on insertion, remote nodes are merged in by
//! [`DependencyGraph::merge_remote_nodes`].

pub mod file;

pub use file::{read_graph_file, write_graph_file};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Unique identifier of a node within one graph
pub type NodeId = u64;

/// A package requirement: a name with an optional version condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionedPkg {
    pub name: String,
    /// Comparison operator such as `=`, `>=` or `<`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl VersionedPkg {
    /// Requirement on any version of a package
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
            version: None,
        }
    }

    /// Constrain the requirement to versions matching `condition version`
    pub fn with_version(mut self, condition: impl Into<String>, version: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for VersionedPkg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.condition, &self.version) {
            (Some(condition), Some(version)) => write!(f, "{} {} {}", self.name, condition, version),
            (None, Some(version)) => write!(f, "{} = {}", self.name, version),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Build state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Needs an RPM from a repository
    Unresolved,
    /// An RPM has been cached locally
    Cached,
    /// Ready to use without waiting on anything
    UpToDate,
    /// Must be built
    Build,
    /// Bookkeeping node with nothing to build or fetch
    Meta,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "Unresolved"),
            Self::Cached => write!(f, "Cached"),
            Self::UpToDate => write!(f, "UpToDate"),
            Self::Build => write!(f, "Build"),
            Self::Meta => write!(f, "Meta"),
        }
    }
}

/// Role of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Build,
    Run,
    Goal,
    /// A requirement satisfied from a remote repository
    Remote,
    PureMeta,
    /// A locally available toolchain package
    PreBuilt,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "BUILD"),
            Self::Run => write!(f, "RUN"),
            Self::Goal => write!(f, "GOAL"),
            Self::Remote => write!(f, "REMOTE"),
            Self::PureMeta => write!(f, "PUREMETA"),
            Self::PreBuilt => write!(f, "PREBUILT"),
        }
    }
}

/// A node in the package graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgNode {
    pub id: NodeId,
    #[serde(rename = "pkg")]
    pub versioned_pkg: VersionedPkg,
    pub state: NodeState,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// The requirement may be satisfied later by something built during the run
    #[serde(default)]
    pub implicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srpm_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,
}

impl PkgNode {
    pub fn new(id: NodeId, versioned_pkg: VersionedPkg, node_type: NodeType, state: NodeState) -> Self {
        Self {
            id,
            versioned_pkg,
            state,
            node_type,
            implicit: false,
            rpm_path: None,
            srpm_path: None,
            spec_path: None,
            architecture: None,
            source_repo: None,
        }
    }

    /// An unresolved remote requirement, the usual input to fetching
    pub fn remote(id: NodeId, versioned_pkg: VersionedPkg) -> Self {
        Self::new(id, versioned_pkg, NodeType::Remote, NodeState::Unresolved)
    }

    pub fn with_implicit(mut self, implicit: bool) -> Self {
        self.implicit = implicit;
        self
    }

    pub fn with_rpm_path(mut self, rpm_path: impl Into<PathBuf>) -> Self {
        self.rpm_path = Some(rpm_path.into());
        self
    }

    /// Short name for log messages
    pub fn friendly_name(&self) -> String {
        format!("{} ({})", self.versioned_pkg.name, self.node_type)
    }
}

impl fmt::Display for PkgNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}<{}>", self.versioned_pkg, self.node_type, self.state)
    }
}

/// Package graph with forward and reverse adjacency
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<NodeId, PkgNode>,
    /// Map from node to the nodes it depends on
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Map from node to the nodes that depend on it
    reverse_edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Run slot of each requirement
    lookup: BTreeMap<VersionedPkg, NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, registering run nodes in the lookup table
    pub fn add_node(&mut self, node: PkgNode) -> Result<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(Error::GraphError(format!("duplicate node id {}", id)));
        }

        if node.node_type == NodeType::Run {
            if let Some(existing) = self.lookup.get(&node.versioned_pkg) {
                return Err(Error::GraphError(format!(
                    "'{}' already has a run node ({})",
                    node.versioned_pkg, existing
                )));
            }
            self.lookup.insert(node.versioned_pkg.clone(), id);
        }

        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Add a "depends on" edge between two existing nodes
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(Error::GraphError(format!("edge {} -> {} names unknown node {}", from, to, id)));
            }
        }

        self.edges.entry(from).or_default().insert(to);
        self.reverse_edges.entry(to).or_default().insert(from);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&PkgNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PkgNode> {
        self.nodes.get_mut(&id)
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &PkgNode> {
        self.nodes.values()
    }

    /// All edges as `(from, to)` pairs in sorted order
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to)))
    }

    /// Nodes with an edge pointing at `id`
    pub fn dependents(&self, id: NodeId) -> Vec<&PkgNode> {
        self.reverse_edges
            .get(&id)
            .map(|froms| froms.iter().filter_map(|from| self.nodes.get(from)).collect())
            .unwrap_or_default()
    }

    /// Put a remote node into the run slot of its requirement
    ///
    /// An occupied slot is an error unless `allow_duplicate` is set, in which
    /// case the remote node replaces the current occupant.
    pub fn add_remote_to_lookup(&mut self, id: NodeId, allow_duplicate: bool) -> Result<()> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| Error::GraphError(format!("unknown node {}", id)))?;

        if node.node_type != NodeType::Remote {
            return Err(Error::GraphError(format!("{} is not a remote node", node)));
        }

        if let Some(&existing) = self.lookup.get(&node.versioned_pkg) {
            if existing == id {
                return Ok(());
            }
            if !allow_duplicate {
                return Err(Error::GraphError(format!(
                    "'{}' already has a run node ({})",
                    node.versioned_pkg, existing
                )));
            }
            debug!("Replacing run node {} with remote node {} for '{}'", existing, id, node.versioned_pkg);
        }

        self.lookup.insert(node.versioned_pkg.clone(), id);
        Ok(())
    }

    /// Merge every remote node into the lookup table, replacing run nodes
    /// for the same requirement
    pub fn merge_remote_nodes(&mut self) -> Result<usize> {
        let remote: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.node_type == NodeType::Remote)
            .map(|n| n.id)
            .collect();

        for id in &remote {
            self.add_remote_to_lookup(*id, true)?;
        }

        Ok(remote.len())
    }

    /// Ids of all nodes occupying a run slot, in id order
    pub fn run_nodes(&self) -> Vec<NodeId> {
        let ids: BTreeSet<NodeId> = self.lookup.values().copied().collect();
        ids.into_iter().collect()
    }

    /// Ids of run nodes still waiting for an RPM
    pub fn unresolved_run_nodes(&self) -> Vec<NodeId> {
        self.run_nodes()
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.state == NodeState::Unresolved))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.values().map(|v| v.len()).sum(),
            run_nodes: self.lookup.len(),
            unresolved_nodes: self.unresolved_run_nodes().len(),
        }
    }
}

/// Statistics about the package graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub run_nodes: usize,
    pub unresolved_nodes: usize,
}
