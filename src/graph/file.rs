// src/graph/file.rs

//! JSON graph file format
//!
//! ```text
//! {
//!   "nodes": [ { "id": 0, "pkg": { "name": "zlib" }, "state": "unresolved", "type": "remote" } ],
//!   "edges": [ [1, 0] ]
//! }
//! ```
//!
//! Nodes are written in id order and edges sorted, so a graph that was read
//! and not modified is written back byte-for-byte identical.

use super::{DependencyGraph, NodeId, PkgNode};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    nodes: Vec<PkgNode>,
    #[serde(default)]
    edges: Vec<(NodeId, NodeId)>,
}

/// Parse a graph from its JSON text
pub fn parse_graph(content: &str) -> Result<DependencyGraph> {
    let document: GraphDocument =
        serde_json::from_str(content).map_err(|e| Error::GraphReadError(e.to_string()))?;

    let mut graph = DependencyGraph::new();
    for node in document.nodes {
        graph
            .add_node(node)
            .map_err(|e| Error::GraphReadError(e.to_string()))?;
    }
    for (from, to) in document.edges {
        graph
            .add_edge(from, to)
            .map_err(|e| Error::GraphReadError(e.to_string()))?;
    }

    Ok(graph)
}

/// Render a graph as JSON text, including a trailing newline
pub fn render_graph(graph: &DependencyGraph) -> Result<String> {
    let document = GraphDocument {
        nodes: graph.nodes().cloned().collect(),
        edges: graph.edges().collect(),
    };

    let mut content =
        serde_json::to_string_pretty(&document).map_err(|e| Error::GraphWriteError(e.to_string()))?;
    content.push('\n');
    Ok(content)
}

/// Read a graph file
pub fn read_graph_file(path: impl AsRef<Path>) -> Result<DependencyGraph> {
    let path = path.as_ref();
    debug!("Reading graph from {}", path.display());

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::GraphReadError(format!("{}: {}", path.display(), e)))?;

    parse_graph(&content).map_err(|e| match e {
        Error::GraphReadError(msg) => Error::GraphReadError(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Write a graph file
///
/// The content goes to a temporary file next to `path` which is then
/// renamed over it, so readers never observe a half-written graph.
pub fn write_graph_file(graph: &DependencyGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing graph to {}", path.display());

    let content = render_graph(graph)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_err = |e: std::io::Error| Error::GraphWriteError(format!("{}: {}", path.display(), e));

    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
