// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use pkgfetch::{
    ArtifactFetcher, ClonedPackage, ClonerConfig, CompetingResolver, DependencyGraph, FetcherConfig, NodeId,
    NodeState, NodeType, PkgNode, ProviderResolver, RepoCloner, ResolutionSummary, Result, VersionedPkg,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Everything a [`FakeCloner`] knows and records
#[derive(Default)]
pub struct FakeRepo {
    pub provides: HashMap<String, Vec<String>>,
    pub prebuilt: HashSet<String>,
    pub failing: HashSet<String>,
    pub provides_calls: usize,
    pub clone_calls: Vec<String>,
    pub cloned: ResolutionSummary,
    pub restored: Option<ResolutionSummary>,
    pub converted: bool,
}

/// In-memory repository cloner
///
/// Clones share state, so a test can keep one handle while the resolver
/// owns a boxed copy.
#[derive(Clone)]
pub struct FakeCloner {
    out_dir: PathBuf,
    repo: Rc<RefCell<FakeRepo>>,
}

impl FakeCloner {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            repo: Rc::default(),
        }
    }

    pub fn provides(self, requirement: &str, packages: &[&str]) -> Self {
        self.repo.borrow_mut().provides.insert(
            requirement.to_string(),
            packages.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn prebuilt(self, package: &str) -> Self {
        self.repo.borrow_mut().prebuilt.insert(package.to_string());
        self
    }

    pub fn failing(self, package: &str) -> Self {
        self.repo.borrow_mut().failing.insert(package.to_string());
        self
    }

    pub fn boxed(&self) -> Box<dyn RepoCloner> {
        Box::new(self.clone())
    }

    pub fn repo(&self) -> std::cell::Ref<'_, FakeRepo> {
        self.repo.borrow()
    }
}

impl ProviderResolver for FakeCloner {
    fn what_provides(&mut self, pkg: &VersionedPkg) -> Result<Vec<String>> {
        let mut repo = self.repo.borrow_mut();
        repo.provides_calls += 1;
        Ok(repo.provides.get(&pkg.name).cloned().unwrap_or_default())
    }
}

impl ArtifactFetcher for FakeCloner {
    fn clone_package(&mut self, _clone_deps: bool, package: &str) -> Result<bool> {
        let mut repo = self.repo.borrow_mut();
        repo.clone_calls.push(package.to_string());
        if repo.failing.contains(package) {
            return Err(pkgfetch::Error::FetchError(format!("'{}' is unavailable", package)));
        }

        let rpm_path = self.out_dir.join(format!("{}.rpm", package));
        std::fs::write(&rpm_path, package)?;
        let prebuilt = repo.prebuilt.contains(package);
        repo.cloned.insert(package, ClonedPackage { rpm_path, prebuilt });
        Ok(prebuilt)
    }

    fn convert_downloaded_packages_into_repo(&mut self) -> Result<()> {
        self.repo.borrow_mut().converted = true;
        Ok(())
    }

    fn cloned_contents(&self) -> ResolutionSummary {
        self.repo.borrow().cloned.clone()
    }

    fn restore_cloned_contents(&mut self, summary: &ResolutionSummary) -> Result<()> {
        let mut repo = self.repo.borrow_mut();
        repo.cloned = summary.clone();
        repo.restored = Some(summary.clone());
        Ok(())
    }
}

/// Treats the listed file names as installable, in listed order
pub struct FakeCompetingResolver {
    pub installable: Vec<String>,
}

impl FakeCompetingResolver {
    pub fn new(installable: &[&str]) -> Self {
        Self {
            installable: installable.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompetingResolver for FakeCompetingResolver {
    fn resolve_competing_packages(&self, candidates: &[PathBuf]) -> Result<Vec<PathBuf>> {
        Ok(self
            .installable
            .iter()
            .filter_map(|name| {
                candidates
                    .iter()
                    .find(|c| c.file_name().is_some_and(|f| f.to_string_lossy() == name.as_str()))
                    .cloned()
            })
            .collect())
    }
}

/// Scratch layout for one fetch run
pub struct Workspace {
    pub dir: TempDir,
    pub out_dir: PathBuf,
    pub input_graph: PathBuf,
    pub output_graph: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();
        Self {
            input_graph: dir.path().join("input.json"),
            output_graph: dir.path().join("output.json"),
            out_dir,
            dir,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_input(&self, graph: &DependencyGraph) {
        pkgfetch::graph::write_graph_file(graph, &self.input_graph).unwrap();
    }

    pub fn read_output(&self) -> DependencyGraph {
        pkgfetch::graph::read_graph_file(&self.output_graph).unwrap()
    }

    /// Config pointing at this workspace; the fake cloner ignores the
    /// cloner paths
    pub fn config(&self) -> FetcherConfig {
        let cloner = ClonerConfig::new(
            &self.out_dir,
            self.path("rpms"),
            self.path("toolchain_rpms"),
            self.path("worker.tar.gz"),
        );
        FetcherConfig::new(&self.input_graph, &self.output_graph, cloner)
    }
}

/// An unresolved run node requiring `name`
pub fn run_node(id: NodeId, name: &str) -> PkgNode {
    PkgNode::new(id, VersionedPkg::new(name), NodeType::Run, NodeState::Unresolved)
}

/// Graph of unresolved run nodes, one per name, ids in order
pub fn graph_of(names: &[&str]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (i, name) in names.iter().enumerate() {
        graph.add_node(run_node(i as NodeId, name)).unwrap();
    }
    graph
}
