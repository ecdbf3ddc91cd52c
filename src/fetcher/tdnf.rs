// src/fetcher/tdnf.rs

//! tdnf-backed repository cloner
//!
//! Packages are looked up and downloaded by running `tdnf` against a worker
//! environment extracted into a private scratch directory. RPMs that already
//! exist in the pre-built directories are copied instead of downloaded and
//! reported as pre-built.

use super::repo_file::parse_repo_file;
use super::worker::extract_worker_archive;
use super::{ArtifactFetcher, ProviderResolver, rpm_package_to_rpm_path};
use crate::config::ClonerConfig;
use crate::error::{Error, Result};
use crate::graph::VersionedPkg;
use crate::summary::{ClonedPackage, ResolutionSummary};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// `<name>-<version>-<release>.<arch> : <summary>`
static PROVIDES_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+-\S+\.\S+)\s+:\s").expect("valid provides regex"));

/// tdnf output when nothing matches a query
const NO_MATCH_MARKERS: [&str; 3] = ["No data available", "No matching packages", "No match for argument"];

/// Extract package names from `tdnf provides` output, keeping first-seen order
pub fn parse_provides_output(stdout: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    stdout
        .lines()
        .filter_map(|line| PROVIDES_LINE.captures(line.trim_end()))
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Repository cloner driving tdnf inside a worker environment
pub struct TdnfCloner {
    out_dir: PathBuf,
    worker_root: PathBuf,
    repos_dir: PathBuf,
    /// Repository selection and TLS arguments passed to every tdnf call
    repo_args: Vec<String>,
    /// Pre-built RPMs by package name
    local_rpms: HashMap<String, PathBuf>,
    cloned: BTreeMap<String, ClonedPackage>,
    /// Owns the worker root and repos directory
    _scratch: TempDir,
}

impl TdnfCloner {
    /// Set up the worker environment and repository configuration
    pub fn new(config: &ClonerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::FetcherSetupError(e.to_string()))?;

        std::fs::create_dir_all(&config.out_dir).map_err(|e| {
            Error::FetcherSetupError(format!("cannot create '{}': {}", config.out_dir.display(), e))
        })?;

        let scratch = match &config.tmp_dir {
            Some(tmp_dir) => {
                std::fs::create_dir_all(tmp_dir)?;
                TempDir::new_in(tmp_dir)
            }
            None => TempDir::new(),
        }
        .map_err(|e| Error::FetcherSetupError(format!("cannot create scratch directory: {}", e)))?;

        let worker_root = scratch.path().join("worker");
        extract_worker_archive(&config.worker_tar, &worker_root)?;

        let repos_dir = scratch.path().join("repos.d");
        std::fs::create_dir_all(&repos_dir)?;
        let repo_files = Self::collect_repo_files(config, &worker_root, &repos_dir)?;

        let mut repo_args = Self::repo_selection_args(config, &repo_files)?;
        for (index, dir) in [&config.rpm_dir, &config.toolchain_rpms_dir].into_iter().enumerate() {
            if dir.join("repodata").is_dir() {
                let id = format!("local-{}", index);
                repo_args.push(format!("--repofrompath={},{}", id, dir.display()));
                repo_args.push(format!("--enablerepo={}", id));
            }
        }
        if let Some(tls) = &config.tls {
            repo_args.push(format!("--setopt=sslclientcert={}", tls.cert.display()));
            repo_args.push(format!("--setopt=sslclientkey={}", tls.key.display()));
        }

        let local_rpms = index_local_rpms(&[&config.rpm_dir, &config.toolchain_rpms_dir]);
        info!(
            "Cloner ready: {} repo files, {} local pre-built RPMs",
            repo_files.len(),
            local_rpms.len()
        );

        Ok(Self {
            out_dir: config.out_dir.clone(),
            worker_root,
            repos_dir,
            repo_args,
            local_rpms,
            cloned: BTreeMap::new(),
            _scratch: scratch,
        })
    }

    /// Copy the configured repo files, plus the worker's own unless disabled,
    /// into one repos directory
    fn collect_repo_files(config: &ClonerConfig, worker_root: &Path, repos_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut sources: Vec<PathBuf> = config.repo_files.clone();

        let default_dir = worker_root.join("etc/yum.repos.d");
        if !config.disable_default_repos && default_dir.is_dir() {
            for entry in std::fs::read_dir(&default_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "repo") {
                    sources.push(path);
                }
            }
        }

        let mut copied = Vec::new();
        for (index, source) in sources.iter().enumerate() {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "repo".to_string());
            let dest = repos_dir.join(format!("{:02}-{}", index, file_name));
            std::fs::copy(source, &dest).map_err(|e| {
                Error::FetcherSetupError(format!("cannot copy repo file '{}': {}", source.display(), e))
            })?;
            copied.push(dest);
        }

        Ok(copied)
    }

    fn repo_selection_args(config: &ClonerConfig, repo_files: &[PathBuf]) -> Result<Vec<String>> {
        if config.disable_upstream_repos {
            debug!("Upstream repositories disabled, only local RPMs will be used");
            return Ok(vec!["--disablerepo=*".to_string()]);
        }

        let mut args = Vec::new();
        for repo_file in repo_files {
            let repos = parse_repo_file(repo_file).map_err(|e| Error::FetcherSetupError(e.to_string()))?;
            for repo in repos.iter().filter(|r| r.is_preview()) {
                if !config.use_preview_repo {
                    args.push(format!("--disablerepo={}", repo.id));
                } else if !repo.enabled {
                    args.push(format!("--enablerepo={}", repo.id));
                }
            }
        }
        Ok(args)
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "--assumeyes".to_string(),
            format!("--installroot={}", self.worker_root.display()),
            format!("--setopt=reposdir={}", self.repos_dir.display()),
        ];
        args.extend(self.repo_args.iter().cloned());
        args
    }

    fn run_tdnf(&self, args: &[String]) -> Result<Output> {
        let mut all_args = self.base_args();
        all_args.extend(args.iter().cloned());
        debug!("Running tdnf {}", all_args.join(" "));

        Command::new("tdnf")
            .args(&all_args)
            .output()
            .map_err(|e| Error::CommandError(format!("Failed to run tdnf: {}. Is tdnf installed?", e)))
    }

    fn copy_local(&self, package: &str, source: &Path) -> Result<PathBuf> {
        let dest = rpm_package_to_rpm_path(package, &self.out_dir);
        if source != dest {
            std::fs::copy(source, &dest).map_err(|e| {
                Error::FetchError(format!("cannot copy '{}' to '{}': {}", source.display(), dest.display(), e))
            })?;
        }
        Ok(dest)
    }

    fn download(&self, clone_deps: bool, package: &str) -> Result<PathBuf> {
        let mut args = vec![
            "install".to_string(),
            "--downloadonly".to_string(),
            format!("--downloaddir={}", self.out_dir.display()),
        ];
        if clone_deps {
            args.push("--alldeps".to_string());
        }
        args.push(package.to_string());

        let output = self.run_tdnf(&args)?;
        if !output.status.success() {
            return Err(Error::FetchError(format!(
                "tdnf could not download '{}': {}",
                package,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let dest = rpm_package_to_rpm_path(package, &self.out_dir);
        if !dest.is_file() {
            return Err(Error::FetchError(format!(
                "tdnf reported success but '{}' is missing",
                dest.display()
            )));
        }
        Ok(dest)
    }

    /// Record `package` and every RPM that appeared in the output directory
    /// since `before` was taken
    fn record_new_artifacts(&mut self, before: &BTreeSet<String>, package: &str, prebuilt: bool) -> Result<()> {
        let after = scan_rpm_dir(&self.out_dir)?;
        for name in after.difference(before) {
            if name == package {
                continue;
            }
            debug!("'{}' was cloned as a dependency of '{}'", name, package);
            let dependency = ClonedPackage {
                rpm_path: rpm_package_to_rpm_path(name, &self.out_dir),
                prebuilt: self.local_rpms.contains_key(name),
            };
            self.cloned.entry(name.clone()).or_insert(dependency);
        }

        self.cloned.insert(
            package.to_string(),
            ClonedPackage {
                rpm_path: rpm_package_to_rpm_path(package, &self.out_dir),
                prebuilt,
            },
        );
        Ok(())
    }
}

impl ProviderResolver for TdnfCloner {
    fn what_provides(&mut self, pkg: &VersionedPkg) -> Result<Vec<String>> {
        let output = self.run_tdnf(&["provides".to_string(), pkg.to_string()])?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if NO_MATCH_MARKERS
                .iter()
                .any(|marker| stderr.contains(marker) || stdout.contains(marker))
            {
                return Ok(Vec::new());
            }
            return Err(Error::ProviderResolutionError(format!(
                "tdnf provides '{}' failed: {}",
                pkg,
                stderr.trim()
            )));
        }

        let providers = parse_provides_output(&stdout);
        debug!("'{}' is provided by {:?}", pkg, providers);
        Ok(providers)
    }
}

impl ArtifactFetcher for TdnfCloner {
    fn clone_package(&mut self, clone_deps: bool, package: &str) -> Result<bool> {
        let before = scan_rpm_dir(&self.out_dir)?;

        let prebuilt = match self.local_rpms.get(package).cloned() {
            Some(source) => {
                self.copy_local(package, &source)?;
                if clone_deps {
                    // The closure comes from the local repos added with --repofrompath
                    // and whatever upstream repos are enabled
                    self.download(true, package)?;
                }
                true
            }
            None => {
                self.download(clone_deps, package)?;
                false
            }
        };

        self.record_new_artifacts(&before, package, prebuilt)?;
        Ok(prebuilt)
    }

    fn convert_downloaded_packages_into_repo(&mut self) -> Result<()> {
        info!("Converting {} into a local repository", self.out_dir.display());

        let output = Command::new("createrepo_c")
            .arg("--compatibility")
            .arg("--update")
            .arg(&self.out_dir)
            .output()
            .map_err(|e| Error::RepoConversionError(format!("Failed to run createrepo_c: {}", e)))?;

        if !output.status.success() {
            return Err(Error::RepoConversionError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    fn cloned_contents(&self) -> ResolutionSummary {
        let mut summary = ResolutionSummary::new();
        for (name, package) in &self.cloned {
            summary.insert(name.clone(), package.clone());
        }
        summary
    }

    fn restore_cloned_contents(&mut self, summary: &ResolutionSummary) -> Result<()> {
        let mut restored = BTreeMap::new();

        for (name, package) in &summary.packages {
            let rpm_path = rpm_package_to_rpm_path(name, &self.out_dir);
            if !rpm_path.is_file() {
                match self.local_rpms.get(name) {
                    Some(source) => {
                        self.copy_local(name, source)?;
                    }
                    None => {
                        warn!("'{}' is missing from the output directory, downloading it again", name);
                        self.download(false, name)?;
                    }
                }
            }
            restored.insert(
                name.clone(),
                ClonedPackage {
                    rpm_path,
                    prebuilt: package.prebuilt,
                },
            );
        }

        self.cloned = restored;
        Ok(())
    }
}

/// Index `.rpm` files under the given directories by package name; earlier
/// directories win
fn index_local_rpms(dirs: &[&PathBuf]) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for dir in dirs {
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rpm") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                index.entry(stem.to_string()).or_insert_with(|| path.to_path_buf());
            }
        }
    }
    index
}

/// Package names of the `.rpm` files directly inside `dir`
fn scan_rpm_dir(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rpm") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.insert(stem.to_string());
        }
    }
    Ok(names)
}
