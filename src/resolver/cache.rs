// src/resolver/cache.rs

//! Per-run record of cloned packages
//!
//! Many graph nodes resolve to the same concrete package. The cache makes
//! sure each package is cloned at most once per run and remembers whether
//! it came from a pre-built directory. It lives for one run only.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct FetchCache {
    fetched: HashSet<String>,
    prebuilt: HashMap<String, bool>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `package` was already cloned this run
    pub fn is_fetched(&self, package: &str) -> bool {
        self.fetched.contains(package)
    }

    /// Record a successful clone
    pub fn record(&mut self, package: &str, prebuilt: bool) {
        self.fetched.insert(package.to_string());
        self.prebuilt.insert(package.to_string(), prebuilt);
    }

    /// Whether `package` was found locally rather than downloaded
    pub fn is_prebuilt(&self, package: &str) -> bool {
        self.prebuilt.get(package).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.fetched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetched.is_empty()
    }
}
