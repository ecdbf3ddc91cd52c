// src/fetcher/repo_file.rs

//! Minimal parser for yum/tdnf `.repo` files
//!
//! Only the fields needed to decide which repositories to enable are read.

use crate::error::{Error, Result};
use std::path::Path;

/// One `[section]` of a repo file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDefinition {
    pub id: String,
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub enabled: bool,
}

impl RepoDefinition {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            base_url: None,
            enabled: true,
        }
    }

    /// Preview repositories carry unreleased packages and are opt-in
    pub fn is_preview(&self) -> bool {
        self.id.to_lowercase().contains("preview")
    }
}

/// Parse repo file text
pub fn parse_repo_text(content: &str) -> Result<Vec<RepoDefinition>> {
    let mut repos: Vec<RepoDefinition> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[') {
            let id = section
                .strip_suffix(']')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| Error::ParseError(format!("line {}: bad section header '{}'", index + 1, line)))?;
            repos.push(RepoDefinition::new(id));
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| Error::ParseError(format!("line {}: expected key=value", index + 1)))?;
        let repo = repos
            .last_mut()
            .ok_or_else(|| Error::ParseError(format!("line {}: key outside of a section", index + 1)))?;

        let value = value.trim();
        match key.trim() {
            "name" => repo.name = Some(value.to_string()),
            "baseurl" => repo.base_url = Some(value.to_string()),
            "enabled" => repo.enabled = matches!(value, "1" | "true" | "yes"),
            _ => {}
        }
    }

    Ok(repos)
}

/// Parse a repo file from disk
pub fn parse_repo_file(path: &Path) -> Result<Vec<RepoDefinition>> {
    let content = std::fs::read_to_string(path)?;
    parse_repo_text(&content).map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))
}
