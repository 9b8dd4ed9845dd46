use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding project state, created by `rbk init`.
pub const PROJECT_DIR: &str = ".runbook";
/// Config file name inside [`PROJECT_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Store file name inside [`PROJECT_DIR`].
pub const STORE_FILE: &str = "runbook.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub allocator: AllocatorConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            allocator: AllocatorConfig::default(),
            workflow: WorkflowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Attempts at the atomic counter update before surfacing a conflict.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Require a comment when a reviewer returns a document to draft.
    #[serde(default)]
    pub require_reject_comment: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_reject_comment: false,
        }
    }
}

const fn default_retry_budget() -> u32 {
    8
}

/// Path of the config file under `root`.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR).join(CONFIG_FILE)
}

/// Path of the SQLite store under `root`.
#[must_use]
pub fn store_path(root: &Path) -> PathBuf {
    root.join(PROJECT_DIR).join(STORE_FILE)
}

/// Load the project config, falling back to defaults when the file does
/// not exist.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load(root: &Path) -> Result<ProjectConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

/// Write the default config under `root`, creating the project directory.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn write_default(root: &Path) -> Result<PathBuf> {
    let path = config_path(root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create project directory {}", parent.display()))?;
    }
    let rendered =
        toml::to_string_pretty(&ProjectConfig::default()).context("render default config")?;
    std::fs::write(&path, rendered)
        .with_context(|| format!("write config {}", path.display()))?;
    Ok(path)
}

/// Walk upward from `start` looking for a directory containing
/// [`PROJECT_DIR`]. Returns `None` when no initialized project is found.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        if current.join(PROJECT_DIR).is_dir() {
            return Some(current.to_path_buf());
        }
        dir = current.parent();
    }
    None
}
