//! Project configuration.
//!
//! Read from `.depgraph/config.yaml` beneath the project root. Every key is
//! optional; a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the per-project state directory
pub const DEPGRAPH_DIR_NAME: &str = ".depgraph";

/// Name of the configuration file inside [`DEPGRAPH_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default snapshot location, relative to the project root
pub const DEFAULT_GRAPH_FILE: &str = ".depgraph/graph.json";

/// Directories skipped by default while scanning
pub const DEFAULT_EXCLUDE_DIRS: [&str; 4] = ["node_modules", "dist", "build", "coverage"];

/// Settings for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProjectConfig {
    /// Directories to scan, relative to the project root
    pub source_roots: Vec<String>,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Where the snapshot is persisted, relative to the project root
    pub graph_file: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_roots: vec![".".to_string()],
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|d| (*d).to_string()).collect(),
            graph_file: DEFAULT_GRAPH_FILE.to_string(),
        }
    }
}

impl ProjectConfig {
    /// Path of the configuration file for `root`.
    #[must_use]
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(DEPGRAPH_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Load the configuration for `root`, falling back to defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but is not valid YAML for
    /// this structure, or [`Error::Io`] if it cannot be read.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_for(root);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_yaml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid YAML.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(format!("{CONFIG_FILE_NAME}: {e}")))
    }

    /// Absolute snapshot path for `root`.
    #[must_use]
    pub fn graph_path(&self, root: &Path) -> PathBuf {
        root.join(&self.graph_file)
    }

    /// Whether a directory with this name is skipped while scanning.
    ///
    /// Hidden directories are always skipped.
    #[must_use]
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        dir_name.starts_with('.') || self.exclude_dirs.iter().any(|d| d == dir_name)
    }
}
