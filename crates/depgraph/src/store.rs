//! Snapshot persistence.
//!
//! Snapshots are written as pretty-printed JSON. Writes go to a temporary
//! sibling file that is then renamed over the target, so a crash mid-write
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Graph;

/// Reads and writes the snapshot file of one project.
#[derive(Debug, Clone)]
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist `graph`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, graph: &Graph) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut json = serde_json::to_string_pretty(graph)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        json.push('\n');

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Saved graph"
        );
        Ok(())
    }

    /// Load the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] if the file is missing, unreadable, or not
    /// a valid snapshot.
    pub fn load(&self) -> Result<Graph> {
        let origin = self.path.display().to_string();
        let bytes = std::fs::read(&self.path).map_err(|e| Error::graph_load(origin.clone(), e))?;
        Self::from_bytes(&bytes, &origin)
    }

    /// Decode snapshot bytes obtained elsewhere, such as from a past commit.
    ///
    /// `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] if the bytes are not a valid snapshot.
    pub fn from_bytes(bytes: &[u8], origin: &str) -> Result<Graph> {
        serde_json::from_slice(bytes).map_err(|e| Error::graph_load(origin, e))
    }
}
