//! Project facade.
//!
//! [`Project`] owns everything needed to work on one codebase: its root,
//! configuration, import resolver, snapshot store and version control handle.
//! Each operation is a short pipeline over the core modules:
//!
//! | Operation | Pipeline |
//! |-----------|----------|
//! | `update` | scan -> build -> save |
//! | `query` | load -> traverse |
//! | `impact` | changed files from VCS -> load -> analyze |
//! | `diff` | load (working file or past commit) x2 -> compare |
//! | `cycles` | load -> detect |

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::builder::{GraphBuilder, ORPHAN_SOURCES_SHOWN, OrphanedEdges};
use crate::config::ProjectConfig;
use crate::diff::{GraphDiff, compare_graphs};
use crate::error::{Error, Result, ScanError};
use crate::graph::{Cycle, detect_cycles};
use crate::impact::{ImpactReport, analyze_impact};
use crate::query::{QueryResult, query};
use crate::resolver::ImportResolver;
use crate::scan::Scanner;
use crate::store::GraphStore;
use crate::types::{Direction, Graph, ParsedFile};
use crate::vcs::{GitCli, VersionControl};

/// Reference name meaning "the snapshot currently on disk".
pub const WORKING_REF: &str = "working";

/// What an update produced.
#[derive(Debug, Clone)]
pub struct UpdateStats {
    /// Commit the snapshot was built from
    pub commit_hash: String,
    /// Checked-out branch, when version control can tell
    pub branch: Option<String>,
    /// Files parsed successfully
    pub files_parsed: usize,
    /// Nodes in the new snapshot
    pub nodes: usize,
    /// Edges in the new snapshot
    pub edges: usize,
    /// Imports of existing but unparsed files, grouped by target
    pub orphaned: OrphanedEdges,
    /// Imports that resolved to nothing
    pub unresolved_imports: usize,
    /// Files that failed to read or parse
    pub errors: Vec<ScanError>,
    /// Directories that could not be read (path, reason)
    pub directories_skipped: Vec<(PathBuf, String)>,
    /// Wall time of the update
    pub duration: Duration,
}

/// One codebase and its persisted dependency graph.
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    resolver: ImportResolver,
    store: GraphStore,
    vcs: Box<dyn VersionControl>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Open the project rooted at `root`, using git for history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `root` does not exist, or [`Error::Config`] if
    /// `.depgraph/config.yaml` is invalid.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root.canonicalize().map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("project root not found: {}", root.display()),
            ))
        })?;
        let vcs = Box::new(GitCli::new(&root));
        Self::with_vcs(&root, vcs)
    }

    /// Open the project at `root` with a custom version control backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `.depgraph/config.yaml` is invalid.
    pub fn with_vcs(root: &Path, vcs: Box<dyn VersionControl>) -> Result<Self> {
        let config = ProjectConfig::load(root)?;
        let store = GraphStore::new(config.graph_path(root));
        Ok(Self {
            root: root.to_path_buf(),
            config,
            resolver: ImportResolver::default(),
            store,
            vcs,
        })
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Snapshot store.
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Version control backend.
    #[must_use]
    pub fn vcs(&self) -> &dyn VersionControl {
        self.vcs.as_ref()
    }

    /// Scan the sources, rebuild the graph and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the snapshot cannot be written. Unreadable
    /// files and directories are reported in the stats, not as errors.
    pub fn update(&self) -> Result<UpdateStats> {
        let start = Instant::now();
        let outcome = Scanner::new(&self.root, &self.config).scan();
        self.finish_update(&outcome.files, outcome.errors, outcome.directories_skipped, start)
    }

    /// Rebuild the graph from facts produced elsewhere and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the snapshot cannot be written.
    pub fn update_from_facts(&self, parsed: &[ParsedFile]) -> Result<UpdateStats> {
        let start = Instant::now();
        self.finish_update(parsed, Vec::new(), Vec::new(), start)
    }

    fn finish_update(
        &self,
        parsed: &[ParsedFile],
        errors: Vec<ScanError>,
        directories_skipped: Vec<(PathBuf, String)>,
        start: Instant,
    ) -> Result<UpdateStats> {
        let commit_hash = self.vcs.current_commit();
        // Fresh alias configuration on every rebuild.
        self.resolver.cache().clear();
        let output = GraphBuilder::new(&self.resolver).build(parsed, &commit_hash, &self.root);

        if !output.orphaned.is_empty() {
            warn!(
                targets = output.orphaned.target_count(),
                occurrences = output.orphaned.occurrence_count(),
                details = %output.orphaned.summary_lines(ORPHAN_SOURCES_SHOWN).join("; "),
                "Imports of files outside the parsed set were skipped"
            );
        }

        self.store.save(&output.graph)?;

        let stats = UpdateStats {
            commit_hash,
            branch: self.vcs.current_branch().ok(),
            files_parsed: parsed.len(),
            nodes: output.graph.nodes.len(),
            edges: output.graph.edges.len(),
            orphaned: output.orphaned,
            unresolved_imports: output.unresolved_imports,
            errors,
            directories_skipped,
            duration: start.elapsed(),
        };
        info!(
            files = stats.files_parsed,
            nodes = stats.nodes,
            edges = stats.edges,
            duration_ms = stats.duration.as_millis(),
            "Graph updated"
        );
        Ok(stats)
    }

    /// The persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] if there is no valid snapshot on disk.
    pub fn load_graph(&self) -> Result<Graph> {
        self.store.load()
    }

    /// The snapshot as committed at `reference`, or the one on disk when
    /// `reference` is [`WORKING_REF`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] if the snapshot is missing at that commit
    /// or is not valid.
    pub fn load_graph_at(&self, reference: &str) -> Result<Graph> {
        if reference == WORKING_REF {
            return self.load_graph();
        }
        let origin = format!("{reference}:{}", self.config.graph_file);
        if !self.vcs.commit_exists(reference) {
            return Err(Error::graph_load(
                origin,
                Error::Vcs(format!("unknown revision '{reference}'")),
            ));
        }
        let bytes = self
            .vcs
            .file_at(reference, &self.config.graph_file)
            .map_err(|e| Error::graph_load(origin.clone(), e))?;
        GraphStore::from_bytes(&bytes, &origin)
    }

    /// Query the persisted snapshot around `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] without a snapshot, or
    /// [`Error::EntityNotFound`] if the entity is not in it.
    pub fn query(&self, entity_id: &str, direction: Direction, transitive: bool) -> Result<QueryResult> {
        let graph = self.load_graph()?;
        query(&graph, entity_id, direction, transitive)
    }

    /// Impact of the source files changed since `base`, measured on the
    /// persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vcs`] if the changed files cannot be listed, or
    /// [`Error::GraphLoad`] without a snapshot.
    pub fn impact(&self, base: &str) -> Result<ImpactReport> {
        let changed = self.vcs.changed_files(base, None)?;
        let graph = self.load_graph()?;
        info!(base, changed = changed.len(), "Analyzing impact");
        Ok(analyze_impact(&graph, &changed))
    }

    /// Compare the snapshots at two references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] if either snapshot cannot be loaded.
    pub fn diff(&self, from: &str, to: &str) -> Result<GraphDiff> {
        let before = self.load_graph_at(from)?;
        let after = self.load_graph_at(to)?;
        Ok(compare_graphs(&before, &after))
    }

    /// Dependency cycles in the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphLoad`] without a snapshot.
    pub fn cycles(&self) -> Result<Vec<Cycle>> {
        let graph = self.load_graph()?;
        Ok(detect_cycles(&graph))
    }
}
