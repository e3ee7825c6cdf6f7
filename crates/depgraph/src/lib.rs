//! # Depgraph: entity-level dependency graphs for TypeScript codebases
//!
//! Depgraph parses TypeScript sources with tree-sitter, builds a directed graph
//! of files, classes, methods, functions and interfaces, and persists it as a
//! JSON snapshot. Snapshots can be queried, compared across commits, and used
//! to score the risk of a change.
//!
//! ## Design Philosophy
//!
//! - **Snapshots are immutable** - every operation reads a `Graph` and returns a new value
//! - **Best-effort resolution** - unresolved imports and calls are normal, never errors
//! - **Library first, CLI second** - the binary is a thin layer over [`Project`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use depgraph::{Direction, Project};
//! use std::path::Path;
//!
//! let project = Project::open(Path::new("/path/to/project"))?;
//!
//! // Scan, build and persist the graph
//! let stats = project.update()?;
//! println!("{} nodes, {} edges", stats.nodes, stats.edges);
//!
//! // Who depends on this file?
//! let result = project.query("src/services/user.ts", Direction::Reverse, true)?;
//! println!("{} dependents across {} files", result.total_count, result.file_count);
//!
//! // How risky are the uncommitted changes?
//! let report = project.impact("HEAD")?;
//! println!("risk: {} (score {})", report.risk_level, report.risk_score);
//! # Ok::<(), depgraph::Error>(())
//! ```
//!
//! The core operations also work on in-memory snapshots without a project:
//!
//! ```
//! use depgraph::{Direction, Edge, Graph, Node, Relationship, traverse};
//!
//! let mut graph = Graph::empty("abc1234", "2024-01-01T00:00:00.000Z");
//! graph.nodes.insert("src/a.ts".into(), Node::file());
//! graph.nodes.insert("src/b.ts".into(), Node::file());
//! graph.edges.push(Edge::new("src/a.ts", Relationship::Imports, "src/b.ts"));
//!
//! let deps = traverse(&graph, "src/a.ts", Direction::Forward, true)?;
//! assert_eq!(deps[0].entity_id, "src/b.ts");
//! # Ok::<(), depgraph::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod diff;
pub mod entity;
mod error;
pub mod graph;
pub mod impact;
pub mod languages;
pub mod project;
pub mod query;
pub mod resolver;
pub mod scan;
pub mod store;
pub mod tsconfig;
mod types;
pub mod vcs;

pub use builder::{BuildOutput, GraphBuilder, OrphanedEdges, ResolutionStrategy, SameFileStrategy, build_graph};
pub use config::ProjectConfig;
pub use diff::{DiffSummary, GraphDiff, ModifiedNode, NodeField, are_graphs_identical, compare_graphs};
pub use entity::{EntityRef, parse_entity_id};
pub use error::{Error, Result, ScanError, ScanErrorKind};
pub use graph::{Cycle, Traversal, TraversalOrder, TraversalResult, detect_cycles, traverse};
pub use impact::{AffectedEntity, ImpactMetrics, ImpactReport, RiskLevel, analyze_impact, filter_by_threshold};
pub use project::{Project, UpdateStats, WORKING_REF};
pub use query::{DependencyInfo, GraphQuery, QueryResult, get_dependencies, get_dependents, query};
pub use resolver::{AliasConfig, AliasConfigCache, FileOracle, FsOracle, ImportResolver};
pub use store::GraphStore;
pub use types::{
    Direction, Edge, GRAPH_FORMAT_VERSION, Graph, Node, NodeType, ParsedClass, ParsedFile, ParsedFunction,
    ParsedImport, ParsedInterface, Relationship, UNKNOWN_COMMIT,
};
pub use vcs::{GitCli, VersionControl};
