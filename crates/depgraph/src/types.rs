//! Domain types for the dependency graph.
//!
//! These types represent the core domain model:
//! - **Snapshot**: `Graph`, `Node`, `Edge` (persisted, exchanged between components)
//! - **Input**: `ParsedFile` and its children (produced by a parsing front end)
//! - **Enums**: `NodeType`, `Relationship`, `Direction`
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Entity IDs | `String` keys | The ID *is* the address; see `entity` for the scheme |
//! | `nodes` | `BTreeMap` | Sorted keys give byte-stable snapshots |
//! | Node location | Optional | File nodes locate themselves |
//! | Edge order | Preserved | Traversal visits neighbours in insertion order |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Format version written into every snapshot.
pub const GRAPH_FORMAT_VERSION: &str = "1.0.0";

/// Commit hash used when version control cannot supply one.
pub const UNKNOWN_COMMIT: &str = "unknown";

// ============================================================================
// Enums
// ============================================================================

/// Kind of code entity a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A source file
    File,
    /// A class declaration
    Class,
    /// A method declared inside a class
    Method,
    /// A free function
    Function,
    /// An interface declaration
    Interface,
}

impl NodeType {
    /// Lowercase name as used in snapshots.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Method => "method",
            Self::Function => "function",
            Self::Interface => "interface",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship carried by an edge (source depends on target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// File imports file
    Imports,
    /// Class extends class
    Extends,
    /// Class implements interface
    Implements,
    /// Function or method calls function or method
    Calls,
}

impl Relationship {
    /// Lowercase name as used in snapshots.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imports => "imports",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Calls => "calls",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way edges are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Source to target: what does this entity depend on?
    Forward,
    /// Target to source: what depends on this entity?
    Reverse,
}

impl Direction {
    pub(crate) fn as_petgraph(self) -> petgraph::Direction {
        match self {
            Self::Forward => petgraph::Direction::Outgoing,
            Self::Reverse => petgraph::Direction::Incoming,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Metadata for one entity.
///
/// `file`, `line` and `end_line` are absent only for file nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Entity kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// File that declares the entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// First line (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Last line (1-indexed, inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

impl Node {
    /// Node for a source file.
    #[must_use]
    pub fn file() -> Self {
        Self {
            node_type: NodeType::File,
            file: None,
            line: None,
            end_line: None,
        }
    }

    /// Node for an entity declared in `file` over the given line range.
    #[must_use]
    pub fn declared(node_type: NodeType, file: impl Into<String>, line: u32, end_line: u32) -> Self {
        Self {
            node_type,
            file: Some(file.into()),
            line: Some(line),
            end_line: Some(end_line),
        }
    }

    /// The file this entity lives in.
    ///
    /// File nodes carry no `file` field; their location is their own ID.
    #[must_use]
    pub fn location<'a>(&'a self, entity_id: &'a str) -> &'a str {
        self.file.as_deref().unwrap_or(entity_id)
    }
}

/// Directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Dependent entity
    pub source: String,
    /// Kind of dependency
    pub relationship: Relationship,
    /// Entity depended upon
    pub target: String,
}

impl Edge {
    /// Create an edge.
    #[must_use]
    pub fn new(source: impl Into<String>, relationship: Relationship, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            relationship,
            target: target.into(),
        }
    }
}

/// One immutable graph snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Snapshot format version
    pub version: String,
    /// Commit the snapshot was built from, or `"unknown"`
    pub commit_hash: String,
    /// Generation time (ISO-8601, UTC)
    pub timestamp: String,
    /// Entity ID to node
    pub nodes: BTreeMap<String, Node>,
    /// Edges in creation order
    pub edges: Vec<Edge>,
}

impl Graph {
    /// An empty snapshot with the current format version.
    #[must_use]
    pub fn empty(commit_hash: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            version: GRAPH_FORMAT_VERSION.to_string(),
            commit_hash: commit_hash.into(),
            timestamp: timestamp.into(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Look up a node by entity ID.
    #[must_use]
    pub fn node(&self, entity_id: &str) -> Option<&Node> {
        self.nodes.get(entity_id)
    }

    /// Whether the graph has a node for `entity_id`.
    #[must_use]
    pub fn contains(&self, entity_id: &str) -> bool {
        self.nodes.contains_key(entity_id)
    }

    /// Entities declared in `file`, including the file node itself.
    pub fn entities_in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = (&'a String, &'a Node)> + 'a {
        self.nodes
            .iter()
            .filter(move |(id, node)| id.as_str() == file || node.file.as_deref() == Some(file))
    }
}

// ============================================================================
// Parsed-file facts
// ============================================================================

/// Structural facts extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    /// Path relative to the project root, POSIX separators
    pub file_path: String,
    /// Class declarations
    #[serde(default)]
    pub classes: Vec<ParsedClass>,
    /// Free functions
    #[serde(default)]
    pub functions: Vec<ParsedFunction>,
    /// Interface declarations
    #[serde(default)]
    pub interfaces: Vec<ParsedInterface>,
    /// Import statements
    #[serde(default)]
    pub imports: Vec<ParsedImport>,
}

impl ParsedFile {
    /// Empty facts for `file_path`.
    #[must_use]
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }
}

/// A class and its methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedClass {
    /// Class name
    pub name: String,
    /// First line (1-indexed)
    pub line: u32,
    /// Last line (1-indexed)
    pub end_line: u32,
    /// Methods declared in the class body
    #[serde(default)]
    pub methods: Vec<ParsedFunction>,
    /// Raw text of the `extends` clause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Raw names from the `implements` clause
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
}

/// A function or method body and the calls made from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFunction {
    /// Function or method name
    pub name: String,
    /// First line (1-indexed)
    pub line: u32,
    /// Last line (1-indexed)
    pub end_line: u32,
    /// Raw callee text of every call expression in the body
    #[serde(default)]
    pub calls: Vec<String>,
}

/// An interface declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInterface {
    /// Interface name
    pub name: String,
    /// First line (1-indexed)
    pub line: u32,
    /// Last line (1-indexed)
    pub end_line: u32,
}

/// An import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedImport {
    /// Module specifier as written (`./user`, `@api/users`, `react`)
    pub from: String,
    /// `import type ...` statements
    #[serde(default)]
    pub is_type_only: bool,
}

impl ParsedImport {
    /// A value import.
    #[must_use]
    pub fn value(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            is_type_only: false,
        }
    }

    /// A type-only import.
    #[must_use]
    pub fn type_only(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            is_type_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_serializes_without_location() {
        let json = serde_json::to_value(Node::file()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "type": "file" }));
    }

    #[test]
    fn declared_node_uses_camel_case_fields() {
        let node = Node::declared(NodeType::Method, "src/a.ts", 3, 9);
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "type": "method", "file": "src/a.ts", "line": 3, "endLine": 9 })
        );
    }

    #[test]
    fn snapshot_reads_persisted_format() {
        let raw = r#"{
            "version": "1.0.0",
            "commitHash": "abc1234",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "nodes": {
                "src/a.ts": { "type": "file" },
                "src/a.ts::A": { "type": "class", "file": "src/a.ts", "line": 1, "endLine": 4 }
            },
            "edges": [ { "source": "src/a.ts", "relationship": "imports", "target": "src/b.ts" } ]
        }"#;

        let graph: Graph = serde_json::from_str(raw).expect("valid snapshot");
        assert_eq!(graph.commit_hash, "abc1234");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges[0].relationship, Relationship::Imports);
    }

    #[test]
    fn location_falls_back_to_entity_id_for_files() {
        let file = Node::file();
        let class = Node::declared(NodeType::Class, "src/a.ts", 1, 2);

        assert_eq!(file.location("src/a.ts"), "src/a.ts");
        assert_eq!(class.location("src/a.ts::A"), "src/a.ts");
    }

    #[test]
    fn entities_in_file_includes_file_node() {
        let mut graph = Graph::empty(UNKNOWN_COMMIT, "t");
        graph.nodes.insert("src/a.ts".into(), Node::file());
        graph
            .nodes
            .insert("src/a.ts::run".into(), Node::declared(NodeType::Function, "src/a.ts", 1, 3));
        graph.nodes.insert("src/b.ts".into(), Node::file());

        let ids: Vec<_> = graph.entities_in_file("src/a.ts").map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["src/a.ts", "src/a.ts::run"]);
    }
}
