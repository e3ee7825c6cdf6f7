//! Snapshot comparison.
//!
//! Nodes are compared by entity ID, edges by their `(source, relationship,
//! target)` triple. Results are sorted, so the output never depends on the
//! order nodes or edges appear in either input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::{Edge, Graph, Node};

/// A node field that differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeField {
    /// `line`
    #[serde(rename = "line")]
    Line,
    /// `endLine`
    #[serde(rename = "endLine")]
    EndLine,
    /// `type`
    #[serde(rename = "type")]
    Type,
    /// `file`
    #[serde(rename = "file")]
    File,
}

impl NodeField {
    /// Field name as it appears in snapshots.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::EndLine => "endLine",
            Self::Type => "type",
            Self::File => "file",
        }
    }
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node present in both snapshots with at least one differing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedNode {
    /// The entity
    pub entity_id: String,
    /// Node in the first snapshot
    pub before: Node,
    /// Node in the second snapshot
    pub after: Node,
    /// Fields that differ, never empty
    pub changes: Vec<NodeField>,
}

/// Counters over a [`GraphDiff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Entities only in the second snapshot
    pub nodes_added: usize,
    /// Entities only in the first snapshot
    pub nodes_removed: usize,
    /// Entities in both with differing metadata
    pub nodes_modified: usize,
    /// Edges only in the second snapshot
    pub edges_added: usize,
    /// Edges only in the first snapshot
    pub edges_removed: usize,
}

impl DiffSummary {
    /// Whether every counter is zero.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        *self == Self::default()
    }
}

/// Differences between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDiff {
    /// Commit of the first snapshot
    pub from_commit: String,
    /// Commit of the second snapshot
    pub to_commit: String,
    /// Entity IDs added, sorted
    pub added_nodes: Vec<String>,
    /// Entity IDs removed, sorted
    pub removed_nodes: Vec<String>,
    /// Nodes whose metadata changed, sorted by entity ID
    pub modified_nodes: Vec<ModifiedNode>,
    /// Edges added, sorted
    pub added_edges: Vec<Edge>,
    /// Edges removed, sorted
    pub removed_edges: Vec<Edge>,
    /// Counters
    pub summary: DiffSummary,
}

impl GraphDiff {
    /// Whether the two snapshots had the same nodes and edges.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.summary.is_identical()
    }
}

/// Compare `before` against `after`.
#[must_use]
pub fn compare_graphs(before: &Graph, after: &Graph) -> GraphDiff {
    let added_nodes: Vec<String> = after
        .nodes
        .keys()
        .filter(|id| !before.nodes.contains_key(*id))
        .cloned()
        .collect();
    let removed_nodes: Vec<String> = before
        .nodes
        .keys()
        .filter(|id| !after.nodes.contains_key(*id))
        .cloned()
        .collect();

    let modified_nodes: Vec<ModifiedNode> = before
        .nodes
        .iter()
        .filter_map(|(id, old)| {
            let new = after.nodes.get(id)?;
            let changes = changed_fields(old, new);
            (!changes.is_empty()).then(|| ModifiedNode {
                entity_id: id.clone(),
                before: old.clone(),
                after: new.clone(),
                changes,
            })
        })
        .collect();

    let old_edges: BTreeSet<&Edge> = before.edges.iter().collect();
    let new_edges: BTreeSet<&Edge> = after.edges.iter().collect();
    let added_edges: Vec<Edge> = new_edges.difference(&old_edges).map(|e| (*e).clone()).collect();
    let removed_edges: Vec<Edge> = old_edges.difference(&new_edges).map(|e| (*e).clone()).collect();

    let summary = DiffSummary {
        nodes_added: added_nodes.len(),
        nodes_removed: removed_nodes.len(),
        nodes_modified: modified_nodes.len(),
        edges_added: added_edges.len(),
        edges_removed: removed_edges.len(),
    };

    GraphDiff {
        from_commit: before.commit_hash.clone(),
        to_commit: after.commit_hash.clone(),
        added_nodes,
        removed_nodes,
        modified_nodes,
        added_edges,
        removed_edges,
        summary,
    }
}

/// Whether two snapshots have the same nodes and edges.
///
/// Commit hash and timestamp are not compared.
#[must_use]
pub fn are_graphs_identical(a: &Graph, b: &Graph) -> bool {
    compare_graphs(a, b).is_identical()
}

fn changed_fields(old: &Node, new: &Node) -> Vec<NodeField> {
    let mut changes = Vec::new();
    if old.line != new.line {
        changes.push(NodeField::Line);
    }
    if old.end_line != new.end_line {
        changes.push(NodeField::EndLine);
    }
    if old.node_type != new.node_type {
        changes.push(NodeField::Type);
    }
    if old.file != new.file {
        changes.push(NodeField::File);
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeType, Relationship};

    fn base() -> Graph {
        let mut graph = Graph::empty("aaa1111", "2024-01-01T00:00:00.000Z");
        graph.nodes.insert("src/a.ts".into(), Node::file());
        graph.nodes.insert("src/b.ts".into(), Node::file());
        graph.nodes.insert(
            "src/a.ts::run".into(),
            Node::declared(NodeType::Function, "src/a.ts", 3, 9),
        );
        graph.edges = vec![
            Edge::new("src/a.ts", Relationship::Imports, "src/b.ts"),
            Edge::new("src/a.ts::run", Relationship::Calls, "src/a.ts::run"),
        ];
        graph
    }

    #[test]
    fn identical_graphs_have_zero_summary() {
        let graph = base();
        let diff = compare_graphs(&graph, &graph);

        assert_eq!(diff.summary, DiffSummary::default());
        assert!(are_graphs_identical(&graph, &graph));
    }

    #[test]
    fn commit_and_timestamp_do_not_matter() {
        let a = base();
        let mut b = base();
        b.commit_hash = "bbb2222".into();
        b.timestamp = "2025-01-01T00:00:00.000Z".into();

        let diff = compare_graphs(&a, &b);
        assert!(diff.is_identical());
        assert_eq!(diff.from_commit, "aaa1111");
        assert_eq!(diff.to_commit, "bbb2222");
    }

    #[test]
    fn reports_added_removed_and_modified() {
        let a = base();
        let mut b = base();
        b.nodes.remove("src/b.ts");
        b.nodes.insert("src/c.ts".into(), Node::file());
        b.nodes.insert(
            "src/a.ts::run".into(),
            Node::declared(NodeType::Function, "src/a.ts", 4, 12),
        );
        b.edges = vec![Edge::new("src/a.ts", Relationship::Imports, "src/c.ts")];

        let diff = compare_graphs(&a, &b);

        assert_eq!(diff.added_nodes, vec!["src/c.ts"]);
        assert_eq!(diff.removed_nodes, vec!["src/b.ts"]);
        assert_eq!(diff.modified_nodes.len(), 1);
        assert_eq!(diff.modified_nodes[0].changes, vec![NodeField::Line, NodeField::EndLine]);
        assert_eq!(diff.added_edges.len(), 1);
        assert_eq!(diff.removed_edges.len(), 2);
        assert_eq!(
            diff.summary,
            DiffSummary {
                nodes_added: 1,
                nodes_removed: 1,
                nodes_modified: 1,
                edges_added: 1,
                edges_removed: 2,
            }
        );
    }

    #[test]
    fn type_change_is_a_modification() {
        let a = base();
        let mut b = base();
        b.nodes.insert(
            "src/a.ts::run".into(),
            Node::declared(NodeType::Method, "src/a.ts", 3, 9),
        );

        let diff = compare_graphs(&a, &b);
        assert_eq!(diff.modified_nodes[0].changes, vec![NodeField::Type]);
    }

    #[test]
    fn edge_order_does_not_matter() {
        let a = base();
        let mut b = base();
        b.edges.reverse();
        b.edges.push(b.edges[0].clone());

        assert!(are_graphs_identical(&a, &b));
    }

    #[test]
    fn diff_is_symmetric() {
        let a = base();
        let mut b = base();
        b.nodes.insert("src/z.ts".into(), Node::file());
        b.edges.push(Edge::new("src/z.ts", Relationship::Imports, "src/a.ts"));

        let forward = compare_graphs(&a, &b);
        let backward = compare_graphs(&b, &a);

        assert_eq!(forward.added_nodes, backward.removed_nodes);
        assert_eq!(forward.added_edges, backward.removed_edges);
    }

    #[test]
    fn modified_fields_serialize_with_snapshot_names() {
        let a = base();
        let mut b = base();
        b.nodes.insert(
            "src/a.ts::run".into(),
            Node::declared(NodeType::Function, "src/a.ts", 3, 10),
        );

        let json = serde_json::to_value(compare_graphs(&a, &b)).expect("serialize");
        assert_eq!(json["modifiedNodes"][0]["changes"][0], "endLine");
        assert_eq!(json["summary"]["nodesModified"], 1);
    }
}
