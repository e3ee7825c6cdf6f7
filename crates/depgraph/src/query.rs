//! Dependency and dependent queries.
//!
//! Thin wrappers over [`Traversal`] that attach the addressed node and, where a
//! direct edge links the queried entity and a result, that edge's relationship.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::graph::Traversal;
use crate::types::{Direction, Graph, Node, Relationship};

/// One related entity with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    /// The related entity
    pub entity_id: String,
    /// Its node
    pub node: Node,
    /// Relationship of the direct edge, if one links the two entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    /// Hops from the queried entity
    pub depth: usize,
    /// Entities from the queried one to this one, inclusive
    pub path: Vec<String>,
}

/// Result bundle of [`query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// The queried entity
    pub entity_id: String,
    /// Its node
    pub node: Node,
    /// Forward (dependencies) or reverse (dependents)
    pub direction: Direction,
    /// Whether indirect relations were followed
    pub transitive: bool,
    /// Related entities in traversal order
    pub results: Vec<DependencyInfo>,
    /// Number of related entities
    pub total_count: usize,
    /// Number of distinct files the related entities live in
    pub file_count: usize,
}

/// Query engine bound to one indexed snapshot.
#[derive(Debug)]
pub struct GraphQuery<'g> {
    traversal: Traversal<'g>,
    direct_edges: HashMap<(&'g str, &'g str), Relationship>,
}

impl<'g> GraphQuery<'g> {
    /// Index `graph` for querying.
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        let mut direct_edges = HashMap::new();
        for edge in &graph.edges {
            // First edge between a pair defines the label.
            direct_edges
                .entry((edge.source.as_str(), edge.target.as_str()))
                .or_insert(edge.relationship);
        }

        Self {
            traversal: Traversal::new(graph),
            direct_edges,
        }
    }

    /// What `entity_id` depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if the entity has no node.
    pub fn dependencies(&self, entity_id: &str, transitive: bool) -> Result<Vec<DependencyInfo>> {
        self.related(entity_id, Direction::Forward, transitive)
    }

    /// What depends on `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if the entity has no node.
    pub fn dependents(&self, entity_id: &str, transitive: bool) -> Result<Vec<DependencyInfo>> {
        self.related(entity_id, Direction::Reverse, transitive)
    }

    /// Related entities plus totals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if the entity has no node.
    pub fn query(&self, entity_id: &str, direction: Direction, transitive: bool) -> Result<QueryResult> {
        let node = self
            .traversal
            .graph()
            .node(entity_id)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;
        let results = self.related(entity_id, direction, transitive)?;

        let file_count = results
            .iter()
            .map(|r| r.node.location(&r.entity_id))
            .collect::<HashSet<_>>()
            .len();

        Ok(QueryResult {
            entity_id: entity_id.to_string(),
            node,
            direction,
            transitive,
            total_count: results.len(),
            file_count,
            results,
        })
    }

    fn related(&self, entity_id: &str, direction: Direction, transitive: bool) -> Result<Vec<DependencyInfo>> {
        let graph = self.traversal.graph();
        let walked = self.traversal.traverse(entity_id, direction, transitive)?;

        Ok(walked
            .into_iter()
            .filter_map(|result| {
                let node = graph.node(&result.entity_id)?.clone();
                let key = match direction {
                    Direction::Forward => (entity_id, result.entity_id.as_str()),
                    Direction::Reverse => (result.entity_id.as_str(), entity_id),
                };
                let relationship = self.direct_edges.get(&key).copied();
                Some(DependencyInfo {
                    entity_id: result.entity_id,
                    node,
                    relationship,
                    depth: result.depth,
                    path: result.path,
                })
            })
            .collect())
    }
}

/// Dependencies of `entity_id` in `graph`.
///
/// # Errors
///
/// Returns [`Error::EntityNotFound`] if the entity has no node.
pub fn get_dependencies(graph: &Graph, entity_id: &str, transitive: bool) -> Result<Vec<DependencyInfo>> {
    GraphQuery::new(graph).dependencies(entity_id, transitive)
}

/// Dependents of `entity_id` in `graph`.
///
/// # Errors
///
/// Returns [`Error::EntityNotFound`] if the entity has no node.
pub fn get_dependents(graph: &Graph, entity_id: &str, transitive: bool) -> Result<Vec<DependencyInfo>> {
    GraphQuery::new(graph).dependents(entity_id, transitive)
}

/// Query `graph` around `entity_id`.
///
/// # Errors
///
/// Returns [`Error::EntityNotFound`] if the entity has no node.
pub fn query(graph: &Graph, entity_id: &str, direction: Direction, transitive: bool) -> Result<QueryResult> {
    GraphQuery::new(graph).query(entity_id, direction, transitive)
}
