//! Result types for graph traversal.

use serde::{Deserialize, Serialize};

/// Order in which a traversal explores the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraversalOrder {
    /// FIFO queue; depths are shortest-path distances
    #[default]
    BreadthFirst,
    /// LIFO stack; same reachable set, order-dependent depths
    DepthFirst,
}

/// One entity reached by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResult {
    /// The entity reached
    pub entity_id: String,
    /// Hops from the start entity (always at least 1)
    pub depth: usize,
    /// Entities from the start to this one, inclusive
    pub path: Vec<String>,
}

/// A dependency cycle, listed in traversal order.
///
/// The last entity has an edge back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Entities in the cycle
    pub entities: Vec<String>,
}

impl Cycle {
    /// Number of entities in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the cycle is empty (never produced by detection).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether this is a single entity depending on itself.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.entities.len() == 1
    }
}
