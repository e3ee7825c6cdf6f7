//! Graph traversal over a built snapshot.
//!
//! [`Traversal`] indexes a [`Graph`] into a petgraph `DiGraph` once and then
//! answers any number of walks against it:
//!
//! | Operation | Algorithm |
//! |-----------|-----------|
//! | Dependencies / dependents | BFS (shortest-path depths) or DFS |
//! | Direct neighbours only | BFS that never expands past depth 1 |
//! | Cycle detection | DFS with a recursion stack, every node as a root |
//!
//! ## Edge Direction Reminder
//!
//! Edges point from **dependent -> dependency**. `Forward` follows outgoing
//! edges (what X depends on); `Reverse` follows incoming edges (what depends
//! on X).
//!
//! Every walk owns its visited set, so concurrent walks over one shared
//! snapshot need no locking. Walks terminate because each entity is visited at
//! most once.

mod types;

pub use types::{Cycle, TraversalOrder, TraversalResult};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{Direction, Graph, Relationship};

/// A snapshot indexed for traversal.
#[derive(Debug)]
pub struct Traversal<'g> {
    graph: &'g Graph,
    index: DiGraph<&'g str, Relationship>,
    node_map: HashMap<&'g str, NodeIndex>,
}

impl<'g> Traversal<'g> {
    /// Index `graph`. Edges whose endpoints have no node are ignored.
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        let mut index = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
        let mut node_map = HashMap::with_capacity(graph.nodes.len());

        for id in graph.nodes.keys() {
            node_map.insert(id.as_str(), index.add_node(id.as_str()));
        }
        for edge in &graph.edges {
            match (node_map.get(edge.source.as_str()), node_map.get(edge.target.as_str())) {
                (Some(&from), Some(&to)) => {
                    index.add_edge(from, to, edge.relationship);
                }
                _ => trace!(source = %edge.source, target = %edge.target, "Skipping dangling edge"),
            }
        }

        Self {
            graph,
            index,
            node_map,
        }
    }

    /// The indexed snapshot.
    #[must_use]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Walk from `start`, breadth-first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if `start` has no node.
    pub fn traverse(&self, start: &str, direction: Direction, transitive: bool) -> Result<Vec<TraversalResult>> {
        self.traverse_with(start, direction, transitive, TraversalOrder::BreadthFirst)
    }

    /// Walk from `start` in the given order.
    ///
    /// The start entity itself is never part of the result. With `transitive`
    /// false only direct neighbours (depth 1) are returned. Each entity appears
    /// at most once; the first arrival fixes its depth and path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] if `start` has no node.
    pub fn traverse_with(
        &self,
        start: &str,
        direction: Direction,
        transitive: bool,
        order: TraversalOrder,
    ) -> Result<Vec<TraversalResult>> {
        let start_node = self
            .node_map
            .get(start)
            .copied()
            .ok_or_else(|| Error::EntityNotFound(start.to_string()))?;

        Ok(match order {
            TraversalOrder::BreadthFirst => self.bfs(start_node, direction, transitive),
            TraversalOrder::DepthFirst => self.dfs(start_node, direction, transitive),
        })
    }

    fn bfs(&self, start: NodeIndex, direction: Direction, transitive: bool) -> Vec<TraversalResult> {
        let mut results = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, usize, Vec<NodeIndex>)> = VecDeque::new();
        queue.push_back((start, 0, vec![start]));

        while let Some((current, depth, path)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if depth > 0 {
                results.push(self.result(depth, &path));
                if !transitive {
                    continue;
                }
            }

            for next in self.neighbors(current, direction) {
                if !visited.contains(&next) {
                    let mut next_path = path.clone();
                    next_path.push(next);
                    queue.push_back((next, depth + 1, next_path));
                }
            }
        }

        results
    }

    fn dfs(&self, start: NodeIndex, direction: Direction, transitive: bool) -> Vec<TraversalResult> {
        let mut results = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(start, 0, vec![start])];

        while let Some((current, depth, path)) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if depth > 0 {
                results.push(self.result(depth, &path));
                if !transitive {
                    continue;
                }
            }

            // Reversed so the first neighbour is explored first.
            for next in self.neighbors(current, direction).into_iter().rev() {
                if !visited.contains(&next) {
                    let mut next_path = path.clone();
                    next_path.push(next);
                    stack.push((next, depth + 1, next_path));
                }
            }
        }

        results
    }

    /// Find every cycle reachable by following edges forward.
    ///
    /// Nodes are tried as roots in entity-ID order so disconnected cyclic
    /// components are all found. Whenever an edge reaches a node that is still
    /// on the recursion stack, the stack suffix from that node is one cycle.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();

        for root in self.index.node_indices() {
            if visited.contains(&root) {
                continue;
            }

            let mut on_stack: HashSet<NodeIndex> = HashSet::new();
            let mut path: Vec<NodeIndex> = Vec::new();
            // (node, its forward neighbours, next neighbour to look at)
            let mut frames: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

            visited.insert(root);
            on_stack.insert(root);
            path.push(root);
            frames.push((root, self.neighbors(root, Direction::Forward), 0));

            while let Some((node, neighbors, cursor)) = frames.last_mut() {
                let Some(&next) = neighbors.get(*cursor) else {
                    on_stack.remove(&*node);
                    path.pop();
                    frames.pop();
                    continue;
                };
                *cursor += 1;

                if on_stack.contains(&next) {
                    if let Some(pos) = path.iter().position(|n| *n == next) {
                        cycles.push(Cycle {
                            entities: path[pos..].iter().map(|n| self.index[*n].to_string()).collect(),
                        });
                    }
                } else if visited.insert(next) {
                    on_stack.insert(next);
                    path.push(next);
                    frames.push((next, self.neighbors(next, Direction::Forward), 0));
                }
            }
        }

        cycles
    }

    /// Neighbours of `node`, in edge insertion order.
    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let pg_direction = direction.as_petgraph();
        // petgraph yields a node's edges newest first.
        let mut neighbors: Vec<NodeIndex> = self
            .index
            .edges_directed(node, pg_direction)
            .map(|edge| match direction {
                Direction::Forward => edge.target(),
                Direction::Reverse => edge.source(),
            })
            .collect();
        neighbors.reverse();
        neighbors
    }

    fn result(&self, depth: usize, path: &[NodeIndex]) -> TraversalResult {
        let ids: Vec<String> = path.iter().map(|n| self.index[*n].to_string()).collect();
        TraversalResult {
            entity_id: ids.last().cloned().unwrap_or_default(),
            depth,
            path: ids,
        }
    }
}

/// Breadth-first walk from `start` over `graph`.
///
/// Indexes the graph on every call; reuse a [`Traversal`] for repeated walks.
///
/// # Errors
///
/// Returns [`Error::EntityNotFound`] if `start` has no node.
pub fn traverse(graph: &Graph, start: &str, direction: Direction, transitive: bool) -> Result<Vec<TraversalResult>> {
    Traversal::new(graph).traverse(start, direction, transitive)
}

/// All forward dependency cycles in `graph`.
#[must_use]
pub fn detect_cycles(graph: &Graph) -> Vec<Cycle> {
    Traversal::new(graph).detect_cycles()
}
