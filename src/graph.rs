//! Generic directed graph with arena-allocated nodes.
//!
//! Nodes live in a single growable vector and are addressed through
//! [`NodeHandle`] indices, so handles stay valid for the whole lifetime of
//! one build generation. There is no removal API: the owner clears the graph
//! and rebuilds it instead.
//!
//! ## Traversals
//!
//! - [`RoutingGraph::shortest_path`]: single best path by accumulated weight
//!   (Dijkstra, ties broken by handle order).
//! - [`RoutingGraph::all_paths`]: exhaustive depth-first enumeration of
//!   simple paths, steered by a [`PathVisitor`].

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::types::ConnectionFormat;

/// Stable reference to a node within one graph generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(usize);

impl NodeHandle {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Directed edge stored in the adjacency list of its origin node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Destination node.
    pub target: NodeHandle,
    /// Format placeholder, resolved later by negotiation.
    pub format: ConnectionFormat,
    /// Traversal cost.
    pub weight: u16,
}

/// Traversal hooks for [`RoutingGraph::all_paths`].
///
/// For each node entered the call order is `should_visit`, `will_visit`,
/// then either `did_find_path` (destination) or the recursion into its
/// children, then `did_visit`. Visitors that keep a stack of per-node
/// state push in `will_visit` and pop in `did_visit`.
pub trait PathVisitor<N> {
    /// Whether `node` may be appended to the current path.
    fn should_visit(&mut self, _handle: NodeHandle, _node: &N) -> bool {
        true
    }

    /// `node` is about to be appended to the current path.
    fn will_visit(&mut self, _handle: NodeHandle, _node: &N) {}

    /// `node` was removed from the current path.
    fn did_visit(&mut self, _handle: NodeHandle, _node: &N) {}

    /// The current path reached the destination. `path` includes both ends.
    fn did_find_path(&mut self, path: &[NodeHandle]);
}

/// Directed weighted graph owning its node payloads.
#[derive(Debug, Clone)]
pub struct RoutingGraph<N> {
    nodes: Vec<N>,
    adjacency: Vec<Vec<GraphEdge>>,
}

impl<N> Default for RoutingGraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            adjacency: Vec::new(),
        }
    }
}

impl<N> RoutingGraph<N> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its handle.
    pub fn add_node(&mut self, data: N) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(data);
        self.adjacency.push(Vec::new());
        handle
    }

    /// Add the edge `from → to` unless it already exists.
    ///
    /// Returns `true` if a new edge was inserted.
    pub fn connect_nodes(
        &mut self,
        from: NodeHandle,
        to: NodeHandle,
        format: ConnectionFormat,
        weight: u16,
    ) -> bool {
        if to.0 >= self.nodes.len() {
            return false;
        }
        let Some(edges) = self.adjacency.get_mut(from.0) else {
            return false;
        };
        if edges.iter().any(|e| e.target == to) {
            return false;
        }
        edges.push(GraphEdge {
            target: to,
            format,
            weight,
        });
        true
    }

    /// Drop all nodes and edges. Previously issued handles become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjacency.clear();
    }

    /// Node payload.
    pub fn node(&self, handle: NodeHandle) -> Option<&N> {
        self.nodes.get(handle.0)
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn edges(&self, handle: NodeHandle) -> &[GraphEdge] {
        self.adjacency.get(handle.0).map_or(&[], Vec::as_slice)
    }

    /// Whether the edge `from → to` exists.
    pub fn has_edge(&self, from: NodeHandle, to: NodeHandle) -> bool {
        self.edges(from).iter().any(|e| e.target == to)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cheapest path from `from` to `to`, both ends included.
    ///
    /// Returns `None` when `to` is unreachable or either handle is invalid.
    pub fn shortest_path(&self, from: NodeHandle, to: NodeHandle) -> Option<Vec<NodeHandle>> {
        let n = self.nodes.len();
        if from.0 >= n || to.0 >= n {
            return None;
        }

        let mut distance = vec![u32::MAX; n];
        let mut previous: Vec<Option<NodeHandle>> = vec![None; n];
        let mut queue = BinaryHeap::new();

        distance[from.0] = 0;
        queue.push(Reverse((0u32, from)));

        while let Some(Reverse((dist, current))) = queue.pop() {
            if current == to {
                break;
            }
            if dist > distance[current.0] {
                continue;
            }
            for edge in &self.adjacency[current.0] {
                let through = dist.saturating_add(u32::from(edge.weight));
                if through < distance[edge.target.0] {
                    distance[edge.target.0] = through;
                    previous[edge.target.0] = Some(current);
                    queue.push(Reverse((through, edge.target)));
                }
            }
        }

        if distance[to.0] == u32::MAX {
            return None;
        }

        let mut path = vec![to];
        let mut cursor = to;
        while let Some(prev) = previous[cursor.0] {
            path.push(prev);
            cursor = prev;
        }
        path.reverse();
        Some(path)
    }

    /// Enumerate every simple path from `from` to `to`.
    ///
    /// A node appears at most once per path. The destination is checked
    /// first among a node's neighbours; once it has been reported the
    /// remaining neighbours are explored depth-first in edge order.
    pub fn all_paths<V: PathVisitor<N>>(&self, from: NodeHandle, to: NodeHandle, visitor: &mut V) {
        let n = self.nodes.len();
        if from.0 >= n || to.0 >= n || from == to {
            return;
        }
        let mut walk = Walk {
            graph: self,
            destination: to,
            on_path: vec![false; n],
            path: vec![from],
        };
        walk.on_path[from.0] = true;
        walk.descend(visitor);
    }
}

/// Mutable state of one `all_paths` enumeration.
struct Walk<'g, N> {
    graph: &'g RoutingGraph<N>,
    destination: NodeHandle,
    on_path: Vec<bool>,
    path: Vec<NodeHandle>,
}

impl<N> Walk<'_, N> {
    fn descend<V: PathVisitor<N>>(&mut self, visitor: &mut V) {
        let Some(&current) = self.path.last() else {
            return;
        };
        let graph = self.graph;
        let edges = graph.edges(current);

        for edge in edges {
            let next = edge.target;
            if next != self.destination || self.on_path[next.0] {
                continue;
            }
            let node = &graph.nodes[next.0];
            if !visitor.should_visit(next, node) {
                continue;
            }
            visitor.will_visit(next, node);
            self.path.push(next);
            visitor.did_find_path(&self.path);
            self.path.pop();
            visitor.did_visit(next, node);
            break;
        }

        for edge in edges {
            let next = edge.target;
            if next == self.destination || self.on_path[next.0] {
                continue;
            }
            let node = &graph.nodes[next.0];
            if !visitor.should_visit(next, node) {
                continue;
            }
            visitor.will_visit(next, node);
            self.on_path[next.0] = true;
            self.path.push(next);
            self.descend(visitor);
            self.path.pop();
            self.on_path[next.0] = false;
            visitor.did_visit(next, node);
        }
    }
}
