//! # Track graph
//!
//! The track is a directed graph with node ids `0..N-1`. Each node owns its outgoing edges, each
//! edge carrying a non-negative traversal cost and the direction the vehicle must take at the
//! junction to follow it. The direction is only passed on to steering, it plays no part in the
//! cost of a route.
//!
//! The path engine only relies on the [`Graph`] trait. [`TrackGraph`] is the adjacency list
//! implementation loaded from the `track.toml` parameter file:
//!
//! ```toml
//! [[nodes]]
//! edges = [ { end = 1, cost = 4, dir = "FORWARD" } ]
//!
//! [[nodes]]
//! edges = [ { end = 0, cost = 4, dir = "LEFT" } ]
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Identifier of a node in the track graph.
pub type NodeId = usize;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The contract a track graph must meet to be searched by the path engine.
pub trait Graph {
    /// Number of nodes in the graph. Valid node ids are `0..num_nodes()`.
    fn num_nodes(&self) -> usize;

    /// Outgoing edges of the given node. Nodes outside the graph have no edges.
    fn edges(&self, node: NodeId) -> &[Edge];

    /// The edge between two nodes. If several edges join the same pair of nodes the cheapest
    /// one is returned.
    fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges(from)
            .iter()
            .filter(|e| e.end == to)
            .min_by_key(|e| e.cost)
    }

    /// The first outgoing edge of the given node, which defines how a loop leaves it.
    fn first_edge(&self, node: NodeId) -> Option<&Edge> {
        self.edges(node).first()
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A directed edge out of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Node the edge arrives at
    pub end: NodeId,

    /// Cost of traversing the edge
    pub cost: u32,

    /// Direction taken at the junction to follow this edge
    pub dir: Direction,
}

/// A node of the track and its outgoing edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Adjacency list graph describing the physical track layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackGraph {
    nodes: Vec<Node>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction label of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Forward,
    Left,
    Right,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Edge {edge} of node {node} ends at node {end}, but the graph only has {num_nodes} nodes")]
    EdgeOutOfRange {
        node: NodeId,
        edge: usize,
        end: NodeId,
        num_nodes: usize,
    },

    #[error("Node {0} is not in the graph")]
    NodeOutOfRange(NodeId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackGraph {
    /// Create a graph with the given number of nodes and no edges.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            nodes: vec![Node::default(); num_nodes],
        }
    }

    /// Add an edge from `from` to `end`.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        end: NodeId,
        cost: u32,
        dir: Direction,
    ) -> Result<(), GraphError> {
        let num_nodes = self.nodes.len();

        if end >= num_nodes {
            return Err(GraphError::EdgeOutOfRange {
                node: from,
                edge: self.edges(from).len(),
                end,
                num_nodes,
            });
        }

        self.nodes
            .get_mut(from)
            .ok_or(GraphError::NodeOutOfRange(from))?
            .edges
            .push(Edge { end, cost, dir });

        Ok(())
    }

    /// Check that every edge ends at a node of the graph.
    ///
    /// Graphs deserialised from parameter files must be validated before use.
    pub fn validate(&self) -> Result<(), GraphError> {
        let num_nodes = self.nodes.len();

        for (node, n) in self.nodes.iter().enumerate() {
            for (edge, e) in n.edges.iter().enumerate() {
                if e.end >= num_nodes {
                    return Err(GraphError::EdgeOutOfRange {
                        node,
                        edge,
                        end: e.end,
                        num_nodes,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Graph for TrackGraph {
    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn edges(&self, node: NodeId) -> &[Edge] {
        match self.nodes.get(node) {
            Some(n) => &n.edges,
            None => &[],
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "FORWARD"),
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
