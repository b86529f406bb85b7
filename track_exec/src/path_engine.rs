//! # Path engine
//!
//! Directed shortest paths over the track graph using Dijkstra's algorithm. A path is the list of
//! steps the vehicle takes after leaving the start node, each step being the node arrived at and
//! the direction taken to get there. The start node itself is never part of the path.
//!
//! When the start and end nodes are the same the vehicle is asked to drive a full circuit: it
//! leaves the start along the node's first outgoing edge and is routed back to the start from
//! there. The returned path includes the departing edge as its first step and ends with the
//! arrival back at the start.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;
use thiserror::Error;

// Internal
use crate::graph::{Direction, Graph, NodeId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single step along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// The node arrived at
    pub node: NodeId,

    /// The direction of the edge taken to arrive at the node
    pub dir: Direction,
}

/// An ordered route through the track graph, excluding the node it starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    steps: Vec<PathStep>,
}

/// Entry in the search queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    cost: u64,
    node: NodeId,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Node {node} is not in the track graph, which has {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },

    #[error("There is no route from node {start} to node {end}")]
    Unreachable { start: NodeId, end: NodeId },

    #[error("Node {0} has no outgoing edges so a loop cannot start from it")]
    NoOutgoingEdge(NodeId),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the cheapest route from `start` to `end`.
///
/// If `start == end` the route is a full loop leaving `start` by its first outgoing edge.
pub fn find_shortest_path<G>(graph: &G, start: NodeId, end: NodeId) -> Result<Path, PathError>
where
    G: Graph + ?Sized,
{
    let num_nodes = graph.num_nodes();
    for &node in &[start, end] {
        if node >= num_nodes {
            return Err(PathError::NodeOutOfRange { node, num_nodes });
        }
    }

    let path = if start == end {
        let first = graph
            .first_edge(start)
            .ok_or(PathError::NoOutgoingEdge(start))?;

        let mut steps = vec![PathStep {
            node: first.end,
            dir: first.dir,
        }];

        // A self loop is already the full circuit
        if first.end != end {
            steps.extend(dijkstra(graph, first.end, end)?);
        }

        Path { steps }
    } else {
        Path {
            steps: dijkstra(graph, start, end)?,
        }
    };

    trace!(
        "Path from {} to {}: {:?} (cost {:?})",
        start,
        end,
        path.nodes().collect::<Vec<_>>(),
        path.cost(graph, start)
    );

    Ok(path)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Search from `start` until `end` is settled, returning the reconstructed steps.
///
/// Nodes are pushed again whenever their cost improves rather than being updated in the queue,
/// so entries for already visited nodes are skipped when popped.
fn dijkstra<G>(graph: &G, start: NodeId, end: NodeId) -> Result<Vec<PathStep>, PathError>
where
    G: Graph + ?Sized,
{
    let num_nodes = graph.num_nodes();

    let mut cost: Vec<Option<u64>> = vec![None; num_nodes];
    let mut prev: Vec<Option<(NodeId, Direction)>> = vec![None; num_nodes];
    let mut visited = vec![false; num_nodes];
    let mut heap = BinaryHeap::new();

    cost[start] = Some(0);
    heap.push(QueueEntry {
        cost: 0,
        node: start,
    });

    while let Some(QueueEntry { cost: node_cost, node }) = heap.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;

        // The end's cost is final once it is popped
        if node == end {
            break;
        }

        for edge in graph.edges(node) {
            if edge.end >= num_nodes || visited[edge.end] {
                continue;
            }

            let new_cost = node_cost + edge.cost as u64;

            let improved = match cost[edge.end] {
                Some(c) => new_cost < c,
                None => true,
            };

            if improved {
                cost[edge.end] = Some(new_cost);
                prev[edge.end] = Some((node, edge.dir));
                heap.push(QueueEntry {
                    cost: new_cost,
                    node: edge.end,
                });
            }
        }
    }

    if !visited[end] {
        return Err(PathError::Unreachable { start, end });
    }

    // Walk the predecessors back from the end
    let mut steps = Vec::new();
    let mut current = end;

    while current != start {
        let (p, dir) = prev[current].ok_or(PathError::Unreachable { start, end })?;
        steps.push(PathStep { node: current, dir });
        current = p;
    }

    steps.reverse();

    Ok(steps)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&PathStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Iterator over the nodes visited by the path, in order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().map(|s| s.node)
    }

    /// True if the path is not empty and its last step arrives at `node`.
    ///
    /// A path which does not terminate at the active mission's end is stale.
    pub fn terminates_at(&self, node: NodeId) -> bool {
        self.last().map(|s| s.node == node).unwrap_or(false)
    }

    /// Total cost of the path when driven from `start`.
    ///
    /// Returns `None` if the steps do not form a walk through the graph starting at `start`.
    pub fn cost<G>(&self, graph: &G, start: NodeId) -> Option<u64>
    where
        G: Graph + ?Sized,
    {
        let mut total = 0u64;
        let mut current = start;

        for step in &self.steps {
            // Take the cheapest edge with the right direction, parallel edges may differ
            let edge = graph
                .edges(current)
                .iter()
                .filter(|e| e.end == step.node && e.dir == step.dir)
                .min_by_key(|e| e.cost)?;

            total += edge.cost as u64;
            current = step.node;
        }

        Some(total)
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Note that we flip the order here so that the heap will be a min-heap, not a max-heap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
