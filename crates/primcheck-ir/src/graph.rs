use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::sets::{write_ids, EdgeSet, NodeSet, SET_CAPACITY};

/// A unique identifier for a node within one graph instance.
pub type NodeId = usize;
/// A unique identifier for an edge within one graph instance.
pub type EdgeId = usize;

/// Largest node count a graph instance may have.
pub const MAX_NODES: usize = SET_CAPACITY;
/// Largest edge count a graph instance may have.
pub const MAX_EDGES: usize = SET_CAPACITY;

/// Largest weight representable in the non-negative half of a `bits`-wide
/// two's-complement integer.
///
/// `bits = 0` has no representable non-negative values and yields `-1`.
pub fn max_weight_for_bit_width(bits: u32) -> i64 {
    match bits {
        0 => -1,
        b if b >= 64 => i64::MAX,
        b => (1i64 << (b - 1)) - 1,
    }
}

/// Reasons a candidate graph instance is ill-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphError {
    #[error("graph has {count} nodes, more than the supported maximum of {max}")]
    TooManyNodes { count: usize, max: usize },
    #[error("graph has at least {count} edges, more than the supported maximum of {max}")]
    TooManyEdges { count: usize, max: usize },
    #[error("edge e{edge} connects node n{node} to itself")]
    SelfLoop { edge: EdgeId, node: NodeId },
    #[error("edge e{edge} references node n{node} outside the instance ({node_count} nodes)")]
    UnknownEndpoint {
        edge: EdgeId,
        node: NodeId,
        node_count: usize,
    },
    #[error("edge e{edge} has negative weight {weight}")]
    NegativeWeight { edge: EdgeId, weight: i64 },
    #[error("edge e{edge} has weight {weight}, above the representable maximum {max}")]
    WeightOutOfRange { edge: EdgeId, weight: i64, max: i64 },
}

/// A weighted edge between two distinct nodes.
///
/// `endpoints` is an unordered pair stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub weight: i64,
    pub endpoints: [NodeId; 2],
}

impl Edge {
    pub fn touches(&self, node: NodeId) -> bool {
        self.endpoints[0] == node || self.endpoints[1] == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        match self.endpoints {
            [a, b] if a == node => Some(b),
            [a, b] if b == node => Some(a),
            _ => None,
        }
    }

    pub fn endpoint_set(&self) -> NodeSet {
        let mut set = NodeSet::singleton(self.endpoints[0]);
        set.insert(self.endpoints[1]);
        set
    }

    /// Exactly one endpoint lies inside `covered`.
    pub fn crosses(&self, covered: NodeSet) -> bool {
        covered.contains(self.endpoints[0]) != covered.contains(self.endpoints[1])
    }
}

/// An immutable graph instance: nodes `0..node_count` and a list of edges.
///
/// Parallel edges are allowed; each edge is an independent entity identified
/// by its position in the edge list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Graph {
    node_count: usize,
    edges: Vec<Edge>,
}

impl Graph {
    /// Build a graph from `(a, b, weight)` triples. Edge ids follow input order.
    pub fn new<I>(node_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (NodeId, NodeId, i64)>,
    {
        if node_count > MAX_NODES {
            return Err(GraphError::TooManyNodes {
                count: node_count,
                max: MAX_NODES,
            });
        }
        let mut built = Vec::new();
        for (id, (a, b, weight)) in edges.into_iter().enumerate() {
            if id >= MAX_EDGES {
                return Err(GraphError::TooManyEdges {
                    count: id + 1,
                    max: MAX_EDGES,
                });
            }
            for node in [a, b] {
                if node >= node_count {
                    return Err(GraphError::UnknownEndpoint {
                        edge: id,
                        node,
                        node_count,
                    });
                }
            }
            if a == b {
                return Err(GraphError::SelfLoop { edge: id, node: a });
            }
            if weight < 0 {
                return Err(GraphError::NegativeWeight { edge: id, weight });
            }
            built.push(Edge {
                id,
                weight,
                endpoints: [a.min(b), a.max(b)],
            });
        }
        Ok(Self {
            node_count,
            edges: built,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every node of the instance.
    pub fn nodes(&self) -> NodeSet {
        NodeSet::full(self.node_count)
    }

    /// Every edge of the instance.
    pub fn all_edges(&self) -> EdgeSet {
        EdgeSet::full(self.edges.len())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Edges of `set` that belong to this graph, in id order.
    pub fn edges_in(&self, set: EdgeSet) -> impl Iterator<Item = &Edge> + '_ {
        set.iter().filter_map(move |id| self.edges.get(id))
    }

    /// Sum of the weights of the edges in `set`.
    ///
    /// Summed in `i128`, which holds [`MAX_EDGES`] weights of any `i64` value.
    pub fn total_weight(&self, set: EdgeSet) -> i128 {
        self.edges_in(set).map(|e| i128::from(e.weight)).sum()
    }

    /// Union of the endpoints of the edges in `set`.
    pub fn endpoints_of(&self, set: EdgeSet) -> NodeSet {
        self.edges_in(set)
            .fold(NodeSet::empty(), |acc, e| acc.union(e.endpoint_set()))
    }

    /// Nodes reachable from `start` through the edges of `set`, `start` included.
    pub fn reachable_from(&self, start: NodeId, set: EdgeSet) -> NodeSet {
        let mut reached = NodeSet::singleton(start);
        loop {
            let mut grown = reached;
            for edge in self.edges_in(set) {
                if edge.crosses(grown) {
                    grown = grown.union(edge.endpoint_set());
                }
            }
            if grown == reached {
                return reached;
            }
            reached = grown;
        }
    }

    /// Whether every node is reachable from node 0 using all edges.
    ///
    /// Graphs with zero or one node are connected.
    pub fn is_connected(&self) -> bool {
        if self.node_count <= 1 {
            return true;
        }
        self.reachable_from(0, self.all_edges()) == self.nodes()
    }

    /// Check every edge weight against an upper bound.
    pub fn check_weight_bound(&self, max: i64) -> Result<(), GraphError> {
        match self.edges.iter().find(|e| e.weight > max) {
            Some(e) => Err(GraphError::WeightOutOfRange {
                edge: e.id,
                weight: e.weight,
                max,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph with {} node(s) ", self.node_count)?;
        write_ids(f, "n", 0..self.node_count)?;
        writeln!(f, " and {} edge(s)", self.edges.len())?;
        for e in &self.edges {
            writeln!(
                f,
                "    e{}: n{} -- n{} (weight {})",
                e.id, e.endpoints[0], e.endpoints[1], e.weight
            )?;
        }
        Ok(())
    }
}
