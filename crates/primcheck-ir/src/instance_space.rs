//! Exhaustive enumeration of graph instances within node, edge and weight
//! bounds.
//!
//! For a node count `n` the space of possible edges is every unordered pair
//! of distinct nodes paired with every weight in `0..=max_weight`; these
//! are the edge *kinds*. An instance with `m` edges is a length-`m` sequence
//! of kinds. Under [`SymmetryReduction::EdgePermutation`] only
//! non-decreasing sequences are produced, so each edge multiset appears once.

use serde::{Deserialize, Serialize};

use crate::graph::{Graph, GraphError, NodeId};

/// Which isomorphic duplicates the enumerator skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymmetryReduction {
    /// Edge lists that differ only by edge order are produced once.
    #[default]
    EdgePermutation,
    /// Every ordered edge list is produced.
    None,
}

/// Size limits of the enumerated space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstanceBounds {
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Largest edge weight; weights range over `0..=max_weight`.
    pub max_weight: i64,
}

/// One enumerated candidate, in enumeration order.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Zero-based position in the enumeration.
    pub index: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub graph: Result<Graph, GraphError>,
}

/// The set of graph instances within [`InstanceBounds`].
#[derive(Debug, Clone, Copy)]
pub struct InstanceSpace {
    bounds: InstanceBounds,
    symmetry: SymmetryReduction,
}

impl InstanceSpace {
    pub fn new(bounds: InstanceBounds, symmetry: SymmetryReduction) -> Self {
        Self { bounds, symmetry }
    }

    pub fn bounds(&self) -> InstanceBounds {
        self.bounds
    }

    pub fn symmetry(&self) -> SymmetryReduction {
        self.symmetry
    }

    fn weight_values(&self) -> usize {
        if self.bounds.max_weight < 0 {
            0
        } else {
            usize::try_from(self.bounds.max_weight)
                .map(|w| w.saturating_add(1))
                .unwrap_or(usize::MAX)
        }
    }

    /// Number of distinct edge kinds available to an `nodes`-node instance.
    pub fn edge_kinds(&self, nodes: usize) -> usize {
        pair_count(nodes).saturating_mul(self.weight_values())
    }

    /// `(node_count, edge_count)` pairs in enumeration order.
    pub fn sizes(&self) -> impl Iterator<Item = (usize, usize)> {
        let max_edges = self.bounds.max_edges;
        (0..=self.bounds.max_nodes).flat_map(move |n| (0..=max_edges).map(move |m| (n, m)))
    }

    /// Number of instances with exactly `nodes` nodes and `edges` edges.
    /// Saturates at `u128::MAX`.
    pub fn count_for(&self, nodes: usize, edges: usize) -> u128 {
        let kinds = self.edge_kinds(nodes) as u128;
        if edges == 0 {
            return 1;
        }
        if kinds == 0 {
            return 0;
        }
        match self.symmetry {
            SymmetryReduction::EdgePermutation => binomial(kinds + edges as u128 - 1, edges as u128),
            SymmetryReduction::None => {
                let mut total: u128 = 1;
                for _ in 0..edges {
                    total = total.saturating_mul(kinds);
                }
                total
            }
        }
    }

    /// Total number of instances in the space. Saturates at `u128::MAX`.
    pub fn count(&self) -> u128 {
        self.sizes()
            .map(|(n, m)| self.count_for(n, m))
            .fold(0u128, u128::saturating_add)
    }

    pub fn iter(&self) -> Instances {
        Instances::new(*self)
    }
}

impl IntoIterator for &InstanceSpace {
    type Item = Candidate;
    type IntoIter = Instances;

    fn into_iter(self) -> Instances {
        self.iter()
    }
}

/// `n choose k`, saturating at `u128::MAX`.
pub fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 1..=k {
        // result * (n - k + i) is divisible by i at every step.
        result = match result.checked_mul(n - k + i) {
            Some(product) => product / i,
            None => return u128::MAX,
        };
    }
    result
}

fn pair_count(nodes: usize) -> usize {
    nodes.saturating_mul(nodes.saturating_sub(1)) / 2
}

fn node_pairs(nodes: usize) -> Vec<(NodeId, NodeId)> {
    let mut pairs = Vec::with_capacity(pair_count(nodes));
    for a in 0..nodes {
        for b in (a + 1)..nodes {
            pairs.push((a, b));
        }
    }
    pairs
}

/// Iterator over every [`Candidate`] of an [`InstanceSpace`].
#[derive(Debug, Clone)]
pub struct Instances {
    space: InstanceSpace,
    nodes: usize,
    edges: usize,
    pairs: Vec<(NodeId, NodeId)>,
    kinds: usize,
    /// The next kind sequence to emit for the current size, if any.
    pending: Option<Vec<usize>>,
    started: bool,
    next_index: u64,
}

impl Instances {
    fn new(space: InstanceSpace) -> Self {
        let mut iter = Self {
            space,
            nodes: 0,
            edges: 0,
            pairs: Vec::new(),
            kinds: 0,
            pending: None,
            started: false,
            next_index: 0,
        };
        iter.enter_size();
        iter
    }

    fn exhausted(&self) -> bool {
        self.nodes > self.space.bounds.max_nodes
    }

    /// Prepare the first sequence of the current `(nodes, edges)` size.
    fn enter_size(&mut self) {
        if !self.started || self.edges == 0 {
            self.pairs = node_pairs(self.nodes);
            self.kinds = self.space.edge_kinds(self.nodes);
        }
        self.started = true;
        self.pending = if self.edges == 0 {
            Some(Vec::new())
        } else if self.kinds == 0 {
            None
        } else {
            Some(vec![0; self.edges])
        };
    }

    fn next_size(&mut self) {
        self.edges += 1;
        if self.edges > self.space.bounds.max_edges {
            self.edges = 0;
            self.nodes += 1;
        }
        if !self.exhausted() {
            self.enter_size();
        }
    }

    /// Advance `seq` to its successor, returning `false` when it was the last.
    fn advance(&self, seq: &mut [usize]) -> bool {
        let top = self.kinds - 1;
        let Some(pos) = seq.iter().rposition(|&k| k < top) else {
            return false;
        };
        seq[pos] += 1;
        let reset = match self.space.symmetry {
            SymmetryReduction::EdgePermutation => seq[pos],
            SymmetryReduction::None => 0,
        };
        for k in &mut seq[pos + 1..] {
            *k = reset;
        }
        true
    }

    fn build(&self, seq: &[usize]) -> Result<Graph, GraphError> {
        let weights = self.kinds / self.pairs.len().max(1);
        let edges = seq.iter().map(|&kind| {
            let (a, b) = self.pairs[kind / weights];
            (a, b, (kind % weights) as i64)
        });
        let graph = Graph::new(self.nodes, edges)?;
        graph.check_weight_bound(self.space.bounds.max_weight)?;
        Ok(graph)
    }
}

impl Iterator for Instances {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        while !self.exhausted() {
            let Some(mut seq) = self.pending.take() else {
                self.next_size();
                continue;
            };
            let candidate = Candidate {
                index: self.next_index,
                node_count: self.nodes,
                edge_count: self.edges,
                graph: self.build(&seq),
            };
            self.next_index += 1;
            if !seq.is_empty() && self.advance(&mut seq) {
                self.pending = Some(seq);
            }
            return Some(candidate);
        }
        None
    }
}
