//! The two correctness predicates checked against a run's final edge set:
//! spanning-tree validity and minimality of total weight.

use serde::Serialize;
use thiserror::Error;

use primcheck_ir::graph::{EdgeId, Graph};
use primcheck_ir::sets::{EdgeSet, NodeSet};

/// Why an edge set is not a spanning tree of its instance.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanningTreeViolation {
    #[error("the instance has no nodes to span")]
    EmptyGraph,
    #[error("edge e{edge} is not part of the instance")]
    ForeignEdge { edge: EdgeId },
    #[error("edges touch {touched:?} but the instance has nodes {expected:?}")]
    Coverage { touched: NodeSet, expected: NodeSet },
    #[error("{actual} edges chosen, a spanning tree of {nodes} nodes has {expected}")]
    EdgeCount {
        nodes: usize,
        expected: usize,
        actual: usize,
    },
    #[error("edges connect only {reached:?} of {expected:?}")]
    Disconnected { reached: NodeSet, expected: NodeSet },
}

/// Why an edge set is not a minimum spanning tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimalityViolation {
    #[error("not a spanning tree: {0}")]
    NotSpanning(#[from] SpanningTreeViolation),
    #[error("spanning tree {witness:?} weighs {witness_weight}, less than the chosen {chosen_weight}")]
    Cheaper {
        chosen_weight: i128,
        witness: EdgeSet,
        witness_weight: i128,
    },
}

/// Check `edges` against the three spanning-tree conditions in order:
/// node coverage, edge count `|Node| - 1`, and connectivity.
///
/// A zero-node instance has no spanning tree.
pub fn check_spanning_tree(graph: &Graph, edges: EdgeSet) -> Result<(), SpanningTreeViolation> {
    let nodes = graph.node_count();
    if nodes == 0 {
        return Err(SpanningTreeViolation::EmptyGraph);
    }
    if let Some(edge) = edges.iter().find(|&id| id >= graph.edge_count()) {
        return Err(SpanningTreeViolation::ForeignEdge { edge });
    }
    let expected = graph.nodes();
    // One node, no edges: the empty set spans it.
    if nodes > 1 || !edges.is_empty() {
        let touched = graph.endpoints_of(edges);
        if touched != expected {
            return Err(SpanningTreeViolation::Coverage { touched, expected });
        }
    }
    if edges.len() != nodes - 1 {
        return Err(SpanningTreeViolation::EdgeCount {
            nodes,
            expected: nodes - 1,
            actual: edges.len(),
        });
    }
    let reached = graph.reachable_from(0, edges);
    if reached != expected {
        return Err(SpanningTreeViolation::Disconnected { reached, expected });
    }
    Ok(())
}

pub fn is_spanning_tree(graph: &Graph, edges: EdgeSet) -> bool {
    check_spanning_tree(graph, edges).is_ok()
}

/// Iterator over every `k`-element subset of `{0, .., m-1}` in increasing
/// bit-pattern order (Gosper's hack).
#[derive(Debug, Clone)]
pub struct Subsets {
    next: Option<u64>,
    mask: u64,
}

impl Subsets {
    pub fn new(m: usize, k: usize) -> Self {
        let mask = EdgeSet::full(m).bits();
        let next = if k > m {
            None
        } else {
            Some(EdgeSet::full(k).bits())
        };
        Self { next, mask }
    }
}

fn gosper_successor(x: u64) -> Option<u64> {
    if x == 0 {
        return None;
    }
    let lowest = x & x.wrapping_neg();
    let ripple = x.checked_add(lowest)?;
    Some((((ripple ^ x) >> 2) / lowest) | ripple)
}

impl Iterator for Subsets {
    type Item = EdgeSet;

    fn next(&mut self) -> Option<EdgeSet> {
        let current = self.next?;
        let mask = self.mask;
        self.next = gosper_successor(current).filter(|s| s & !mask == 0);
        Some(EdgeSet::from_bits(current))
    }
}

/// Edge subsets that could be spanning trees of `graph`: those of size
/// `|Node| - 1`. Empty for a zero-node graph.
pub fn candidate_subsets(graph: &Graph) -> Subsets {
    match graph.node_count().checked_sub(1) {
        Some(k) => Subsets::new(graph.edge_count(), k),
        None => Subsets {
            next: None,
            mask: 0,
        },
    }
}

/// Result of searching the candidate subsets for a cheaper spanning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheaperSearch {
    /// Candidate subsets inspected before the search ended.
    pub examined: u64,
    /// The first spanning tree found that weighs less than the bound.
    pub witness: Option<EdgeSet>,
}

/// Look for a spanning tree of `graph` with total weight below `bound`.
pub fn find_cheaper_spanning_tree(graph: &Graph, bound: i128) -> CheaperSearch {
    let mut examined = 0;
    for subset in candidate_subsets(graph) {
        examined += 1;
        if graph.total_weight(subset) < bound && is_spanning_tree(graph, subset) {
            return CheaperSearch {
                examined,
                witness: Some(subset),
            };
        }
    }
    CheaperSearch {
        examined,
        witness: None,
    }
}

/// Check that `edges` is a spanning tree and no spanning tree of `graph`
/// weighs less.
pub fn check_optimal(graph: &Graph, edges: EdgeSet) -> Result<(), OptimalityViolation> {
    check_spanning_tree(graph, edges)?;
    let chosen_weight = graph.total_weight(edges);
    match find_cheaper_spanning_tree(graph, chosen_weight).witness {
        Some(witness) => Err(OptimalityViolation::Cheaper {
            chosen_weight,
            witness,
            witness_weight: graph.total_weight(witness),
        }),
        None => Ok(()),
    }
}

pub fn is_optimal(graph: &Graph, edges: EdgeSet) -> bool {
    check_optimal(graph, edges).is_ok()
}

/// Weight of a minimum spanning tree found by brute force over every
/// candidate subset, or `None` when the graph has no spanning tree.
pub fn minimum_spanning_weight(graph: &Graph) -> Option<i128> {
    candidate_subsets(graph)
        .filter(|&s| is_spanning_tree(graph, s))
        .map(|s| graph.total_weight(s))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        Graph::new(3, [(0, 1, 1), (1, 2, 1), (0, 2, 5)]).unwrap()
    }

    fn set(ids: &[usize]) -> EdgeSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn single_node_empty_set_is_a_spanning_tree() {
        let g = Graph::new(1, []).unwrap();
        assert!(is_spanning_tree(&g, EdgeSet::empty()));
        assert!(is_optimal(&g, EdgeSet::empty()));
    }

    #[test]
    fn zero_node_graph_has_no_spanning_tree() {
        let g = Graph::new(0, []).unwrap();
        assert_eq!(
            check_spanning_tree(&g, EdgeSet::empty()),
            Err(SpanningTreeViolation::EmptyGraph)
        );
        assert_eq!(minimum_spanning_weight(&g), None);
    }

    #[test]
    fn conditions_are_checked_in_order() {
        let g = triangle();
        assert!(matches!(
            check_spanning_tree(&g, set(&[0])),
            Err(SpanningTreeViolation::Coverage { .. })
        ));
        assert_eq!(
            check_spanning_tree(&g, set(&[0, 1, 2])),
            Err(SpanningTreeViolation::EdgeCount {
                nodes: 3,
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(
            check_spanning_tree(&g, set(&[7])),
            Err(SpanningTreeViolation::ForeignEdge { edge: 7 })
        );
        assert!(is_spanning_tree(&g, set(&[0, 2])));
    }

    #[test]
    fn covering_set_with_a_cycle_is_disconnected() {
        // Parallel n0-n1 edges plus n2-n3: every node touched, three edges,
        // but two components.
        let g = Graph::new(4, [(0, 1, 1), (0, 1, 1), (2, 3, 1)]).unwrap();
        assert!(matches!(
            check_spanning_tree(&g, set(&[0, 1, 2])),
            Err(SpanningTreeViolation::Disconnected { .. })
        ));
    }

    #[test]
    fn heavier_tree_is_not_optimal() {
        let g = triangle();
        assert!(is_optimal(&g, set(&[0, 1])));
        assert_eq!(
            check_optimal(&g, set(&[0, 2])),
            Err(OptimalityViolation::Cheaper {
                chosen_weight: 6,
                witness: set(&[0, 1]),
                witness_weight: 2
            })
        );
        assert!(matches!(
            check_optimal(&g, set(&[0])),
            Err(OptimalityViolation::NotSpanning(_))
        ));
    }

    #[test]
    fn subsets_enumerate_every_combination_once() {
        let all: Vec<_> = Subsets::new(5, 2).collect();
        assert_eq!(all.len(), 10);
        assert!(all.iter().all(|s| s.len() == 2));
        assert!(all.windows(2).all(|w| w[0].bits() < w[1].bits()));
        assert_eq!(Subsets::new(3, 0).collect::<Vec<_>>(), vec![EdgeSet::empty()]);
        assert_eq!(Subsets::new(2, 3).count(), 0);
        assert_eq!(Subsets::new(64, 64).count(), 1);
        assert_eq!(Subsets::new(64, 63).count(), 64);
    }

    #[test]
    fn cheaper_search_counts_examined_subsets() {
        let g = triangle();
        let search = find_cheaper_spanning_tree(&g, 2);
        assert_eq!(search.witness, None);
        assert_eq!(search.examined, 3);
        assert_eq!(minimum_spanning_weight(&g), Some(2));
    }

    #[test]
    fn optimality_holds_for_weights_near_i64_max() {
        let heavy = i64::MAX / 2;
        let g = Graph::new(4, [(0, 1, heavy), (1, 2, heavy), (2, 3, heavy)]).unwrap();
        let all = g.all_edges();
        assert!(is_spanning_tree(&g, all));
        assert!(is_optimal(&g, all));
        assert_eq!(minimum_spanning_weight(&g), Some(3 * i128::from(heavy)));
    }

    #[test]
    fn cheaper_tree_is_found_among_heavy_edges() {
        let g = Graph::new(3, [(0, 1, i64::MAX), (1, 2, i64::MAX), (0, 2, 1)]).unwrap();
        assert!(matches!(
            check_optimal(&g, set(&[0, 1])),
            Err(OptimalityViolation::Cheaper { .. })
        ));
        assert!(is_optimal(&g, set(&[0, 2])));
    }
}
