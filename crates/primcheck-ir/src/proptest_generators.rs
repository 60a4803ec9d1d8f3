//! Proptest strategies for generating well-formed `Graph` instances.

use proptest::prelude::*;

use crate::graph::Graph;

/// Strategy for an arbitrary well-formed graph, possibly disconnected.
///
/// Generated graphs have:
/// - 1..=`max_nodes` nodes
/// - 0..=`max_edges` edges (none when there is a single node)
/// - weights in `0..=max_weight`
pub fn arb_graph(
    max_nodes: usize,
    max_edges: usize,
    max_weight: i64,
) -> impl Strategy<Value = Graph> {
    (1..=max_nodes.max(1))
        .prop_flat_map(move |nodes| {
            let edges = if nodes < 2 { 0 } else { max_edges };
            let edge_strategy = proptest::collection::vec(
                (0..nodes, 0..nodes, 0..=max_weight.max(0)),
                0..=edges,
            );
            (Just(nodes), edge_strategy)
        })
        .prop_filter_map("well-formed graph", |(nodes, raw)| {
            // Redirect self-loops to the next node so every edge stays valid.
            let edges = raw.into_iter().map(|(a, b, w)| {
                let b = if a == b { (b + 1) % nodes } else { b };
                (a, b, w)
            });
            Graph::new(nodes, edges).ok()
        })
}

/// Strategy for a connected well-formed graph.
///
/// A random spanning tree (each node `i > 0` attached to some earlier node)
/// is laid down first, followed by up to `extra_edges` arbitrary edges.
pub fn arb_connected_graph(
    max_nodes: usize,
    extra_edges: usize,
    max_weight: i64,
) -> impl Strategy<Value = Graph> {
    (1..=max_nodes.max(1))
        .prop_flat_map(move |nodes| {
            let weight = 0..=max_weight.max(0);
            let parents: Vec<BoxedStrategy<(usize, i64)>> = (1..nodes)
                .map(|child| (0..child, weight.clone()).boxed())
                .collect();
            let extras = if nodes < 2 { 0 } else { extra_edges };
            let extra = proptest::collection::vec(
                (0..nodes, 0..nodes, weight),
                0..=extras,
            );
            (Just(nodes), parents, extra)
        })
        .prop_filter_map("well-formed graph", |(nodes, parents, extra)| {
            let tree = parents
                .into_iter()
                .enumerate()
                .map(|(i, (parent, w))| (parent, i + 1, w));
            let extra = extra.into_iter().map(|(a, b, w)| {
                let b = if a == b { (b + 1) % nodes } else { b };
                (a, b, w)
            });
            Graph::new(nodes, tree.chain(extra)).ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_graphs_are_well_formed(g in arb_graph(5, 6, 7)) {
            prop_assert!(g.node_count() >= 1 && g.node_count() <= 5);
            prop_assert!(g.edge_count() <= 6);
            for e in g.edges() {
                prop_assert!(e.endpoints[0] < e.endpoints[1]);
                prop_assert!(e.endpoints[1] < g.node_count());
                prop_assert!((0..=7).contains(&e.weight));
            }
        }

        #[test]
        fn connected_strategy_yields_connected_graphs(g in arb_connected_graph(6, 4, 3)) {
            prop_assert!(g.is_connected());
            prop_assert!(g.edge_count() >= g.node_count() - 1);
        }
    }
}
