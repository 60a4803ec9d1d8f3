#![allow(dead_code)]

use primcheck_engine::pipeline::BoundConfig;
use primcheck_ir::graph::Graph;

/// Node names used by the worked scenarios: `A = n0`, `B = n1`, `C = n2`.
pub const A: usize = 0;
pub const B: usize = 1;
pub const C: usize = 2;

pub fn graph(nodes: usize, edges: &[(usize, usize, i64)]) -> Graph {
    Graph::new(nodes, edges.iter().copied())
        .unwrap_or_else(|e| panic!("scenario graph is ill-formed: {e}"))
}

/// A small scope that runs in well under a second on one thread.
pub fn small_config(nodes: usize, edges: usize, bits: u32) -> BoundConfig {
    BoundConfig {
        threads: 2,
        ..BoundConfig::with_scope(nodes, edges, bits)
    }
}
