use criterion::{black_box, criterion_group, criterion_main, Criterion};
use primcheck_engine::pipeline::{evaluate_instance, verify, BoundConfig};
use primcheck_ir::graph::Graph;

fn dense_four_node_graph() -> Graph {
    Graph::new(
        4,
        [
            (0, 1, 3),
            (0, 2, 1),
            (0, 3, 4),
            (1, 2, 1),
            (1, 3, 2),
            (2, 3, 5),
            (0, 1, 2),
        ],
    )
    .unwrap()
}

fn bench_evaluate_instance(c: &mut Criterion) {
    let graph = dense_four_node_graph();
    let config = BoundConfig::with_scope(4, 7, 3);
    c.bench_function("engine_evaluate_dense_four_nodes", |b| {
        b.iter(|| evaluate_instance(0, black_box(&graph), black_box(&config)).unwrap())
    });
}

fn bench_verify_small_scope(c: &mut Criterion) {
    let config = BoundConfig::with_scope(3, 3, 3);
    c.bench_function("engine_verify_three_nodes_three_edges", |b| {
        b.iter(|| verify(black_box(&config)).unwrap())
    });
}

criterion_group!(benches, bench_evaluate_instance, bench_verify_small_scope);
criterion_main!(benches);
