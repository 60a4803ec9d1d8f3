//! Worked scenarios for the transition engine and property checker.

mod common;

use common::{graph, A, B, C};
use primcheck_engine::properties::{is_optimal, is_spanning_tree, minimum_spanning_weight};
use primcheck_engine::transition::{run, run_all, Run, TransitionError};
use primcheck_ir::sets::{EdgeSet, NodeSet};

#[test]
fn single_node_without_edges() {
    let g = graph(1, &[]);
    let run = run(&g, A).unwrap();
    assert!(run.is_complete());
    assert_eq!(run.trace().chosen(), EdgeSet::empty());
    assert!(is_spanning_tree(&g, EdgeSet::empty()));
}

#[test]
fn two_nodes_one_edge() {
    let g = graph(2, &[(A, B, 3)]);
    let run = run(&g, A).unwrap();
    let terminal = run.trace().terminal();
    assert_eq!(terminal.chosen, EdgeSet::singleton(0));
    assert_eq!(terminal.covered, [A, B].into_iter().collect::<NodeSet>());
    assert!(is_spanning_tree(&g, terminal.chosen));
    assert!(is_optimal(&g, terminal.chosen));
}

#[test]
fn triangle_with_heavy_edge() {
    let g = graph(3, &[(A, B, 1), (B, C, 1), (A, C, 5)]);
    let run = run(&g, A).unwrap();
    let chosen = run.trace().chosen();
    assert_eq!(chosen, [0, 1].into_iter().collect::<EdgeSet>());
    assert_eq!(g.total_weight(chosen), 2);
    assert!(is_optimal(&g, chosen));
    assert_eq!(minimum_spanning_weight(&g), Some(2));
}

#[test]
fn disconnected_pair_is_stuck_after_zero_steps() {
    let g = graph(2, &[]);
    match run(&g, A).unwrap() {
        Run::Stuck { trace, uncovered } => {
            assert_eq!(trace.real_steps(), 0);
            assert_eq!(uncovered, NodeSet::singleton(B));
        }
        Run::Complete { .. } => panic!("a disconnected pair cannot complete"),
    }
}

#[test]
fn tie_break_is_deterministic_and_every_choice_is_optimal() {
    // From A, both A-B and A-C weigh 2.
    let g = graph(3, &[(A, C, 2), (A, B, 2), (B, C, 4)]);
    let first = run(&g, A).unwrap();
    assert_eq!(first, run(&g, A).unwrap());
    assert_eq!(first.trace().choice_order()[0], 0);

    let explored = run_all(&g, A, 16).unwrap();
    assert_eq!(explored.runs.len(), 2);
    for run in &explored.runs {
        assert!(run.is_complete());
        assert!(is_optimal(&g, run.trace().chosen()));
    }
}

#[test]
fn zero_node_graph_has_no_run() {
    let g = graph(0, &[]);
    assert_eq!(run(&g, A), Err(TransitionError::EmptyGraph));
    assert!(!is_spanning_tree(&g, EdgeSet::empty()));
}

#[test]
fn parallel_edges_pick_the_lighter_copy() {
    let g = graph(2, &[(A, B, 4), (A, B, 1)]);
    let chosen = run(&g, B).unwrap().trace().chosen();
    assert_eq!(chosen, EdgeSet::singleton(1));
    assert!(is_optimal(&g, chosen));
    assert!(!is_optimal(&g, EdgeSet::singleton(0)));
}
