//! Evaluation of a single graph instance: run the engine from each start
//! node and check every resulting run against the selected properties.

use primcheck_ir::graph::{Graph, NodeId};

use crate::counterexample::Counterexample;
use crate::properties::{check_spanning_tree, find_cheaper_spanning_tree};
use crate::result::{InstanceOutcome, PropertyKind, Violation};
use crate::transition::{explore, Run, TransitionError};

use super::*;

/// Everything learned from one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceEvaluation {
    pub outcome: InstanceOutcome,
    pub counterexamples: Vec<Counterexample>,
    pub traces_checked: u64,
    pub subsets_examined: u64,
    /// Tie exploration stopped at `max_traces_per_instance` for some start.
    pub truncated: bool,
}

impl InstanceEvaluation {
    fn new(outcome: InstanceOutcome) -> Self {
        Self {
            outcome,
            counterexamples: Vec::new(),
            traces_checked: 0,
            subsets_examined: 0,
            truncated: false,
        }
    }
}

fn start_nodes(graph: &Graph, policy: StartPolicy) -> std::ops::Range<NodeId> {
    match policy {
        StartPolicy::First => 0..graph.node_count().min(1),
        StartPolicy::Every => 0..graph.node_count(),
    }
}

/// Evaluate instance `index` under `config`.
///
/// Zero-node instances are vacuous. An instance is stuck when any run ran
/// out of cutting edges; a stuck run on a connected instance is a
/// termination counterexample.
pub fn evaluate_instance(
    index: u64,
    graph: &Graph,
    config: &BoundConfig,
) -> Result<InstanceEvaluation, TransitionError> {
    if graph.node_count() == 0 {
        return Ok(InstanceEvaluation::new(InstanceOutcome::Vacuous));
    }
    let mut evaluation = InstanceEvaluation::new(InstanceOutcome::Checked);
    for start in start_nodes(graph, config.start) {
        let explored = explore(graph, start, config.tie_break, config.max_traces_per_instance)?;
        evaluation.truncated |= explored.truncated;
        for run in &explored.runs {
            evaluation.traces_checked += 1;
            for (property, violation) in check_run(graph, config, run, &mut evaluation) {
                evaluation.counterexamples.push(Counterexample::new(
                    index,
                    property,
                    violation,
                    graph,
                    config.tie_break,
                    run.trace().clone(),
                ));
            }
            if config.fail_fast && !evaluation.counterexamples.is_empty() {
                return Ok(evaluation);
            }
        }
    }
    Ok(evaluation)
}

fn check_run(
    graph: &Graph,
    config: &BoundConfig,
    run: &Run,
    evaluation: &mut InstanceEvaluation,
) -> Vec<(PropertyKind, Violation)> {
    let mut found = Vec::new();
    match run {
        Run::Stuck { trace, uncovered } => {
            evaluation.outcome = InstanceOutcome::Stuck;
            if let Err(reason) = trace.check_well_formed(graph) {
                found.push((PropertyKind::TraceInvariant, Violation::MalformedTrace { reason }));
            }
            if graph.is_connected() {
                found.push((
                    PropertyKind::Termination,
                    Violation::Stuck {
                        uncovered: *uncovered,
                    },
                ));
            }
        }
        Run::Complete { trace } => {
            if let Err(reason) = trace.check_complete(graph) {
                found.push((PropertyKind::TraceInvariant, Violation::MalformedTrace { reason }));
            }
            let chosen = trace.chosen();
            let spanning = check_spanning_tree(graph, chosen);
            if config.mode.checks_spanning_tree() {
                if let Err(reason) = &spanning {
                    found.push((
                        PropertyKind::SpanningTree,
                        Violation::NotSpanning {
                            reason: reason.clone(),
                        },
                    ));
                }
            }
            if config.mode.checks_optimality() {
                match spanning {
                    Err(reason) if !config.mode.checks_spanning_tree() => {
                        found.push((PropertyKind::Optimality, Violation::NotSpanning { reason }));
                    }
                    Err(_) => {}
                    Ok(()) => {
                        let chosen_weight = graph.total_weight(chosen);
                        let search = find_cheaper_spanning_tree(graph, chosen_weight);
                        evaluation.subsets_examined += search.examined;
                        if let Some(witness) = search.witness {
                            found.push((
                                PropertyKind::Optimality,
                                Violation::Cheaper {
                                    chosen_weight,
                                    witness,
                                    witness_weight: graph.total_weight(witness),
                                },
                            ));
                        }
                    }
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: CheckMode) -> BoundConfig {
        BoundConfig {
            mode,
            ..BoundConfig::with_scope(3, 3, 3)
        }
    }

    #[test]
    fn zero_node_instance_is_vacuous() {
        let g = Graph::new(0, []).unwrap();
        let evaluation = evaluate_instance(0, &g, &config(CheckMode::Both)).unwrap();
        assert_eq!(evaluation.outcome, InstanceOutcome::Vacuous);
        assert_eq!(evaluation.traces_checked, 0);
    }

    #[test]
    fn disconnected_instance_is_stuck_without_counterexample() {
        let g = Graph::new(3, [(0, 1, 2)]).unwrap();
        let evaluation = evaluate_instance(7, &g, &config(CheckMode::Both)).unwrap();
        assert_eq!(evaluation.outcome, InstanceOutcome::Stuck);
        assert!(evaluation.counterexamples.is_empty());
        assert_eq!(evaluation.subsets_examined, 0);
    }

    #[test]
    fn connected_instance_is_checked_and_searched() {
        let g = Graph::new(3, [(0, 1, 1), (1, 2, 1), (0, 2, 5)]).unwrap();
        let evaluation = evaluate_instance(1, &g, &config(CheckMode::Both)).unwrap();
        assert_eq!(evaluation.outcome, InstanceOutcome::Checked);
        assert!(evaluation.counterexamples.is_empty());
        assert_eq!(evaluation.traces_checked, 1);
        assert_eq!(evaluation.subsets_examined, 3);
    }

    #[test]
    fn correctness_mode_skips_subset_search() {
        let g = Graph::new(3, [(0, 1, 1), (1, 2, 1), (0, 2, 5)]).unwrap();
        let evaluation = evaluate_instance(1, &g, &config(CheckMode::Correctness)).unwrap();
        assert_eq!(evaluation.subsets_examined, 0);
    }

    #[test]
    fn every_start_runs_once_per_node() {
        let g = Graph::new(3, [(0, 1, 1), (1, 2, 1)]).unwrap();
        let cfg = BoundConfig {
            start: StartPolicy::Every,
            ..config(CheckMode::Both)
        };
        let evaluation = evaluate_instance(0, &g, &cfg).unwrap();
        assert_eq!(evaluation.traces_checked, 3);
        assert!(evaluation.counterexamples.is_empty());
    }

    #[test]
    fn exhaustive_ties_are_all_checked() {
        let g = Graph::new(3, [(0, 1, 1), (0, 2, 1), (1, 2, 1)]).unwrap();
        let cfg = BoundConfig {
            tie_break: TieBreakPolicy::Exhaustive,
            ..config(CheckMode::Both)
        };
        let evaluation = evaluate_instance(0, &g, &cfg).unwrap();
        assert!(evaluation.traces_checked > 1);
        assert!(!evaluation.truncated);
        assert!(evaluation.counterexamples.is_empty());
    }

    #[test]
    fn trace_limit_marks_truncation() {
        let g = Graph::new(3, [(0, 1, 1), (0, 1, 1), (0, 2, 1), (0, 2, 1)]).unwrap();
        let cfg = BoundConfig {
            tie_break: TieBreakPolicy::Exhaustive,
            max_traces_per_instance: 2,
            ..config(CheckMode::Both)
        };
        let evaluation = evaluate_instance(0, &g, &cfg).unwrap();
        assert!(evaluation.truncated);
        assert_eq!(evaluation.traces_checked, 2);
    }
}
