//! Parallel enumeration driver.
//!
//! Instances are drawn from the enumerator in batches and evaluated on a
//! rayon pool. Results are folded back in enumeration order, so statistics
//! and the reported counterexample do not depend on the thread count.

use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use primcheck_ir::graph::{Graph, GraphError};
use primcheck_ir::instance_space::{Candidate, InstanceSpace};

use crate::result::{RunStats, StopReason, Verdict, VerificationReport, REPORT_SCHEMA_VERSION};
use crate::transition::TransitionError;

use super::timeout::{deadline_exceeded, deadline_from_timeout_secs, elapsed_millis};
use super::*;

/// Instances per worker thread in one batch when `batch_size` is 0.
const INSTANCES_PER_THREAD: usize = 256;

/// Per-instance evaluation entry point used by the worker pool.
pub(crate) type Evaluator =
    fn(u64, &Graph, &BoundConfig) -> Result<InstanceEvaluation, TransitionError>;

enum Slot {
    IllFormed { index: u64, error: GraphError },
    Failed { index: u64, error: TransitionError },
    /// Not evaluated: cancelled, past the deadline, or past the first
    /// failure under fail-fast.
    Skipped,
    Evaluated {
        node_count: usize,
        evaluation: InstanceEvaluation,
    },
}

/// Drives a bounded verification run for one configuration.
#[derive(Clone)]
pub struct BoundedVerifier {
    config: BoundConfig,
    cancel: Arc<AtomicBool>,
    evaluator: Evaluator,
}

impl fmt::Debug for BoundedVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedVerifier")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl BoundedVerifier {
    pub fn new(config: BoundConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            evaluator: evaluate_instance,
        }
    }

    /// Share `cancel` with the caller; setting it stops the run before the
    /// next instance is picked up.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the per-instance evaluation.
    pub(crate) fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &BoundConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn interruption(&self) -> StopReason {
        if self.cancelled() {
            StopReason::Cancelled
        } else {
            StopReason::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        }
    }

    fn evaluate_candidate(
        &self,
        candidate: &Candidate,
        deadline: Option<Instant>,
        first_failure: &AtomicU64,
    ) -> Slot {
        let graph = match &candidate.graph {
            Ok(graph) => graph,
            Err(error) => {
                return Slot::IllFormed {
                    index: candidate.index,
                    error: error.clone(),
                }
            }
        };
        if self.cancelled()
            || deadline_exceeded(deadline)
            || (self.config.fail_fast && candidate.index > first_failure.load(Ordering::Acquire))
        {
            return Slot::Skipped;
        }
        let evaluation = match (self.evaluator)(candidate.index, graph, &self.config) {
            Ok(evaluation) => evaluation,
            Err(error) => {
                return Slot::Failed {
                    index: candidate.index,
                    error,
                }
            }
        };
        if self.config.fail_fast && !evaluation.counterexamples.is_empty() {
            first_failure.fetch_min(candidate.index, Ordering::AcqRel);
        }
        Slot::Evaluated {
            node_count: graph.node_count(),
            evaluation,
        }
    }

    /// Enumerate and evaluate every instance within the bounds.
    pub fn run(&self) -> Result<VerificationReport, VerifyError> {
        let started = Instant::now();
        let config = &self.config;
        let estimate = preflight(config)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| VerifyError::ThreadPool(e.to_string()))?;
        let batch_size = match config.batch_size {
            0 => pool.current_num_threads().max(1) * INSTANCES_PER_THREAD,
            n => n,
        };
        info!(
            threads = pool.current_num_threads(),
            batch_size,
            mode = %config.mode,
            fail_fast = config.fail_fast,
            "starting bounded verification"
        );

        let deadline = deadline_from_timeout_secs(config.timeout_secs);
        let space = InstanceSpace::new(config.bounds(), config.symmetry);
        let mut instances = space.iter();
        let first_failure = AtomicU64::new(u64::MAX);
        let mut stats = RunStats::default();
        let mut counterexamples = Vec::new();
        let mut stop: Option<StopReason> = None;
        let mut halted = false;
        let mut current_nodes: Option<usize> = None;

        while !halted && stop.is_none() {
            if self.cancelled() || deadline_exceeded(deadline) {
                stop = Some(self.interruption());
                break;
            }
            let take = match config.max_instances {
                Some(cap) => {
                    let left = cap.saturating_sub(stats.instances_enumerated);
                    if left == 0 {
                        if instances.next().is_some() {
                            stop = Some(StopReason::InstanceCap { max_instances: cap });
                        }
                        break;
                    }
                    batch_size.min(usize::try_from(left).unwrap_or(usize::MAX))
                }
                None => batch_size,
            };
            let batch: Vec<Candidate> = instances.by_ref().take(take).collect();
            if batch.is_empty() {
                break;
            }
            let slots: Vec<Slot> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|candidate| self.evaluate_candidate(candidate, deadline, &first_failure))
                    .collect()
            });

            for slot in slots {
                match slot {
                    Slot::IllFormed { index, error } => {
                        stats.instances_enumerated += 1;
                        stats.ill_formed += 1;
                        warn!(index, %error, "skipping ill-formed instance");
                    }
                    Slot::Failed { index, error } => {
                        return Err(VerifyError::Transition {
                            index,
                            source: error,
                        });
                    }
                    Slot::Skipped => {
                        stop = Some(self.interruption());
                        break;
                    }
                    Slot::Evaluated {
                        node_count,
                        evaluation,
                    } => {
                        stats.instances_enumerated += 1;
                        if current_nodes != Some(node_count) {
                            debug!(nodes = node_count, "evaluating instances");
                            current_nodes = Some(node_count);
                        }
                        stats.traces_checked += evaluation.traces_checked;
                        stats.edge_subsets_examined += evaluation.subsets_examined;
                        if evaluation.truncated {
                            stats.truncated_instances += 1;
                            warn!(
                                limit = config.max_traces_per_instance,
                                "tie exploration truncated"
                            );
                        }
                        stats.record(node_count, evaluation.outcome, evaluation.counterexamples.len());
                        for counterexample in &evaluation.counterexamples {
                            warn!(
                                instance = counterexample.instance_index,
                                property = %counterexample.property,
                                fingerprint = %counterexample.fingerprint,
                                "counterexample found"
                            );
                        }
                        let failed = !evaluation.counterexamples.is_empty();
                        counterexamples.extend(evaluation.counterexamples);
                        if failed && config.fail_fast {
                            halted = true;
                            break;
                        }
                    }
                }
            }
        }

        let verdict = if !counterexamples.is_empty() {
            Verdict::Fail
        } else if let Some(reason) = stop {
            Verdict::Inconclusive { reason }
        } else if stats.truncated_instances > 0 {
            Verdict::Inconclusive {
                reason: StopReason::TraceLimit {
                    instances: stats.truncated_instances,
                    max_traces_per_instance: config.max_traces_per_instance,
                },
            }
        } else {
            Verdict::Pass
        };
        let elapsed_ms = elapsed_millis(started);
        info!(
            verdict = verdict.verdict_class(),
            evaluated = stats.instances_evaluated,
            counterexamples = counterexamples.len(),
            elapsed_ms,
            "bounded verification finished"
        );
        Ok(VerificationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            verdict,
            config: config.clone(),
            estimate,
            stats,
            counterexamples,
            elapsed_ms,
        })
    }
}

/// Run bounded verification for `config` with no external cancellation.
pub fn verify(config: &BoundConfig) -> Result<VerificationReport, VerifyError> {
    BoundedVerifier::new(config.clone()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counterexample::Counterexample;
    use crate::result::{PropertyKind, Violation};
    use crate::transition::run;
    use primcheck_ir::sets::NodeSet;
    use std::sync::OnceLock;

    fn fails_at(index: u64) -> bool {
        index % 5 == 2
    }

    /// Evaluates normally, then reports a termination violation on every
    /// non-empty instance whose index satisfies `fails_at`.
    fn failing_evaluator(
        index: u64,
        graph: &Graph,
        config: &BoundConfig,
    ) -> Result<InstanceEvaluation, TransitionError> {
        let mut evaluation = evaluate_instance(index, graph, config)?;
        if fails_at(index) && graph.node_count() > 0 {
            let trace = run(graph, 0)?.trace().clone();
            evaluation.counterexamples.push(Counterexample::new(
                index,
                PropertyKind::Termination,
                Violation::Stuck {
                    uncovered: NodeSet::empty(),
                },
                graph,
                config.tie_break,
                trace,
            ));
        }
        Ok(evaluation)
    }

    fn halt_handle() -> Arc<AtomicBool> {
        static HALT: OnceLock<Arc<AtomicBool>> = OnceLock::new();
        Arc::clone(HALT.get_or_init(|| Arc::new(AtomicBool::new(false))))
    }

    fn failing_then_cancelling_evaluator(
        index: u64,
        graph: &Graph,
        config: &BoundConfig,
    ) -> Result<InstanceEvaluation, TransitionError> {
        if index == 3 {
            halt_handle().store(true, Ordering::Relaxed);
        }
        failing_evaluator(index, graph, config)
    }

    fn broken_evaluator(
        index: u64,
        graph: &Graph,
        config: &BoundConfig,
    ) -> Result<InstanceEvaluation, TransitionError> {
        if index == 4 {
            return Err(TransitionError::EmptyGraph);
        }
        evaluate_instance(index, graph, config)
    }

    fn failing_indices(report: &VerificationReport) -> Vec<u64> {
        report
            .counterexamples
            .iter()
            .map(|c| c.instance_index)
            .collect()
    }

    fn small() -> BoundConfig {
        BoundConfig {
            threads: 2,
            batch_size: 7,
            ..BoundConfig::with_scope(3, 3, 2)
        }
    }

    #[test]
    fn small_scope_passes_and_counts_every_instance() {
        let config = small();
        let report = verify(&config).unwrap();
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(u128::from(report.stats.instances_enumerated), report.estimate.instances);
        assert_eq!(report.stats.instances_evaluated, report.stats.instances_enumerated);
        assert_eq!(report.stats.ill_formed, 0);
        assert!(report.stats.stuck > 0);
        assert_eq!(report.stats.vacuous, 1);
    }

    #[test]
    fn stats_do_not_depend_on_batching() {
        let a = verify(&small()).unwrap();
        let b = verify(&BoundConfig {
            threads: 1,
            batch_size: 1,
            ..small()
        })
        .unwrap();
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn instance_cap_makes_run_inconclusive() {
        let config = BoundConfig {
            max_instances: Some(5),
            ..small()
        };
        let report = verify(&config).unwrap();
        assert_eq!(report.stats.instances_enumerated, 5);
        assert_eq!(
            report.verdict,
            Verdict::Inconclusive {
                reason: StopReason::InstanceCap { max_instances: 5 }
            }
        );
    }

    #[test]
    fn preset_cancellation_stops_before_any_instance() {
        let verifier = BoundedVerifier::new(small());
        verifier.cancellation_handle().store(true, Ordering::Relaxed);
        let report = verifier.run().unwrap();
        assert_eq!(report.stats.instances_enumerated, 0);
        assert_eq!(
            report.verdict,
            Verdict::Inconclusive {
                reason: StopReason::Cancelled
            }
        );
    }

    #[test]
    fn infeasible_configuration_is_rejected_before_running() {
        let err = verify(&BoundConfig::default()).unwrap_err();
        assert!(matches!(err, VerifyError::Config(ConfigError::Infeasible { .. })));
    }

    #[test]
    fn fail_fast_reports_lowest_failing_instance_for_any_batching() {
        for (threads, batch_size) in [(1, 1), (2, 3), (4, 7), (3, 0)] {
            let config = BoundConfig {
                threads,
                batch_size,
                ..small()
            };
            let report = BoundedVerifier::new(config)
                .with_evaluator(failing_evaluator)
                .run()
                .unwrap();
            assert_eq!(report.verdict, Verdict::Fail, "threads={threads} batch={batch_size}");
            assert_eq!(failing_indices(&report), vec![2]);
            assert_eq!(report.stats.instances_enumerated, 3);
            assert!(!report.passed());
        }
    }

    #[test]
    fn collect_all_reports_every_failure_in_enumeration_order() {
        let config = BoundConfig {
            fail_fast: false,
            ..small()
        };
        let expected: Vec<u64> = InstanceSpace::new(config.bounds(), config.symmetry)
            .iter()
            .filter(|c| fails_at(c.index) && c.graph.as_ref().is_ok_and(|g| g.node_count() > 0))
            .map(|c| c.index)
            .collect();
        assert!(expected.len() > 1);

        let parallel = BoundedVerifier::new(config.clone())
            .with_evaluator(failing_evaluator)
            .run()
            .unwrap();
        let serial = BoundedVerifier::new(BoundConfig {
            threads: 1,
            batch_size: 1,
            ..config
        })
        .with_evaluator(failing_evaluator)
        .run()
        .unwrap();

        assert_eq!(parallel.verdict, Verdict::Fail);
        assert_eq!(failing_indices(&parallel), expected);
        assert_eq!(failing_indices(&serial), expected);
        assert_eq!(parallel.stats, serial.stats);
        assert_eq!(
            u128::from(parallel.stats.instances_enumerated),
            parallel.estimate.instances
        );
    }

    #[test]
    fn cancellation_after_a_failure_still_fails() {
        let config = BoundConfig {
            fail_fast: false,
            threads: 1,
            batch_size: 1,
            ..small()
        };
        let report = BoundedVerifier::new(config)
            .with_cancellation(halt_handle())
            .with_evaluator(failing_then_cancelling_evaluator)
            .run()
            .unwrap();
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(failing_indices(&report), vec![2]);
        assert_eq!(report.stats.instances_enumerated, 4);
    }

    #[test]
    fn failing_report_serializes_counterexamples() {
        let report = BoundedVerifier::new(small())
            .with_evaluator(failing_evaluator)
            .run()
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(json["verdict"]["class"], "fail");
        assert_eq!(json["counterexamples"][0]["instance_index"], 2);
        assert_eq!(json["counterexamples"][0]["property"], "termination");
        assert!(report.counterexamples[0].fingerprint_matches());
    }

    #[test]
    fn evaluation_error_aborts_the_run() {
        let err = BoundedVerifier::new(BoundConfig {
            fail_fast: false,
            ..small()
        })
        .with_evaluator(broken_evaluator)
        .run()
        .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Transition {
                index: 4,
                source: TransitionError::EmptyGraph
            }
        ));
        assert!(err.to_string().contains("#4"));
    }
}
