use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use primcheck_ir::sets::{EdgeSet, NodeSet};
use primcheck_ir::trace::TraceInvariantViolation;

use crate::counterexample::Counterexample;
use crate::pipeline::{BoundConfig, SearchSpaceEstimate};
use crate::properties::SpanningTreeViolation;

/// JSON schema version for verification and estimate reports.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Which correctness property a counterexample refutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// The run reaches a terminal state on every connected instance.
    Termination,
    SpanningTree,
    Optimality,
    /// The run's snapshots respect the trace invariants.
    TraceInvariant,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PropertyKind::Termination => "termination",
            PropertyKind::SpanningTree => "spanning_tree",
            PropertyKind::Optimality => "optimality",
            PropertyKind::TraceInvariant => "trace_invariant",
        })
    }
}

/// The concrete way a property failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// No cutting edge remained on a connected instance.
    Stuck { uncovered: NodeSet },
    NotSpanning { reason: SpanningTreeViolation },
    Cheaper {
        chosen_weight: i128,
        witness: EdgeSet,
        witness_weight: i128,
    },
    MalformedTrace { reason: TraceInvariantViolation },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Stuck { uncovered } => {
                write!(f, "run stuck on a connected instance with {uncovered:?} uncovered")
            }
            Violation::NotSpanning { reason } => write!(f, "chosen edges are not a spanning tree: {reason}"),
            Violation::Cheaper {
                chosen_weight,
                witness,
                witness_weight,
            } => write!(
                f,
                "chosen edges weigh {chosen_weight} but spanning tree {witness:?} weighs {witness_weight}"
            ),
            Violation::MalformedTrace { reason } => write!(f, "trace invariant violated: {reason}"),
        }
    }
}

/// How one enumerated instance was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceOutcome {
    /// Every run terminated and was checked against the properties.
    Checked,
    /// Disconnected: some run had no cutting edge before covering all nodes.
    Stuck,
    /// Zero nodes, so there is no start node and no trace.
    Vacuous,
}

/// Why a run stopped before the whole bounded space was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    Timeout { timeout_secs: u64 },
    InstanceCap { max_instances: u64 },
    /// Exhaustive tie exploration hit `max_traces_per_instance`.
    TraceLimit { instances: u64, max_traces_per_instance: usize },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "run cancelled"),
            StopReason::Timeout { timeout_secs } => {
                write!(f, "wall-clock limit of {timeout_secs}s reached")
            }
            StopReason::InstanceCap { max_instances } => {
                write!(f, "instance cap of {max_instances} reached")
            }
            StopReason::TraceLimit {
                instances,
                max_traces_per_instance,
            } => write!(
                f,
                "{instances} instance(s) had more than {max_traces_per_instance} tie-break traces"
            ),
        }
    }
}

/// Overall outcome of a bounded verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Verdict {
    /// The whole bounded space was evaluated without a counterexample.
    Pass,
    Fail,
    Inconclusive { reason: StopReason },
}

impl Verdict {
    /// Stable machine-readable verdict label.
    pub fn verdict_class(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Inconclusive { .. } => "inconclusive",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "RESULT: PASS"),
            Verdict::Fail => write!(f, "RESULT: FAIL"),
            Verdict::Inconclusive { reason } => write!(f, "RESULT: INCONCLUSIVE ({reason})"),
        }
    }
}

/// Counts for instances of one node count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SizeStats {
    pub instances: u64,
    pub checked: u64,
    pub stuck: u64,
    pub vacuous: u64,
    pub counterexamples: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Candidates drawn from the enumerator, ill-formed ones included.
    pub instances_enumerated: u64,
    pub instances_evaluated: u64,
    pub checked: u64,
    pub stuck: u64,
    pub vacuous: u64,
    pub ill_formed: u64,
    pub traces_checked: u64,
    /// Instances whose tie exploration stopped at the trace limit.
    pub truncated_instances: u64,
    pub edge_subsets_examined: u64,
    /// Breakdown keyed by node count, in ascending order.
    pub by_node_count: IndexMap<usize, SizeStats>,
}

impl RunStats {
    pub(crate) fn record(&mut self, node_count: usize, outcome: InstanceOutcome, counterexamples: usize) {
        self.instances_evaluated += 1;
        let size = self.by_node_count.entry(node_count).or_default();
        size.instances += 1;
        size.counterexamples += counterexamples as u64;
        match outcome {
            InstanceOutcome::Checked => {
                self.checked += 1;
                size.checked += 1;
            }
            InstanceOutcome::Stuck => {
                self.stuck += 1;
                size.stuck += 1;
            }
            InstanceOutcome::Vacuous => {
                self.vacuous += 1;
                size.vacuous += 1;
            }
        }
    }
}

/// Everything a bounded verification run produced.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub schema_version: u32,
    pub verdict: Verdict,
    pub config: BoundConfig,
    pub estimate: SearchSpaceEstimate,
    pub stats: RunStats,
    /// In enumeration order. With fail-fast, only the first failing instance.
    pub counterexamples: Vec<Counterexample>,
    pub elapsed_ms: u64,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.verdict)?;
        let config = &self.config;
        writeln!(
            f,
            "Scope: up to {} node(s), {} edge(s), weights 0..={} ({}-bit), mode {}.",
            config.max_nodes,
            config.max_edges,
            config.max_weight(),
            config.weight_bit_width,
            config.mode
        )?;
        let stats = &self.stats;
        writeln!(
            f,
            "Instances: {} enumerated, {} evaluated ({} checked, {} stuck, {} vacuous), {} ill-formed.",
            stats.instances_enumerated,
            stats.instances_evaluated,
            stats.checked,
            stats.stuck,
            stats.vacuous,
            stats.ill_formed
        )?;
        writeln!(
            f,
            "Traces checked: {}; edge subsets examined: {}; elapsed: {} ms.",
            stats.traces_checked, stats.edge_subsets_examined, self.elapsed_ms
        )?;
        for (nodes, size) in &stats.by_node_count {
            writeln!(
                f,
                "  {nodes} node(s): {} instance(s), {} checked, {} stuck, {} vacuous",
                size.instances, size.checked, size.stuck, size.vacuous
            )?;
        }
        for counterexample in &self.counterexamples {
            writeln!(f)?;
            write!(f, "{counterexample}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_class_depends_only_on_variant() {
        assert_eq!(Verdict::Pass.verdict_class(), "pass");
        assert_eq!(Verdict::Fail.verdict_class(), "fail");
        let inconclusive = Verdict::Inconclusive {
            reason: StopReason::Timeout { timeout_secs: 3 },
        };
        assert_eq!(inconclusive.verdict_class(), "inconclusive");
        assert_eq!(
            inconclusive.to_string(),
            "RESULT: INCONCLUSIVE (wall-clock limit of 3s reached)"
        );
    }

    #[test]
    fn verdict_serializes_with_class_tag() {
        let json = serde_json::to_value(Verdict::Inconclusive {
            reason: StopReason::InstanceCap { max_instances: 9 },
        })
        .unwrap();
        assert_eq!(json["class"], "inconclusive");
        assert_eq!(json["reason"]["kind"], "instance_cap");
        assert_eq!(json["reason"]["max_instances"], 9);
    }

    #[test]
    fn stats_breakdown_tracks_outcomes_per_node_count() {
        let mut stats = RunStats::default();
        stats.record(2, InstanceOutcome::Checked, 0);
        stats.record(2, InstanceOutcome::Stuck, 0);
        stats.record(0, InstanceOutcome::Vacuous, 0);
        assert_eq!(stats.instances_evaluated, 3);
        assert_eq!((stats.checked, stats.stuck, stats.vacuous), (1, 1, 1));
        assert_eq!(stats.by_node_count[&2].instances, 2);
        assert_eq!(stats.by_node_count[&0].vacuous, 1);
    }
}
