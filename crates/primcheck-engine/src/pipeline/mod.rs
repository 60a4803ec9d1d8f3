//! Bounded verification pipeline: run configuration, the feasibility
//! preflight, per-instance evaluation and the parallel enumeration driver.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use primcheck_ir::graph::max_weight_for_bit_width;
use primcheck_ir::instance_space::{InstanceBounds, SymmetryReduction};

pub use crate::transition::TieBreakPolicy;

mod evaluate;
mod orchestration;
mod preflight;
mod timeout;

pub use evaluate::{evaluate_instance, InstanceEvaluation};
pub use orchestration::{verify, BoundedVerifier};
pub use preflight::{estimate, preflight, ConfigError, SearchSpaceEstimate};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Worker pool error: {0}")]
    ThreadPool(String),
    #[error("Instance #{index} could not be evaluated: {source}")]
    Transition {
        index: u64,
        source: crate::transition::TransitionError,
    },
}

/// Which correctness properties are checked against each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// The final chosen edges form a spanning tree.
    Correctness,
    /// The final chosen edges form a minimum spanning tree.
    Optimality,
    #[default]
    Both,
}

impl CheckMode {
    pub fn checks_spanning_tree(self) -> bool {
        matches!(self, CheckMode::Correctness | CheckMode::Both)
    }

    pub fn checks_optimality(self) -> bool {
        matches!(self, CheckMode::Optimality | CheckMode::Both)
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckMode::Correctness => "correctness",
            CheckMode::Optimality => "optimality",
            CheckMode::Both => "both",
        })
    }
}

/// Which start nodes the engine is run from on each instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Node 0 only.
    #[default]
    First,
    Every,
}

/// Default cap on the work units a run may perform.
pub const DEFAULT_SEARCH_BUDGET: u64 = 2_000_000_000;

/// Options for a bounded verification run.
///
/// Missing fields take their [`Default`] value, which is the reference
/// scope of 5 nodes, 10 edges and 5-bit weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundConfig {
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Weights range over the non-negative half of this signed width.
    pub weight_bit_width: u32,
    pub mode: CheckMode,
    /// Stop at the first instance with a counterexample.
    pub fail_fast: bool,
    pub start: StartPolicy,
    pub tie_break: TieBreakPolicy,
    pub symmetry: SymmetryReduction,
    /// Worker threads; 0 uses one per available core.
    pub threads: usize,
    /// Instances handed to the worker pool at a time; 0 picks 256 per thread.
    pub batch_size: usize,
    /// Wall-clock limit in seconds; 0 disables it.
    pub timeout_secs: u64,
    pub max_instances: Option<u64>,
    /// Run limit per start node under exhaustive tie-breaking.
    pub max_traces_per_instance: usize,
    /// Largest estimated work a run may start with.
    pub search_budget: u64,
}

impl Default for BoundConfig {
    fn default() -> Self {
        Self {
            max_nodes: 5,
            max_edges: 10,
            weight_bit_width: 5,
            mode: CheckMode::Both,
            fail_fast: true,
            start: StartPolicy::First,
            tie_break: TieBreakPolicy::LowestEdgeId,
            symmetry: SymmetryReduction::EdgePermutation,
            threads: 0,
            batch_size: 0,
            timeout_secs: 0,
            max_instances: None,
            max_traces_per_instance: 64,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl BoundConfig {
    /// A configuration for `nodes`, `edges` and `bits` with every other
    /// option at its default.
    pub fn with_scope(nodes: usize, edges: usize, bits: u32) -> Self {
        Self {
            max_nodes: nodes,
            max_edges: edges,
            weight_bit_width: bits,
            ..Self::default()
        }
    }

    pub fn max_weight(&self) -> i64 {
        max_weight_for_bit_width(self.weight_bit_width)
    }

    pub fn bounds(&self) -> InstanceBounds {
        InstanceBounds {
            max_nodes: self.max_nodes,
            max_edges: self.max_edges,
            max_weight: self.max_weight(),
        }
    }

    /// Reject structurally invalid options. Feasibility is checked
    /// separately by [`preflight`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        preflight::validate(self)
    }
}
