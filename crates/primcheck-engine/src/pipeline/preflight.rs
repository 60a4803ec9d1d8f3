//! Configuration validation and search-space estimation.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use primcheck_ir::graph::{MAX_EDGES, MAX_NODES};
use primcheck_ir::instance_space::{binomial, InstanceSpace};

use super::*;

/// Widest weight bit width accepted; keeps every weight inside `i64`.
pub const MAX_WEIGHT_BIT_WIDTH: u32 = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_nodes = {requested} exceeds the supported maximum of {max}")]
    TooManyNodes { requested: usize, max: usize },
    #[error("max_edges = {requested} exceeds the supported maximum of {max}")]
    TooManyEdges { requested: usize, max: usize },
    #[error("weight_bit_width = {bits} is outside 1..={max}")]
    WeightBitWidth { bits: u32, max: u32 },
    #[error("max_traces_per_instance must be at least 1 with exhaustive tie-breaking")]
    ZeroTraceLimit,
    #[error(
        "search space too large: estimated {work} work units over {instances} instances \
         exceeds the budget of {budget}; reduce the bounds or raise search_budget"
    )]
    Infeasible {
        work: u128,
        instances: u128,
        budget: u64,
    },
}

/// Size of the work a configuration implies, computed from the bounds alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSpaceEstimate {
    /// Candidate instances the enumerator will produce.
    pub instances: u128,
    /// Engine runs: one per instance and start node. Exhaustive
    /// tie-breaking may add runs, up to `max_traces_per_instance` each.
    pub runs: u128,
    /// Edge subsets inspected by the optimality search, at most.
    pub candidate_subsets: u128,
    /// `Σ instances × starts × (1 + candidate subsets)`.
    pub work: u128,
    pub budget: u64,
    pub feasible: bool,
}

pub(super) fn validate(config: &BoundConfig) -> Result<(), ConfigError> {
    if config.max_nodes > MAX_NODES {
        return Err(ConfigError::TooManyNodes {
            requested: config.max_nodes,
            max: MAX_NODES,
        });
    }
    if config.max_edges > MAX_EDGES {
        return Err(ConfigError::TooManyEdges {
            requested: config.max_edges,
            max: MAX_EDGES,
        });
    }
    if !(1..=MAX_WEIGHT_BIT_WIDTH).contains(&config.weight_bit_width) {
        return Err(ConfigError::WeightBitWidth {
            bits: config.weight_bit_width,
            max: MAX_WEIGHT_BIT_WIDTH,
        });
    }
    if config.tie_break == TieBreakPolicy::Exhaustive && config.max_traces_per_instance == 0 {
        return Err(ConfigError::ZeroTraceLimit);
    }
    Ok(())
}

/// Validate `config` and estimate the size of its search space.
pub fn estimate(config: &BoundConfig) -> Result<SearchSpaceEstimate, ConfigError> {
    validate(config)?;
    let space = InstanceSpace::new(config.bounds(), config.symmetry);
    let mut instances: u128 = 0;
    let mut runs: u128 = 0;
    let mut candidate_subsets: u128 = 0;
    let mut work: u128 = 0;
    for (nodes, edges) in space.sizes() {
        let count = space.count_for(nodes, edges);
        let starts: u128 = match (nodes, config.start) {
            (0, _) => 0,
            (_, StartPolicy::First) => 1,
            (n, StartPolicy::Every) => n as u128,
        };
        let subsets = if config.mode.checks_optimality() && nodes > 0 {
            binomial(edges as u128, nodes as u128 - 1)
        } else {
            0
        };
        let size_runs = count.saturating_mul(starts);
        instances = instances.saturating_add(count);
        runs = runs.saturating_add(size_runs);
        candidate_subsets = candidate_subsets.saturating_add(size_runs.saturating_mul(subsets));
        work = work.saturating_add(size_runs.saturating_mul(subsets.saturating_add(1)));
    }
    Ok(SearchSpaceEstimate {
        instances,
        runs,
        candidate_subsets,
        work,
        budget: config.search_budget,
        feasible: work <= u128::from(config.search_budget),
    })
}

/// Estimate the search space and reject configurations over budget before
/// any instance is evaluated.
pub fn preflight(config: &BoundConfig) -> Result<SearchSpaceEstimate, ConfigError> {
    let estimate = estimate(config)?;
    info!(
        instances = %estimate.instances,
        runs = %estimate.runs,
        work = %estimate.work,
        budget = estimate.budget,
        "search space estimated"
    );
    if !estimate.feasible {
        return Err(ConfigError::Infeasible {
            work: estimate.work,
            instances: estimate.instances,
            budget: estimate.budget,
        });
    }
    Ok(estimate)
}
