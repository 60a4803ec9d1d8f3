use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::graph::{EdgeId, Graph, NodeId};
use crate::sets::{write_ids, EdgeSet, NodeSet};

/// Snapshot of the growing tree at one time step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    /// Position of this step in the trace (`t0` is 0).
    pub time: usize,
    pub covered: NodeSet,
    pub chosen: EdgeSet,
    /// The edge selected to reach this step; `None` only at `t0`.
    pub added: Option<EdgeId>,
}

/// One run of the algorithm on one graph instance: `t0, t1, ..., t_last`.
///
/// A trace always holds at least the initial step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    start: NodeId,
    steps: Vec<TraceStep>,
}

/// A violated trace invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceInvariantViolation {
    #[error("start node n{start} is outside the instance ({node_count} nodes)")]
    StartOutOfRange { start: NodeId, node_count: usize },
    #[error("step {position} is labelled t{time}")]
    TimeMismatch { position: usize, time: usize },
    #[error("initial covered set {covered:?} is not exactly the start node n{start}")]
    InitialCovered { start: NodeId, covered: NodeSet },
    #[error("initial chosen set {chosen:?} is not empty")]
    InitialChosen { chosen: EdgeSet },
    #[error("t{time} records no added edge")]
    MissingAddedEdge { time: usize },
    #[error("t{time} adds edge e{edge}, which is not in the instance")]
    UnknownEdge { time: usize, edge: EdgeId },
    #[error("t{time} adds edge e{edge}, which does not cross the covered frontier")]
    NotCutting { time: usize, edge: EdgeId },
    #[error("t{time} does not extend the previous step by exactly the added edge and its endpoints")]
    NotAnExtension { time: usize },
    #[error("terminal step leaves nodes {uncovered:?} uncovered")]
    Incomplete { uncovered: NodeSet },
    #[error("terminal step chose {actual} edges, expected {expected}")]
    WrongEdgeCount { expected: usize, actual: usize },
}

impl Trace {
    /// A trace holding only `t0`: `covered = {start}`, `chosen = ∅`.
    pub fn new(start: NodeId) -> Self {
        Self {
            start,
            steps: vec![TraceStep {
                time: 0,
                covered: NodeSet::singleton(start),
                chosen: EdgeSet::empty(),
                added: None,
            }],
        }
    }

    /// Append the successor reached by choosing `edge`.
    pub fn record(&mut self, edge: EdgeId, covered: NodeSet, chosen: EdgeSet) {
        let time = self.steps.len();
        self.steps.push(TraceStep {
            time,
            covered,
            chosen,
            added: Some(edge),
        });
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn initial(&self) -> &TraceStep {
        &self.steps[0]
    }

    pub fn terminal(&self) -> &TraceStep {
        &self.steps[self.steps.len() - 1]
    }

    /// Number of real transitions (steps after `t0`).
    pub fn real_steps(&self) -> usize {
        self.steps.len() - 1
    }

    /// Edges chosen at `t_last`.
    pub fn chosen(&self) -> EdgeSet {
        self.terminal().chosen
    }

    /// Edges in the order they were chosen.
    pub fn choice_order(&self) -> Vec<EdgeId> {
        self.steps.iter().filter_map(|s| s.added).collect()
    }

    /// `covered` and `chosen` never shrink from one step to the next.
    pub fn is_monotone(&self) -> bool {
        self.steps.windows(2).all(|w| {
            w[0].covered.is_subset(w[1].covered) && w[0].chosen.is_subset(w[1].chosen)
        })
    }

    /// Check the invariants every prefix of a run satisfies: a single-node
    /// start with nothing chosen, and each real step adding one cutting edge
    /// together with its uncovered endpoint.
    pub fn check_well_formed(&self, graph: &Graph) -> Result<(), TraceInvariantViolation> {
        if self.start >= graph.node_count() {
            return Err(TraceInvariantViolation::StartOutOfRange {
                start: self.start,
                node_count: graph.node_count(),
            });
        }
        for (position, step) in self.steps.iter().enumerate() {
            if step.time != position {
                return Err(TraceInvariantViolation::TimeMismatch {
                    position,
                    time: step.time,
                });
            }
        }
        let initial = self.initial();
        if initial.covered != NodeSet::singleton(self.start) {
            return Err(TraceInvariantViolation::InitialCovered {
                start: self.start,
                covered: initial.covered,
            });
        }
        if !initial.chosen.is_empty() {
            return Err(TraceInvariantViolation::InitialChosen {
                chosen: initial.chosen,
            });
        }
        for pair in self.steps.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let time = next.time;
            let edge_id = next
                .added
                .ok_or(TraceInvariantViolation::MissingAddedEdge { time })?;
            let edge = graph
                .edge(edge_id)
                .ok_or(TraceInvariantViolation::UnknownEdge {
                    time,
                    edge: edge_id,
                })?;
            if !edge.crosses(prev.covered) {
                return Err(TraceInvariantViolation::NotCutting {
                    time,
                    edge: edge_id,
                });
            }
            let mut expected_chosen = prev.chosen;
            expected_chosen.insert(edge_id);
            let expected_covered = prev.covered.union(edge.endpoint_set());
            if next.chosen != expected_chosen || next.covered != expected_covered {
                return Err(TraceInvariantViolation::NotAnExtension { time });
            }
        }
        Ok(())
    }

    /// Check the well-formedness invariants plus termination: every node
    /// covered and exactly `|Node| - 1` edges chosen.
    pub fn check_complete(&self, graph: &Graph) -> Result<(), TraceInvariantViolation> {
        self.check_well_formed(graph)?;
        let terminal = self.terminal();
        let uncovered = graph.nodes().difference(terminal.covered);
        if !uncovered.is_empty() {
            return Err(TraceInvariantViolation::Incomplete { uncovered });
        }
        let expected = graph.node_count().saturating_sub(1);
        if terminal.chosen.len() != expected {
            return Err(TraceInvariantViolation::WrongEdgeCount {
                expected,
                actual: terminal.chosen.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trace from n{} ({} real step(s)):", self.start, self.real_steps())?;
        for step in &self.steps {
            write!(f, "    t{}: ", step.time)?;
            match step.added {
                Some(edge) => write!(f, "choose e{edge}; ")?,
                None => write!(f, "start; ")?,
            }
            write!(f, "covered = ")?;
            write_ids(f, "n", step.covered.iter())?;
            write!(f, ", chosen = ")?;
            write_ids(f, "e", step.chosen.iter())?;
            writeln!(f)?;
        }
        Ok(())
    }
}
