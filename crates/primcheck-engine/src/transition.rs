//! Prim's greedy cut-edge rule as a discrete-time state machine.
//!
//! A state is the pair `(covered, chosen)`. From a non-terminal state the
//! only allowed successor adds a minimum-weight cutting edge and its
//! uncovered endpoint. Once every node is covered the state is a fixed
//! point. A non-terminal state without cutting edges is stuck.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use primcheck_ir::graph::{Edge, EdgeId, Graph, NodeId};
use primcheck_ir::sets::{EdgeSet, NodeSet};
use primcheck_ir::trace::Trace;

/// How the engine picks among several minimum-weight cutting edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Pick the tied edge with the lowest id. Yields exactly one trace.
    #[default]
    LowestEdgeId,
    /// Follow every tied edge. Yields every trace the rule allows.
    Exhaustive,
}

/// Covered nodes and chosen edges at one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrimState {
    pub covered: NodeSet,
    pub chosen: EdgeSet,
}

impl PrimState {
    pub fn initial(start: NodeId) -> Self {
        Self {
            covered: NodeSet::singleton(start),
            chosen: EdgeSet::empty(),
        }
    }

    pub fn is_terminal(&self, graph: &Graph) -> bool {
        self.covered == graph.nodes()
    }

    /// The state reached by choosing `edge`.
    pub fn choose(&self, edge: &Edge) -> Self {
        let mut chosen = self.chosen;
        chosen.insert(edge.id);
        Self {
            covered: self.covered.union(edge.endpoint_set()),
            chosen,
        }
    }
}

/// Outcome of applying the transition rule once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Every node is covered; the state is its own successor.
    Terminal,
    Advance { edge: EdgeId, next: PrimState },
    /// Uncovered nodes remain but no edge crosses the frontier.
    Stuck,
}

/// A finished run of the engine from one start node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Run {
    Complete { trace: Trace },
    Stuck { trace: Trace, uncovered: NodeSet },
}

impl Run {
    pub fn trace(&self) -> &Trace {
        match self {
            Run::Complete { trace } | Run::Stuck { trace, .. } => trace,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Run::Complete { .. })
    }
}

/// All runs reachable under [`TieBreakPolicy::Exhaustive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exploration {
    /// Runs in lowest-edge-id-first order.
    pub runs: Vec<Run>,
    /// Exploration stopped at the run limit before exhausting all choices.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("graph has no nodes, so there is no start node")]
    EmptyGraph,
    #[error("start node n{start} is outside the instance ({node_count} nodes)")]
    UnknownStart { start: NodeId, node_count: usize },
}

fn check_start(graph: &Graph, start: NodeId) -> Result<(), TransitionError> {
    if graph.node_count() == 0 {
        return Err(TransitionError::EmptyGraph);
    }
    if start >= graph.node_count() {
        return Err(TransitionError::UnknownStart {
            start,
            node_count: graph.node_count(),
        });
    }
    Ok(())
}

/// Edges with exactly one endpoint in `covered`.
pub fn cutting_edges(graph: &Graph, covered: NodeSet) -> EdgeSet {
    graph
        .edges()
        .iter()
        .filter(|e| e.crosses(covered))
        .map(|e| e.id)
        .collect()
}

/// Cutting edges whose weight equals the minimum cutting-edge weight.
pub fn minimum_cutting_edges(graph: &Graph, covered: NodeSet) -> EdgeSet {
    let cutting = cutting_edges(graph, covered);
    let Some(min) = graph.edges_in(cutting).map(|e| e.weight).min() else {
        return EdgeSet::empty();
    };
    graph
        .edges_in(cutting)
        .filter(|e| e.weight == min)
        .map(|e| e.id)
        .collect()
}

/// Apply the transition rule once, breaking ties by lowest edge id.
pub fn step(graph: &Graph, state: &PrimState) -> Transition {
    if state.is_terminal(graph) {
        return Transition::Terminal;
    }
    let candidates = minimum_cutting_edges(graph, state.covered);
    match candidates.first().and_then(|id| graph.edge(id)) {
        Some(edge) => Transition::Advance {
            edge: edge.id,
            next: state.choose(edge),
        },
        None => Transition::Stuck,
    }
}

/// Drive the engine from `start` until it is terminal or stuck.
///
/// Each real step covers one new node, so more than `|Node|` applications
/// of the rule without termination is diagnosed as stuck.
pub fn run(graph: &Graph, start: NodeId) -> Result<Run, TransitionError> {
    check_start(graph, start)?;
    let mut state = PrimState::initial(start);
    let mut trace = Trace::new(start);
    for _ in 0..graph.node_count() {
        match step(graph, &state) {
            Transition::Terminal => return Ok(Run::Complete { trace }),
            Transition::Advance { edge, next } => {
                trace.record(edge, next.covered, next.chosen);
                state = next;
            }
            Transition::Stuck => break,
        }
    }
    Ok(Run::Stuck {
        trace,
        uncovered: graph.nodes().difference(state.covered),
    })
}

/// Enumerate every run the rule allows from `start`, following every
/// minimum-weight cutting edge at every step. Stops after `limit` runs.
pub fn run_all(graph: &Graph, start: NodeId, limit: usize) -> Result<Exploration, TransitionError> {
    check_start(graph, start)?;
    let mut runs = Vec::new();
    let mut stack = vec![(PrimState::initial(start), Trace::new(start))];
    while let Some((state, trace)) = stack.pop() {
        if runs.len() >= limit {
            return Ok(Exploration {
                runs,
                truncated: true,
            });
        }
        if state.is_terminal(graph) {
            runs.push(Run::Complete { trace });
            continue;
        }
        let candidates = minimum_cutting_edges(graph, state.covered);
        if candidates.is_empty() || trace.real_steps() >= graph.node_count() {
            runs.push(Run::Stuck {
                trace,
                uncovered: graph.nodes().difference(state.covered),
            });
            continue;
        }
        // Push in descending id order so the lowest id is explored first.
        let mut children: Vec<&Edge> = graph.edges_in(candidates).collect();
        children.reverse();
        for edge in children {
            let next = state.choose(edge);
            let mut extended = trace.clone();
            extended.record(edge.id, next.covered, next.chosen);
            stack.push((next, extended));
        }
    }
    Ok(Exploration {
        runs,
        truncated: false,
    })
}

/// Run the engine under `policy`, returning every resulting run.
pub fn explore(
    graph: &Graph,
    start: NodeId,
    policy: TieBreakPolicy,
    limit: usize,
) -> Result<Exploration, TransitionError> {
    match policy {
        TieBreakPolicy::LowestEdgeId => Ok(Exploration {
            runs: vec![run(graph, start)?],
            truncated: false,
        }),
        TieBreakPolicy::Exhaustive => run_all(graph, start, limit),
    }
}
