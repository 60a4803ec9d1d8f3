//! Counterexample construction, fingerprinting and replay.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use primcheck_ir::graph::{Graph, NodeId};
use primcheck_ir::trace::Trace;

use crate::result::{PropertyKind, Violation};
use crate::transition::{minimum_cutting_edges, PrimState, TieBreakPolicy};

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// A graph instance and run that refute a correctness property, with
/// everything needed to reproduce the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counterexample {
    /// Position of the instance in the enumeration.
    pub instance_index: u64,
    pub property: PropertyKind,
    pub violation: Violation,
    pub graph: Graph,
    pub start: NodeId,
    pub tie_break: TieBreakPolicy,
    pub trace: Trace,
    /// SHA-256 over the JSON of every other field.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
}

impl Counterexample {
    pub fn new(
        instance_index: u64,
        property: PropertyKind,
        violation: Violation,
        graph: &Graph,
        tie_break: TieBreakPolicy,
        trace: Trace,
    ) -> Self {
        let mut counterexample = Self {
            instance_index,
            property,
            violation,
            graph: graph.clone(),
            start: trace.start(),
            tie_break,
            trace,
            fingerprint: String::new(),
        };
        counterexample.fingerprint = counterexample.compute_fingerprint();
        counterexample
    }

    fn compute_fingerprint(&self) -> String {
        let unsealed = Self {
            fingerprint: String::new(),
            ..self.clone()
        };
        let bytes =
            serde_json::to_vec(&unsealed).unwrap_or_else(|_| format!("{unsealed:?}").into_bytes());
        sha256_hex_bytes(&bytes)
    }

    /// Whether the stored fingerprint matches the content.
    pub fn fingerprint_matches(&self) -> bool {
        self.fingerprint == self.compute_fingerprint()
    }

    /// Re-run the transition rule along the recorded choices and confirm the
    /// engine reproduces the stored trace.
    ///
    /// Under [`TieBreakPolicy::LowestEdgeId`] every choice must be the
    /// lowest-id minimum cutting edge; under [`TieBreakPolicy::Exhaustive`]
    /// any minimum cutting edge is accepted. The replayed run must also end
    /// where the stored one does, with no cutting edge left.
    pub fn replay(&self) -> bool {
        if self.start >= self.graph.node_count() || self.trace.start() != self.start {
            return false;
        }
        let mut state = PrimState::initial(self.start);
        let mut replayed = Trace::new(self.start);
        for id in self.trace.choice_order() {
            let candidates = minimum_cutting_edges(&self.graph, state.covered);
            let allowed = match self.tie_break {
                TieBreakPolicy::LowestEdgeId => candidates.first() == Some(id),
                TieBreakPolicy::Exhaustive => candidates.contains(id),
            };
            let Some(edge) = self.graph.edge(id).filter(|_| allowed) else {
                return false;
            };
            state = state.choose(edge);
            replayed.record(id, state.covered, state.chosen);
        }
        replayed == self.trace && minimum_cutting_edges(&self.graph, state.covered).is_empty()
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "COUNTEREXAMPLE to {} (instance #{}, start n{}):",
            self.property, self.instance_index, self.start
        )?;
        writeln!(f, "  {}", self.violation)?;
        write!(f, "{}", self.graph)?;
        write!(f, "{}", self.trace)?;
        if !self.fingerprint.is_empty() {
            writeln!(f, "fingerprint: {}", self.fingerprint)?;
        }
        Ok(())
    }
}
