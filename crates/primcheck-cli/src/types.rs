//! Shared types used across CLI commands.

use serde::Serialize;

use primcheck_engine::pipeline::{BoundConfig, SearchSpaceEstimate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// JSON artifact written by `primcheck estimate`.
#[derive(Serialize)]
pub(crate) struct EstimateArtifact<'a> {
    pub(crate) schema_version: u32,
    pub(crate) config: &'a BoundConfig,
    pub(crate) estimate: &'a SearchSpaceEstimate,
}
