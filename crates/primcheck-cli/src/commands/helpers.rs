//! Flag parsing, configuration loading and artifact output shared by commands.

use miette::{IntoDiagnostic, WrapErr};
use serde::Serialize;
use std::fs;
use std::path::Path;

use primcheck_engine::pipeline::{BoundConfig, CheckMode, StartPolicy, TieBreakPolicy};
use primcheck_ir::instance_space::SymmetryReduction;

use crate::types::OutputFormat;
use crate::BoundArgs;

pub(crate) fn parse_output_format(raw: &str) -> OutputFormat {
    match raw {
        "text" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        other => {
            eprintln!("Unknown output format: {other}. Use 'text' or 'json'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn parse_check_mode(raw: &str) -> CheckMode {
    match raw.trim().to_ascii_lowercase().as_str() {
        "correctness" => CheckMode::Correctness,
        "optimality" => CheckMode::Optimality,
        "both" => CheckMode::Both,
        other => {
            eprintln!("Unknown mode: {other}. Use 'correctness', 'optimality' or 'both'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn parse_start_policy(raw: &str) -> StartPolicy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "first" => StartPolicy::First,
        "every" => StartPolicy::Every,
        other => {
            eprintln!("Unknown start policy: {other}. Use 'first' or 'every'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn parse_tie_break(raw: &str) -> TieBreakPolicy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lowest-id" | "lowest_edge_id" => TieBreakPolicy::LowestEdgeId,
        "exhaustive" => TieBreakPolicy::Exhaustive,
        other => {
            eprintln!("Unknown tie-break policy: {other}. Use 'lowest-id' or 'exhaustive'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn parse_symmetry(raw: &str) -> SymmetryReduction {
    match raw.trim().to_ascii_lowercase().as_str() {
        "edge-permutation" | "edge_permutation" => SymmetryReduction::EdgePermutation,
        "none" => SymmetryReduction::None,
        other => {
            eprintln!("Unknown symmetry reduction: {other}. Use 'edge-permutation' or 'none'.");
            std::process::exit(1);
        }
    }
}

/// Overwrite the fields of `config` whose flags were given.
pub(crate) fn apply_overrides(config: &mut BoundConfig, args: &BoundArgs) {
    if let Some(v) = args.max_nodes {
        config.max_nodes = v;
    }
    if let Some(v) = args.max_edges {
        config.max_edges = v;
    }
    if let Some(v) = args.weight_bits {
        config.weight_bit_width = v;
    }
    if let Some(raw) = &args.mode {
        config.mode = parse_check_mode(raw);
    }
    if let Some(v) = args.fail_fast {
        config.fail_fast = v;
    }
    if let Some(raw) = &args.start {
        config.start = parse_start_policy(raw);
    }
    if let Some(raw) = &args.tie_break {
        config.tie_break = parse_tie_break(raw);
    }
    if let Some(raw) = &args.symmetry {
        config.symmetry = parse_symmetry(raw);
    }
    if let Some(v) = args.threads {
        config.threads = v;
    }
    if let Some(v) = args.batch_size {
        config.batch_size = v;
    }
    if let Some(v) = args.timeout {
        config.timeout_secs = v;
    }
    if let Some(v) = args.max_instances {
        config.max_instances = Some(v);
    }
    if let Some(v) = args.max_traces {
        config.max_traces_per_instance = v;
    }
    if let Some(v) = args.search_budget {
        config.search_budget = v;
    }
}

/// The configuration from `--config` (or the default) with flag overrides.
pub(crate) fn bound_config_from_args(args: &BoundArgs) -> miette::Result<BoundConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read bound configuration {}", path.display()))?;
            serde_json::from_str(&raw)
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid bound configuration {}", path.display()))?
        }
        None => BoundConfig::default(),
    };
    apply_overrides(&mut config, args);
    Ok(config)
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> miette::Result<String> {
    serde_json::to_string_pretty(value).into_diagnostic()
}

pub(crate) fn write_json_artifact<T: Serialize>(path: &Path, value: &T) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, to_pretty_json(value)?).into_diagnostic()?;
    Ok(())
}
