use primcheck_engine::pipeline::estimate;
use primcheck_engine::result::REPORT_SCHEMA_VERSION;

use crate::commands::helpers::{bound_config_from_args, parse_output_format, to_pretty_json};
use crate::types::{EstimateArtifact, OutputFormat};
use crate::BoundArgs;

pub(crate) fn run_estimate_command(args: &BoundArgs, format: &str) -> miette::Result<()> {
    let output_format = parse_output_format(format);
    let config = bound_config_from_args(args)?;
    let estimate = estimate(&config).map_err(|e| miette::miette!("{e}"))?;

    match output_format {
        OutputFormat::Json => {
            let artifact = EstimateArtifact {
                schema_version: REPORT_SCHEMA_VERSION,
                config: &config,
                estimate: &estimate,
            };
            println!("{}", to_pretty_json(&artifact)?);
        }
        OutputFormat::Text => {
            println!(
                "Search space for up to {} node(s), {} edge(s), weights 0..={} (mode {}):",
                config.max_nodes,
                config.max_edges,
                config.max_weight(),
                config.mode
            );
            println!("  instances:         {}", estimate.instances);
            println!("  engine runs:       {}", estimate.runs);
            println!("  candidate subsets: {}", estimate.candidate_subsets);
            println!("  work units:        {} (budget {})", estimate.work, estimate.budget);
            println!(
                "  feasible:          {}",
                if estimate.feasible { "yes" } else { "no" }
            );
        }
    }
    Ok(())
}
