use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use primcheck_engine::pipeline::verify;
use primcheck_engine::result::Verdict;

use crate::commands::helpers::{
    bound_config_from_args, parse_output_format, to_pretty_json, write_json_artifact,
};
use crate::types::OutputFormat;
use crate::BoundArgs;

/// Process exit code for a verdict: 0 pass, 1 fail, 2 inconclusive.
pub(crate) fn verdict_exit_code(verdict: &Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 1,
        Verdict::Inconclusive { .. } => 2,
    }
}

pub(crate) fn run_verify_command(
    args: &BoundArgs,
    format: &str,
    out: Option<PathBuf>,
) -> miette::Result<()> {
    let output_format = parse_output_format(format);
    let config = bound_config_from_args(args)?;
    let report = verify(&config).map_err(|e| miette::miette!("{e}"))?;

    if let Some(path) = &out {
        write_json_artifact(path, &report)?;
        info!("Report written to {}", path.display());
    }
    match output_format {
        OutputFormat::Json => println!("{}", to_pretty_json(&report)?),
        OutputFormat::Text => print!("{report}"),
    }

    let code = verdict_exit_code(&report.verdict);
    if code != 0 {
        let _ = std::io::stdout().flush();
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use primcheck_engine::counterexample::Counterexample;
    use primcheck_engine::pipeline::{estimate, BoundConfig};
    use primcheck_engine::result::{
        PropertyKind, RunStats, StopReason, VerificationReport, Violation, REPORT_SCHEMA_VERSION,
    };
    use primcheck_engine::transition::run;
    use primcheck_ir::graph::Graph;
    use primcheck_ir::sets::NodeSet;

    #[test]
    fn exit_codes_follow_verdict() {
        assert_eq!(verdict_exit_code(&Verdict::Pass), 0);
        assert_eq!(verdict_exit_code(&Verdict::Fail), 1);
        assert_eq!(
            verdict_exit_code(&Verdict::Inconclusive {
                reason: StopReason::Cancelled
            }),
            2
        );
    }

    #[test]
    fn failing_report_exits_one_and_lists_counterexamples() {
        let config = BoundConfig::with_scope(2, 1, 2);
        let graph = Graph::new(2, []).unwrap();
        let trace = run(&graph, 0).unwrap().trace().clone();
        let counterexample = Counterexample::new(
            2,
            PropertyKind::Termination,
            Violation::Stuck {
                uncovered: NodeSet::singleton(1),
            },
            &graph,
            config.tie_break,
            trace,
        );
        let report = VerificationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            verdict: Verdict::Fail,
            estimate: estimate(&config).unwrap(),
            config,
            stats: RunStats::default(),
            counterexamples: vec![counterexample],
            elapsed_ms: 0,
        };
        assert_eq!(verdict_exit_code(&report.verdict), 1);

        let json: serde_json::Value =
            serde_json::from_str(&to_pretty_json(&report).unwrap()).unwrap();
        assert_eq!(json["schema_version"], REPORT_SCHEMA_VERSION);
        assert_eq!(json["verdict"]["class"], "fail");
        assert_eq!(json["counterexamples"][0]["instance_index"], 2);
        assert_eq!(json["counterexamples"][0]["property"], "termination");
        assert!(report.to_string().contains("COUNTEREXAMPLE to termination"));
    }
}
