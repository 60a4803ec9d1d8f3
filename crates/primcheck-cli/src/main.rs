#![doc = include_str!("../README.md")]

mod commands;
mod types;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const CLI_LONG_ABOUT: &str =
    "Bounded exhaustive verification of Prim's minimum-spanning-tree algorithm.\n\n\
    Every graph within the node, edge and weight bounds is enumerated, Prim's\n\
    greedy cut-edge rule is run on it, and the result is checked to be a\n\
    spanning tree of minimum total weight.\n\n\
    Typical use:\n  \
    1. primcheck estimate --max-nodes 4 --max-edges 6 --weight-bits 3\n  \
    2. primcheck verify --max-nodes 4 --max-edges 6 --weight-bits 3\n\n\
    The default scope (5 nodes, 10 edges, 5-bit weights) exceeds the default\n\
    search budget; reduce the bounds or raise --search-budget.";

#[derive(Parser)]
#[command(name = "primcheck", version, about = "Bounded verification of Prim's MST algorithm", long_about = CLI_LONG_ABOUT)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Bound configuration flags shared by every command. Unset flags keep the
/// value from `--config`, or the default.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BoundArgs {
    /// JSON bound configuration to start from
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Maximum node count
    #[arg(long)]
    pub(crate) max_nodes: Option<usize>,

    /// Maximum edge count
    #[arg(long)]
    pub(crate) max_edges: Option<usize>,

    /// Signed weight bit width; weights range over 0..=2^(bits-1)-1
    #[arg(long)]
    pub(crate) weight_bits: Option<u32>,

    /// Properties to check: correctness | optimality | both
    #[arg(long)]
    pub(crate) mode: Option<String>,

    /// Stop at the first counterexample: true | false
    #[arg(long)]
    pub(crate) fail_fast: Option<bool>,

    /// Start nodes: first | every
    #[arg(long)]
    pub(crate) start: Option<String>,

    /// Tie-break among minimum cutting edges: lowest-id | exhaustive
    #[arg(long)]
    pub(crate) tie_break: Option<String>,

    /// Symmetry reduction: edge-permutation | none
    #[arg(long)]
    pub(crate) symmetry: Option<String>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub(crate) threads: Option<usize>,

    /// Instances per worker batch (0 = 256 per thread)
    #[arg(long)]
    pub(crate) batch_size: Option<usize>,

    /// Wall-clock limit in seconds (0 disables)
    #[arg(long)]
    pub(crate) timeout: Option<u64>,

    /// Stop after this many enumerated instances
    #[arg(long)]
    pub(crate) max_instances: Option<u64>,

    /// Trace limit per start node with exhaustive tie-breaking
    #[arg(long)]
    pub(crate) max_traces: Option<usize>,

    /// Largest estimated work a run may start with
    #[arg(long)]
    pub(crate) search_budget: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate every instance within the bounds and check each run
    Verify {
        #[command(flatten)]
        bounds: BoundArgs,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,

        /// Also write the JSON report to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Estimate the search space of a configuration without running it
    Estimate {
        #[command(flatten)]
        bounds: BoundArgs,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Verify {
            bounds,
            format,
            out,
        } => commands::verify::run_verify_command(&bounds, &format, out),
        Commands::Estimate { bounds, format } => {
            commands::estimate::run_estimate_command(&bounds, &format)
        }
    }
}
