//! formalizer CLI - demonstration front-end for the task-graph scheduling
//! core.
//!
//! The real front-ends translate command-line arguments into
//! modification requests against a server-resident Graph loaded from a
//! persistent store; neither the store nor the server are part of this
//! repository. This binary is a thin harness exercising the scheduling
//! core's public API directly, using a `clap`-derive `Cli`/`Commands`
//! shape and `tracing_subscriber` initialization.

mod commands;
mod diagnostics;
mod scenarios;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "formalizer")]
#[command(author, version, about = "Task-graph scheduling core demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and apply a single ADD_NODE request against a fresh Graph.
    AddNode {
        /// Node description text.
        #[arg(short, long)]
        desc: String,

        /// Topic tag to register and attach (every Node needs >= 1).
        #[arg(short, long, default_value = "general")]
        topic: String,

        /// Estimated effort, in hours.
        #[arg(short, long, default_value_t = 1.0)]
        effort_hours: f64,

        /// Target-date property: unspecified, inherit, variable, fixed, exact.
        #[arg(short, long, default_value = "variable")]
        property: String,

        /// Repetition pattern (required if --repeats is set): daily,
        /// workdays, weekly, biweekly, monthly, endofmonthoffset, yearly, span.
        #[arg(long)]
        pattern: Option<String>,

        /// Repeat every N periods.
        #[arg(long, default_value_t = 1)]
        every: u32,

        /// Repeat instances remaining; 0 = unlimited.
        #[arg(long, default_value_t = 0)]
        span: u32,

        /// Mark the Node as repeating (requires --pattern and a
        /// fixed/exact/inherit --property).
        #[arg(long)]
        repeats: bool,

        /// Output format: text, json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Demonstrate ADD_EDGE and inherit-TD resolution over a small
    /// dependency chain (a fixed-TD root, an inherit-TD leaf).
    AddEdge {
        /// Edge "dependency" scalar in [0, 1].
        #[arg(long, default_value_t = 0.5)]
        dependency: f64,

        /// Edge "significance" scalar in [0, 1].
        #[arg(long, default_value_t = 0.5)]
        significance: f64,

        /// Output format: text, json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run the three-pass EPS target-date scheduler over one of the
    /// worked scenarios.
    EpsUpdate {
        /// Scenario to run: exact, grouping.
        #[arg(short, long, default_value = "exact")]
        scenario: String,

        /// Output format: text, json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run the day-packing scheduler over the mixed scenario.
    Pack {
        /// Day-packing horizon, in days.
        #[arg(long, default_value_t = 2)]
        horizon_days: u32,

        /// Output format: text, json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<std::process::ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::AddNode {
            desc,
            topic,
            effort_hours,
            property,
            pattern,
            every,
            span,
            repeats,
            format,
        } => commands::cmd_add_node(
            &desc,
            &topic,
            effort_hours,
            &property,
            pattern.as_deref(),
            every,
            span,
            repeats,
            &format,
        )?,
        Commands::AddEdge {
            dependency,
            significance,
            format,
        } => commands::cmd_add_edge(dependency, significance, &format)?,
        Commands::EpsUpdate { scenario, format } => commands::cmd_eps_update(&scenario, &format)?,
        Commands::Pack { horizon_days, format } => commands::cmd_pack(horizon_days, &format)?,
    };

    Ok(exit_code.into())
}
