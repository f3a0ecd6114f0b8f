//! Command-line entry point for the KBO importer (§10.2, §10.3): wires [`Config`], logging, and
//! the Orchestrator Façade's four checkpoint operations plus the stale-lock sweeper into a
//! single binary a durable-workflow runtime, or an operator by hand, can invoke.

mod commands;
mod config;
mod error;
mod logging;

use clap::Parser;
use config::Config;
use error::Result;
use logging::LoggingConfig;
use observability_deps::tracing::error;

#[derive(Debug, clap::Parser)]
#[clap(name = "kbo", about = "KBO bitemporal registry import engine")]
struct Cli {
    #[clap(flatten)]
    config: Config,

    #[clap(flatten)]
    logging: LoggingConfig,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// Stage and plan a KBO archive, producing a PlanSummary.
    Prepare(commands::PrepareArgs),
    /// Execute one planned batch.
    ProcessBatch(commands::ProcessBatchArgs),
    /// Report a job's current progress.
    GetProgress(commands::GetProgressArgs),
    /// Run the Primary-Name Resolver and mark a job completed.
    Finalize(commands::FinalizeArgs),
    /// Reset any batch stuck `running` past the stale-lock threshold.
    SweepStale(commands::SweepStaleArgs),
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Prepare(args) => commands::prepare(&cli.config, args),
        Command::ProcessBatch(args) => commands::process_batch(&cli.config, args),
        Command::GetProgress(args) => commands::get_progress(&cli.config, args),
        Command::Finalize(args) => commands::finalize(&cli.config, args),
        Command::SweepStale(args) => commands::sweep_stale(&cli.config, args),
    }
}

fn main() {
    let cli = Cli::parse();
    cli.logging.init();

    if let Err(err) = run(cli) {
        error!(error = %err, "kbo: command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
