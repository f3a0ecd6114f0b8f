use crate::config::Config;
use crate::error::Result;
use kbo_time::Time;
use std::path::PathBuf;

/// Arguments for `kbo prepare` (§4.3, §4.9).
#[derive(Debug, clap::Parser)]
pub struct PrepareArgs {
    /// Path to the archive's ZIP file.
    pub archive_path: PathBuf,

    /// The class of worker driving this job (e.g. `full-import`, `daily-update`), threaded
    /// through to every log span and into `getProgress` (§10.5).
    #[clap(long = "worker-type", default_value = "cli")]
    pub worker_type: String,

    /// Stage and plan the archive but leave the job `pending` rather than handing out batches,
    /// so the `PlanSummary` can be inspected before committing a large run (§10.5).
    #[clap(long)]
    pub dry_run: bool,
}

pub fn prepare(config: &Config, args: PrepareArgs) -> Result<()> {
    let conn = config.open_connection()?;
    let bytes = std::fs::read(&args.archive_path)?;
    let summary = kbo_orchestrator::prepare(&conn, bytes, &args.worker_type, config.limits(), Time::now(), args.dry_run)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
