use crate::config::Config;
use crate::error::Result;
use kbo_time::Time;

/// Arguments for `kbo sweep-stale` (§10.5, `StaleLock` recovery in §7).
#[derive(Debug, clap::Parser)]
pub struct SweepStaleArgs {
    /// Override the configured stale-lock threshold for this sweep only.
    #[clap(long = "threshold-secs")]
    pub threshold_secs: Option<i64>,
}

pub fn sweep_stale(config: &Config, args: SweepStaleArgs) -> Result<()> {
    let conn = config.open_connection()?;
    let threshold = args.threshold_secs.unwrap_or(config.stale_lock_threshold_secs);
    let reset = kbo_orchestrator::sweep_stale_batches(&conn, Time::now(), threshold)?;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "batches_reset": reset }))?);
    Ok(())
}
