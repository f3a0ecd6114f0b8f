use crate::commands::parse_job_id;
use crate::config::Config;
use crate::error::Result;

/// Arguments for `kbo get-progress` (§4.8, §4.9).
#[derive(Debug, clap::Parser)]
pub struct GetProgressArgs {
    /// The job id returned by `prepare`.
    pub job_id: String,
}

pub fn get_progress(config: &Config, args: GetProgressArgs) -> Result<()> {
    let job_id = parse_job_id(&args.job_id)?;
    let conn = config.open_connection()?;
    let snapshot = kbo_orchestrator::get_progress(&conn, job_id)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
