use crate::commands::parse_job_id;
use crate::config::Config;
use crate::error::Result;
use kbo_time::Time;

/// Arguments for `kbo finalize` (§4.6, §4.8, §4.9).
#[derive(Debug, clap::Parser)]
pub struct FinalizeArgs {
    /// The job id returned by `prepare`.
    pub job_id: String,
}

pub fn finalize(config: &Config, args: FinalizeArgs) -> Result<()> {
    let job_id = parse_job_id(&args.job_id)?;
    let conn = config.open_connection()?;
    let result = kbo_orchestrator::finalize(&conn, job_id, Time::now())?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
