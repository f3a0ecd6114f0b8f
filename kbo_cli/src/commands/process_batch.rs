use crate::commands::{parse_job_id, parse_operation, parse_table};
use crate::config::Config;
use crate::error::Result;
use kbo_time::Time;

/// Arguments for `kbo process-batch` (§4.5, §4.9).
#[derive(Debug, clap::Parser)]
pub struct ProcessBatchArgs {
    /// The job id returned by `prepare`.
    pub job_id: String,

    /// The table this batch belongs to, e.g. `enterprises`.
    #[clap(long)]
    pub table: String,

    /// `insert` or `delete`.
    #[clap(long)]
    pub operation: String,

    /// The batch's index within its `(table, operation)` plan.
    #[clap(long = "batch-index")]
    pub batch_index: i64,
}

pub fn process_batch(config: &Config, args: ProcessBatchArgs) -> Result<()> {
    let job_id = parse_job_id(&args.job_id)?;
    let table = parse_table(&args.table)?;
    let operation = parse_operation(&args.operation)?;

    let conn = config.open_connection()?;
    let result = kbo_orchestrator::process_batch(&conn, job_id, table, operation, args.batch_index, Time::now())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "rows_affected": result.rows_affected,
            "newly_executed": result.newly_executed,
        }))?
    );
    Ok(())
}
