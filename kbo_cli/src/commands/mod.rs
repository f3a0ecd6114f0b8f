//! One module per façade operation, each taking the shared [`crate::config::Config`] plus its
//! own arguments and printing its result as JSON on stdout.

mod finalize;
mod get_progress;
mod prepare;
mod process_batch;
mod sweep_stale;

pub use finalize::{finalize, FinalizeArgs};
pub use get_progress::{get_progress, GetProgressArgs};
pub use prepare::{prepare, PrepareArgs};
pub use process_batch::{process_batch, ProcessBatchArgs};
pub use sweep_stale::{sweep_stale, SweepStaleArgs};

use crate::error::{Error, Result};
use kbo_types::{JobId, Operation, TableName};
use uuid::Uuid;

/// Parse a job id as handed back by `prepare`'s JSON output.
pub(crate) fn parse_job_id(raw: &str) -> Result<JobId> {
    Uuid::parse_str(raw)
        .map(JobId::from_uuid)
        .map_err(|_| Error::InvalidJobId(raw.to_string()))
}

pub(crate) fn parse_table(raw: &str) -> Result<TableName> {
    TableName::from_name(raw).ok_or_else(|| Error::UnknownTable(raw.to_string()))
}

pub(crate) fn parse_operation(raw: &str) -> Result<Operation> {
    match raw {
        "insert" => Ok(Operation::Insert),
        "delete" => Ok(Operation::Delete),
        other => Err(Error::InvalidOperation(other.to_string())),
    }
}
