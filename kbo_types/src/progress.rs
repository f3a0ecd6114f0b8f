use crate::batch::TableBatchCounts;
use crate::job::{JobId, JobStatus};
use crate::table::TableName;
use std::collections::BTreeMap;

/// Returned by `prepare` (§4.9): a summary of what staging produced and how the Batch Planner
/// sliced it up.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlanSummary {
    pub job_id: JobId,
    pub extract_number: i64,
    pub snapshot_date: chrono::NaiveDate,
    pub total_batches: i64,
    pub batches_by_table: BTreeMap<TableName, TableBatchCounts>,
    /// True when `prepare` was called with `dry_run: true` (§10.5): staging and planning ran,
    /// but the job was left `pending` rather than handed out for `processBatch` calls.
    pub dry_run: bool,
}

/// Returned by `getProgress` (§4.8/§4.9).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgressSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub overall: OverallProgress,
    pub per_table: BTreeMap<TableName, TableProgress>,
    /// The batch the executor would run next if asked, in [`crate::BatchStatusRow::order_key`]
    /// order; `None` once every batch is `completed`.
    pub next_batch: Option<NextBatch>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OverallProgress {
    pub completed: i64,
    pub total: i64,
}

impl OverallProgress {
    /// Percentage complete, `100` when there is nothing to do (`total == 0`).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableProgress {
    pub completed: i64,
    pub total: i64,
    pub all_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NextBatch {
    pub table: TableName,
    pub operation: crate::batch::Operation,
    pub batch_index: i64,
}

/// Returned by `finalize` (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FinalizeResult {
    /// How many enterprises the Primary-Name Resolver updated, or `0` if this job's batch plan
    /// touched neither `enterprises` nor `denominations` (§9's accepted one-extract-cycle lag).
    pub names_resolved: i64,
    pub staging_cleaned: bool,
}
