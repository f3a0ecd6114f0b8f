//! Orchestrator Façade (§4.9): the four checkpoint-boundary operations a durable runtime calls
//! — `prepare`, `processBatch`, `getProgress`, `finalize` — plus the stale-lock sweeper (§10.5).

use crate::error::{BatchesIncompleteSnafu, Result};
use crate::loader;
use duckdb::Connection;
use kbo_archive::Archive;
use kbo_time::Time;
use kbo_types::{
    BatchStatusRow, FinalizeResult, ImportJob, JobId, JobStatus, Limits, NextBatch, Operation, OverallProgress, PlanSummary,
    ProgressSnapshot, TableBatchCounts, TableName, TableProgress,
};
use observability_deps::tracing::{info, info_span, warn};
use std::collections::{BTreeMap, HashSet};

/// `prepare(archive, job) -> PlanSummary` (§4.3, §4.9).
///
/// Idempotent up to its final commit (§4.3's failure clause): a prior `preparing`/`failed`
/// attempt for the same `(extract_number, extract_type)` has its staging and batch rows wiped
/// before this call starts loading, so a retried `prepare` behaves as if the first attempt never
/// ran. A prior `completed` job instead short-circuits and returns its existing summary — the
/// `DuplicateJob` "no-op" recovery §7 calls for.
#[allow(clippy::too_many_arguments)]
pub fn prepare(conn: &Connection, archive_bytes: Vec<u8>, worker_type: &str, limits: Limits, now: Time, dry_run: bool) -> Result<PlanSummary> {
    kbo_catalog::ensure_schema(conn)?;
    let mut archive = Archive::open(archive_bytes)?;
    let meta = archive.read_metadata()?;
    let _span = info_span!("prepare", extract_number = meta.extract_number, extract_type = %meta.extract_type, worker_type).entered();

    if let Some(existing) = kbo_catalog::jobs::find_by_extract(conn, meta.extract_number, meta.extract_type)? {
        if existing.status == JobStatus::Completed {
            info!(job_id = %existing.id, "prepare: duplicate of a completed job, returning existing plan");
            return completed_plan_summary(conn, &existing);
        }
        info!(job_id = %existing.id, status = %existing.status, "prepare: discarding a previous incomplete attempt");
        kbo_catalog::staging::clear_for_job(conn, existing.id)?;
        kbo_catalog::batches::plan(conn, existing.id, &[])?;
    }

    let job_id = JobId::new();
    let job = ImportJob {
        id: job_id,
        extract_number: meta.extract_number,
        extract_type: meta.extract_type,
        snapshot_date: meta.snapshot_date,
        extract_timestamp: meta.extract_timestamp,
        status: JobStatus::Preparing,
        started_at: now,
        completed_at: None,
        error_message: None,
        records_inserted: 0,
        records_deleted: 0,
        records_processed: 0,
        worker_type: worker_type.to_string(),
    };
    kbo_catalog::jobs::create(conn, &job)?;

    match stage_and_plan(conn, &mut archive, job_id, meta.extract_type, limits) {
        Ok((total_batches, batches_by_table)) => {
            let status = if dry_run { JobStatus::Pending } else { JobStatus::Processing };
            kbo_catalog::jobs::set_status(conn, job_id, status, None)?;
            info!(%job_id, total_batches, dry_run, "prepare: staged and planned");
            Ok(PlanSummary {
                job_id,
                extract_number: meta.extract_number,
                snapshot_date: meta.snapshot_date,
                total_batches,
                batches_by_table,
                dry_run,
            })
        }
        Err(source) => {
            let message = source.to_string();
            kbo_catalog::jobs::set_status(conn, job_id, JobStatus::Failed, Some(&message))?;
            warn!(%job_id, error = %message, "prepare: failed while staging or planning");
            Err(source)
        }
    }
}

fn stage_and_plan(
    conn: &Connection,
    archive: &mut Archive,
    job_id: JobId,
    extract_type: kbo_types::ExtractType,
    limits: Limits,
) -> Result<(i64, BTreeMap<TableName, TableBatchCounts>)> {
    loader::load_staging(conn, archive, job_id, extract_type)?;
    let (batches, counts_by_table) = kbo_batch::plan_batches(conn, job_id, limits.batch_size)?;
    let total_batches = batches.len() as i64;
    kbo_catalog::batches::plan(conn, job_id, &batches)?;
    Ok((total_batches, counts_by_table))
}

fn completed_plan_summary(conn: &Connection, job: &ImportJob) -> Result<PlanSummary> {
    let batches = kbo_catalog::batches::list_for_job(conn, job.id)?;
    let batches_by_table = counts_by_table(&batches);
    Ok(PlanSummary {
        job_id: job.id,
        extract_number: job.extract_number,
        snapshot_date: job.snapshot_date,
        total_batches: batches.len() as i64,
        batches_by_table,
        dry_run: false,
    })
}

fn counts_by_table(batches: &[BatchStatusRow]) -> BTreeMap<TableName, TableBatchCounts> {
    let mut counts: BTreeMap<TableName, TableBatchCounts> = BTreeMap::new();
    for batch in batches {
        let entry = counts.entry(batch.table).or_default();
        match batch.operation {
            Operation::Delete => entry.delete_batches += 1,
            Operation::Insert => entry.insert_batches += 1,
        }
    }
    counts
}

/// `processBatch(job_id, table, batch_index, operation) -> BatchResult` (§4.5, §4.9).
///
/// A job prepared with `dry_run: true` is moved out of `pending` on its first batch: once a
/// caller actually starts running batches, the job is no longer a preview.
pub fn process_batch(
    conn: &Connection,
    job_id: JobId,
    table: TableName,
    operation: Operation,
    batch_index: i64,
    now: Time,
) -> Result<kbo_batch::BatchResult> {
    let job = kbo_catalog::jobs::get(conn, job_id)?;
    let _span = info_span!("processBatch", %job_id, %table, %operation, batch_index, worker_type = %job.worker_type).entered();

    if matches!(job.status, JobStatus::Pending | JobStatus::Preparing) {
        kbo_catalog::jobs::set_status(conn, job_id, JobStatus::Processing, None)?;
    }

    let ctx = kbo_batch::ExtractContext {
        extract_number: job.extract_number,
        snapshot_date: job.snapshot_date,
    };
    let result = kbo_batch::process_batch(conn, job_id, table, operation, batch_index, ctx, now)?;

    if result.newly_executed {
        let (inserted, deleted) = match operation {
            Operation::Insert => (result.rows_affected, 0),
            Operation::Delete => (0, result.rows_affected),
        };
        kbo_catalog::jobs::add_record_counts(conn, job_id, inserted, deleted)?;
    }

    Ok(result)
}

/// `getProgress(job_id) -> ProgressSnapshot` (§4.8, §4.9).
pub fn get_progress(conn: &Connection, job_id: JobId) -> Result<ProgressSnapshot> {
    let job = kbo_catalog::jobs::get(conn, job_id)?;
    let batches = kbo_catalog::batches::list_for_job(conn, job_id)?;

    let completed = batches.iter().filter(|b| b.state == kbo_types::BatchState::Completed).count() as i64;
    let overall = OverallProgress {
        completed,
        total: batches.len() as i64,
    };

    let mut per_table: BTreeMap<TableName, TableProgress> = BTreeMap::new();
    for table in TableName::DEPENDENCY_ORDER {
        let for_table: Vec<_> = batches.iter().filter(|b| b.table == table).collect();
        let completed = for_table.iter().filter(|b| b.state == kbo_types::BatchState::Completed).count() as i64;
        let total = for_table.len() as i64;
        per_table.insert(
            table,
            TableProgress {
                completed,
                total,
                all_completed: completed == total,
            },
        );
    }

    let next_batch = kbo_catalog::batches::next_pending(conn, job_id)?.map(|b| NextBatch {
        table: b.table,
        operation: b.operation,
        batch_index: b.batch_index,
    });

    Ok(ProgressSnapshot {
        job_id,
        status: job.status,
        overall,
        per_table,
        next_batch,
        error_message: job.error_message,
    })
}

/// `finalize(job_id) -> { names_resolved, staging_cleaned }` (§4.6, §4.8, §4.9).
///
/// Fails with [`crate::Error::BatchesIncomplete`] unless every batch the plan scheduled is
/// `completed`. Runs the Primary-Name Resolver only if this job's plan touched `enterprises` or
/// `denominations` (§9's accepted lag for denomination-only extracts).
pub fn finalize(conn: &Connection, job_id: JobId, now: Time) -> Result<FinalizeResult> {
    let job = kbo_catalog::jobs::get(conn, job_id)?;
    let _span = info_span!("finalize", %job_id, worker_type = %job.worker_type).entered();

    let batches = kbo_catalog::batches::list_for_job(conn, job_id)?;
    if batches.iter().any(|b| b.state != kbo_types::BatchState::Completed) {
        return BatchesIncompleteSnafu {
            job_id: job_id.to_string(),
        }
        .fail();
    }

    kbo_catalog::jobs::set_status(conn, job_id, JobStatus::Finalizing, None)?;

    match finalize_inner(conn, job_id, &job, &batches, now) {
        Ok(result) => {
            info!(%job_id, names_resolved = result.names_resolved, "finalize: completed");
            Ok(result)
        }
        Err(source) => {
            let message = source.to_string();
            kbo_catalog::jobs::set_status(conn, job_id, JobStatus::Failed, Some(&message))?;
            warn!(%job_id, error = %message, "finalize: failed");
            Err(source)
        }
    }
}

fn finalize_inner(conn: &Connection, job_id: JobId, job: &ImportJob, batches: &[BatchStatusRow], now: Time) -> Result<FinalizeResult> {
    let tables_touched: HashSet<TableName> = batches.iter().map(|b| b.table).collect();
    let names_resolved = if tables_touched.contains(&TableName::Enterprises) || tables_touched.contains(&TableName::Denominations) {
        kbo_resolver::resolve_primary_names(conn, job.extract_number)?
    } else {
        0
    };

    kbo_catalog::jobs::reconcile_record_counts(conn, job_id, job.extract_number)?;
    kbo_catalog::staging::clear_for_job(conn, job_id)?;
    kbo_catalog::jobs::set_completed_at(conn, job_id, JobStatus::Completed, now)?;

    Ok(FinalizeResult {
        names_resolved,
        staging_cleaned: true,
    })
}

/// Reset every `BatchStatus` row stuck `running` past `threshold_secs` back to `pending` (§5,
/// §7 `StaleLock`, §10.5). Returns how many batches were reset.
pub fn sweep_stale_batches(conn: &Connection, now: Time, threshold_secs: i64) -> Result<i64> {
    let reset = kbo_catalog::batches::sweep_stale(conn, now, threshold_secs)?;
    if reset > 0 {
        warn!(reset, threshold_secs, "sweep_stale_batches: reset stale running batches to pending");
    }
    Ok(reset)
}
