use crate::error::{BatchBusySnafu, QuerySnafu, Result};
use duckdb::{params, Connection, Row};
use kbo_time::Time;
use kbo_types::{BatchState, BatchStatusRow, JobId, Operation, TableName};
use snafu::{OptionExt, ResultExt};

fn row_to_batch(row: &Row<'_>) -> duckdb::Result<BatchStatusRow> {
    let table: String = row.get("table_name")?;
    let operation: String = row.get("operation")?;
    let state: String = row.get("state")?;
    Ok(BatchStatusRow {
        table: TableName::from_name(&table).expect("table_name column is always a value we wrote"),
        operation: operation_from_str(&operation).expect("operation column is always a value we wrote"),
        batch_index: row.get("batch_index")?,
        row_sequence_lo: row.get("row_sequence_lo")?,
        row_sequence_hi: row.get("row_sequence_hi")?,
        state: BatchState::from_str_strict(&state).expect("state column is always a value we wrote"),
        attempt: row.get("attempt")?,
        last_error: row.get("last_error")?,
        rows_affected: row.get("rows_affected")?,
    })
}

fn operation_from_str(s: &str) -> Option<Operation> {
    match s {
        "delete" => Some(Operation::Delete),
        "insert" => Some(Operation::Insert),
        _ => None,
    }
}

/// Insert one `batch_status` row per planned batch (§4.4). Replaces any existing rows for this
/// job so that a re-`prepare` of a job that previously failed mid-plan starts clean.
pub fn plan(conn: &Connection, job_id: JobId, batches: &[BatchStatusRow]) -> Result<()> {
    conn.execute(
        "DELETE FROM batch_status WHERE job_id = ?",
        params![job_id.as_uuid().to_string()],
    )
    .context(QuerySnafu)?;
    for batch in batches {
        conn.execute(
            "INSERT INTO batch_status (job_id, table_name, operation, batch_index, row_sequence_lo, \
             row_sequence_hi, state, attempt, last_error, rows_affected) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, NULL, NULL)",
            params![
                job_id.as_uuid().to_string(),
                batch.table.db_name(),
                batch.operation.as_str(),
                batch.batch_index,
                batch.row_sequence_lo,
                batch.row_sequence_hi,
                batch.state.as_str(),
            ],
        )
        .context(QuerySnafu)?;
    }
    Ok(())
}

/// What happened when [`try_start`] was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The batch was `pending` and is now `running`; the caller should do the work.
    Started,
    /// The batch was already `completed`; the caller should return a zero-count result (§4.5
    /// step 2, idempotent replay).
    AlreadyCompleted,
}

/// Atomically transition a batch from `pending` to `running` (§4.5 step 1).
///
/// Fails with [`crate::Error::BatchBusy`] if another worker already holds it. DuckDB's
/// single-writer model makes this check-then-set race-free as long as every writer goes
/// through one connection per call, as §6 requires.
pub fn try_start(
    conn: &Connection,
    job_id: JobId,
    table: TableName,
    operation: Operation,
    batch_index: i64,
    now: Time,
) -> Result<StartOutcome> {
    let current = get(conn, job_id, table, operation, batch_index)?;
    match current.state {
        BatchState::Completed => Ok(StartOutcome::AlreadyCompleted),
        BatchState::Running => BatchBusySnafu {
            job_id: job_id.to_string(),
            table: table.db_name(),
            operation: operation.as_str(),
            batch_index,
        }
        .fail(),
        BatchState::Pending | BatchState::Failed => {
            conn.execute(
                "UPDATE batch_status SET state = 'running', attempt = attempt + 1, \
                 started_running_at = ? \
                 WHERE job_id = ? AND table_name = ? AND operation = ? AND batch_index = ? \
                 AND state != 'running'",
                params![
                    now.date_time(),
                    job_id.as_uuid().to_string(),
                    table.db_name(),
                    operation.as_str(),
                    batch_index,
                ],
            )
            .context(QuerySnafu)?;
            Ok(StartOutcome::Started)
        }
    }
}

/// Mark a batch `completed` with its row count (§4.5 step 4).
pub fn mark_completed(conn: &Connection, job_id: JobId, table: TableName, operation: Operation, batch_index: i64, rows_affected: i64) -> Result<()> {
    conn.execute(
        "UPDATE batch_status SET state = 'completed', rows_affected = ?, last_error = NULL \
         WHERE job_id = ? AND table_name = ? AND operation = ? AND batch_index = ?",
        params![
            rows_affected,
            job_id.as_uuid().to_string(),
            table.db_name(),
            operation.as_str(),
            batch_index,
        ],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Mark a batch `failed` with its error message; a future `processBatch` call may retry it.
pub fn mark_failed(conn: &Connection, job_id: JobId, table: TableName, operation: Operation, batch_index: i64, error: &str) -> Result<()> {
    conn.execute(
        "UPDATE batch_status SET state = 'failed', last_error = ? \
         WHERE job_id = ? AND table_name = ? AND operation = ? AND batch_index = ?",
        params![
            error,
            job_id.as_uuid().to_string(),
            table.db_name(),
            operation.as_str(),
            batch_index,
        ],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Fetch a single batch row; fails with [`crate::Error::BatchNotFound`] when absent.
pub fn get(conn: &Connection, job_id: JobId, table: TableName, operation: Operation, batch_index: i64) -> Result<BatchStatusRow> {
    conn.query_row(
        "SELECT * FROM batch_status WHERE job_id = ? AND table_name = ? AND operation = ? AND batch_index = ?",
        params![job_id.as_uuid().to_string(), table.db_name(), operation.as_str(), batch_index],
        row_to_batch,
    )
    .map_err(|source| match source {
        duckdb::Error::QueryReturnedNoRows => crate::Error::BatchNotFound {
            job_id: job_id.to_string(),
            table: table.db_name().to_string(),
            operation: operation.as_str().to_string(),
            batch_index,
        },
        other => crate::Error::Query { source: other },
    })
}

/// All batch rows for a job, in §4.4's stable `order_key` order.
pub fn list_for_job(conn: &Connection, job_id: JobId) -> Result<Vec<BatchStatusRow>> {
    let mut stmt = conn
        .prepare("SELECT * FROM batch_status WHERE job_id = ?")
        .context(QuerySnafu)?;
    let mut rows = stmt
        .query_map(params![job_id.as_uuid().to_string()], row_to_batch)
        .context(QuerySnafu)?
        .collect::<duckdb::Result<Vec<_>>>()
        .context(QuerySnafu)?;
    rows.sort_by_key(|b| b.order_key());
    Ok(rows)
}

/// The first batch in order-key order that is not yet `completed`, or `None` if the whole plan
/// is done (§4.8 `next_batch`).
pub fn next_pending(conn: &Connection, job_id: JobId) -> Result<Option<BatchStatusRow>> {
    Ok(list_for_job(conn, job_id)?
        .into_iter()
        .find(|b| b.state != BatchState::Completed))
}

/// True once every batch for the job is `completed` (§4.9 `finalize` precondition).
pub fn all_completed(conn: &Connection, job_id: JobId) -> Result<bool> {
    Ok(next_pending(conn, job_id)?.is_none())
}

/// Reset every batch stuck `running` for longer than `threshold_secs` back to `pending`
/// (§5 stale-lock sweeper, §7 `StaleLock`, §10.5). Returns how many batches were reset.
pub fn sweep_stale(conn: &Connection, now: Time, threshold_secs: i64) -> Result<i64> {
    let cutoff = now
        .checked_add(chrono::Duration::seconds(-threshold_secs))
        .expect("threshold_secs is always a small positive constant");
    let reset = conn
        .execute(
            "UPDATE batch_status SET state = 'pending' \
             WHERE state = 'running' AND started_running_at < ?",
            params![cutoff.date_time()],
        )
        .context(QuerySnafu)?;
    Ok(reset as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;

    fn plan_one(conn: &Connection, job_id: JobId) {
        plan(
            conn,
            job_id,
            &[BatchStatusRow {
                table: TableName::Enterprises,
                operation: Operation::Insert,
                batch_index: 0,
                row_sequence_lo: 1,
                row_sequence_hi: 10_000,
                state: BatchState::Pending,
                attempt: 0,
                last_error: None,
                rows_affected: None,
            }],
        )
        .unwrap();
    }

    #[test]
    fn try_start_moves_pending_to_running_then_rejects_a_second_caller() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job_id = JobId::new();
        plan_one(&conn, job_id);

        let now = Time::from_timestamp(1_700_000_000, 0);
        let outcome = try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, now).unwrap();
        assert_eq!(outcome, StartOutcome::Started);

        let err = try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, now).unwrap_err();
        assert_matches::assert_matches!(err, crate::Error::BatchBusy { .. });
    }

    #[test]
    fn completed_batches_replay_as_already_completed() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job_id = JobId::new();
        plan_one(&conn, job_id);
        let now = Time::from_timestamp(1_700_000_000, 0);
        try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, now).unwrap();
        mark_completed(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, 42).unwrap();

        let outcome = try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, now).unwrap();
        assert_eq!(outcome, StartOutcome::AlreadyCompleted);
    }

    #[test]
    fn sweep_stale_resets_long_running_batches_only() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job_id = JobId::new();
        plan_one(&conn, job_id);
        let start = Time::from_timestamp(1_700_000_000, 0);
        try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, start).unwrap();

        let too_soon = start.checked_add(chrono::Duration::seconds(60)).unwrap();
        assert_eq!(sweep_stale(&conn, too_soon, 300).unwrap(), 0);

        let later = start.checked_add(chrono::Duration::seconds(400)).unwrap();
        assert_eq!(sweep_stale(&conn, later, 300).unwrap(), 1);
        let batch = get(&conn, job_id, TableName::Enterprises, Operation::Insert, 0).unwrap();
        assert_eq!(batch.state, BatchState::Pending);
    }

    #[test]
    fn next_pending_and_all_completed_track_plan_progress() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job_id = JobId::new();
        plan_one(&conn, job_id);
        assert!(!all_completed(&conn, job_id).unwrap());
        assert!(next_pending(&conn, job_id).unwrap().is_some());

        let now = Time::from_timestamp(1_700_000_000, 0);
        try_start(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, now).unwrap();
        mark_completed(&conn, job_id, TableName::Enterprises, Operation::Insert, 0, 1).unwrap();
        assert!(all_completed(&conn, job_id).unwrap());
        assert!(next_pending(&conn, job_id).unwrap().is_none());
    }
}
