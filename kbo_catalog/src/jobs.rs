use crate::error::{DuplicateJobSnafu, JobNotFoundSnafu, QuerySnafu, Result};
use duckdb::{params, Connection, Row};
use kbo_time::Time;
use kbo_types::{ExtractType, ImportJob, JobId, JobStatus};
use snafu::{OptionExt, ResultExt};
use std::str::FromStr;

fn row_to_job(row: &Row<'_>) -> duckdb::Result<ImportJob> {
    let id: String = row.get("id")?;
    let extract_type: String = row.get("extract_type")?;
    let status: String = row.get("status")?;
    let started_at: chrono::DateTime<chrono::Utc> = row.get("started_at")?;
    let completed_at: Option<chrono::DateTime<chrono::Utc>> = row.get("completed_at")?;
    Ok(ImportJob {
        id: JobId::from_uuid(uuid::Uuid::parse_str(&id).expect("id column is always a UUID we wrote")),
        extract_number: row.get("extract_number")?,
        extract_type: ExtractType::from_str(&extract_type).expect("extract_type column is always a value we wrote"),
        snapshot_date: row.get("snapshot_date")?,
        extract_timestamp: row.get("extract_timestamp")?,
        status: job_status_from_str(&status).expect("status column is always a value we wrote"),
        started_at: Time::from_timestamp(started_at.timestamp(), started_at.timestamp_subsec_nanos()),
        completed_at: completed_at.map(|t| Time::from_timestamp(t.timestamp(), t.timestamp_subsec_nanos())),
        error_message: row.get("error_message")?,
        records_inserted: row.get("records_inserted")?,
        records_deleted: row.get("records_deleted")?,
        records_processed: row.get("records_processed")?,
        worker_type: row.get("worker_type")?,
    })
}

fn job_status_from_str(s: &str) -> Option<JobStatus> {
    Some(match s {
        "pending" => JobStatus::Pending,
        "preparing" => JobStatus::Preparing,
        "processing" => JobStatus::Processing,
        "finalizing" => JobStatus::Finalizing,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        _ => return None,
    })
}

/// Create a new `import_jobs` row in `preparing` status.
///
/// Fails with [`crate::Error::DuplicateJob`] if a `completed` job already exists for this
/// `(extract_number, extract_type)` (§4.3 step 1, §7 `DuplicateJob`).
pub fn create(conn: &Connection, job: &ImportJob) -> Result<()> {
    if let Some(existing) = find_by_extract(conn, job.extract_number, job.extract_type)? {
        if existing.status == JobStatus::Completed {
            return DuplicateJobSnafu {
                extract_number: job.extract_number,
                extract_type: job.extract_type.as_str(),
            }
            .fail();
        }
    }
    conn.execute(
        "INSERT INTO import_jobs (id, extract_number, extract_type, snapshot_date, extract_timestamp, \
         status, started_at, completed_at, error_message, records_inserted, records_deleted, \
         records_processed, worker_type) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (extract_number, extract_type) DO UPDATE SET \
         id = excluded.id, status = excluded.status, started_at = excluded.started_at, \
         completed_at = NULL, error_message = NULL, records_inserted = 0, records_deleted = 0, \
         records_processed = 0",
        params![
            job.id.as_uuid().to_string(),
            job.extract_number,
            job.extract_type.as_str(),
            job.snapshot_date,
            job.extract_timestamp,
            job.status.as_str(),
            job.started_at.date_time(),
            job.completed_at.map(|t| t.date_time()),
            job.error_message,
            job.records_inserted,
            job.records_deleted,
            job.records_processed,
            job.worker_type,
        ],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Look up a job by its `(extract_number, extract_type)` unique key (§3.4).
pub fn find_by_extract(conn: &Connection, extract_number: i64, extract_type: ExtractType) -> Result<Option<ImportJob>> {
    conn.query_row(
        "SELECT * FROM import_jobs WHERE extract_number = ? AND extract_type = ?",
        params![extract_number, extract_type.as_str()],
        row_to_job,
    )
    .optional_result()
}

/// Look up a job by id; fails with [`crate::Error::JobNotFound`] when absent.
pub fn get(conn: &Connection, job_id: JobId) -> Result<ImportJob> {
    conn.query_row(
        "SELECT * FROM import_jobs WHERE id = ?",
        params![job_id.as_uuid().to_string()],
        row_to_job,
    )
    .optional_result()?
    .context(JobNotFoundSnafu {
        job_id: job_id.to_string(),
    })
}

/// Overwrite `status` (and `error_message`, cleared on success paths by the caller).
pub fn set_status(conn: &Connection, job_id: JobId, status: JobStatus, error_message: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE import_jobs SET status = ?, error_message = ? WHERE id = ?",
        params![status.as_str(), error_message, job_id.as_uuid().to_string()],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Mark a job `completed` (or `failed`), stamping `completed_at`.
pub fn set_completed_at(conn: &Connection, job_id: JobId, status: JobStatus, completed_at: Time) -> Result<()> {
    conn.execute(
        "UPDATE import_jobs SET status = ?, completed_at = ? WHERE id = ?",
        params![status.as_str(), completed_at.date_time(), job_id.as_uuid().to_string()],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Add to the job's running insert/delete counters and recompute `records_processed` (§4.5).
pub fn add_record_counts(conn: &Connection, job_id: JobId, inserted: i64, deleted: i64) -> Result<()> {
    conn.execute(
        "UPDATE import_jobs SET records_inserted = records_inserted + ?, \
         records_deleted = records_deleted + ?, \
         records_processed = records_inserted + ? + records_deleted + ? \
         WHERE id = ?",
        params![inserted, deleted, inserted, deleted, job_id.as_uuid().to_string()],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Recompute `records_inserted`/`records_deleted`/`records_processed` from the temporal tables
/// themselves: the authoritative post-finalize reconciliation described in §4.8.
pub fn reconcile_record_counts(conn: &Connection, job_id: JobId, extract_number: i64) -> Result<()> {
    let mut inserted = 0i64;
    let mut deleted = 0i64;
    for table in kbo_types::TableName::DEPENDENCY_ORDER {
        let table_inserted: i64 = conn
            .query_row(
                &format!("SELECT count(*) FROM {} WHERE _extract_number = ?", table.db_name()),
                params![extract_number],
                |r| r.get(0),
            )
            .context(QuerySnafu)?;
        let table_deleted: i64 = conn
            .query_row(
                &format!("SELECT count(*) FROM {} WHERE _deleted_at_extract = ?", table.db_name()),
                params![extract_number],
                |r| r.get(0),
            )
            .context(QuerySnafu)?;
        inserted += table_inserted;
        deleted += table_deleted;
    }
    conn.execute(
        "UPDATE import_jobs SET records_inserted = ?, records_deleted = ?, records_processed = ? WHERE id = ?",
        params![inserted, deleted, inserted + deleted, job_id.as_uuid().to_string()],
    )
    .context(QuerySnafu)?;
    Ok(())
}

/// Extension trait turning duckdb's "no rows" error into `Option::None` instead of propagating.
trait OptionalResultExt<T> {
    fn optional_result(self) -> Result<Option<T>>;
}

impl<T> OptionalResultExt<T> for duckdb::Result<T> {
    fn optional_result(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(source) => Err(source).context(QuerySnafu),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;
    use chrono::NaiveDate;

    fn test_job(extract_number: i64) -> ImportJob {
        ImportJob {
            id: JobId::new(),
            extract_number,
            extract_type: ExtractType::Full,
            snapshot_date: NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
            extract_timestamp: None,
            status: JobStatus::Preparing,
            started_at: Time::from_timestamp(1_700_000_000, 0),
            completed_at: None,
            error_message: None,
            records_inserted: 0,
            records_deleted: 0,
            records_processed: 0,
            worker_type: "full-import".into(),
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job = test_job(140);
        create(&conn, &job).unwrap();
        let fetched = get(&conn, job.id).unwrap();
        assert_eq!(fetched.extract_number, 140);
        assert_eq!(fetched.status, JobStatus::Preparing);
    }

    #[test]
    fn creating_over_a_completed_job_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let mut job = test_job(141);
        job.status = JobStatus::Completed;
        create(&conn, &job).unwrap();

        let retry = test_job(141);
        let err = create(&conn, &retry).unwrap_err();
        assert_matches::assert_matches!(err, crate::Error::DuplicateJob { .. });
    }

    #[test]
    fn record_counts_accumulate_across_calls() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let job = test_job(142);
        create(&conn, &job).unwrap();
        add_record_counts(&conn, job.id, 5, 1).unwrap();
        add_record_counts(&conn, job.id, 2, 0).unwrap();
        let fetched = get(&conn, job.id).unwrap();
        assert_eq!(fetched.records_inserted, 7);
        assert_eq!(fetched.records_deleted, 1);
        assert_eq!(fetched.records_processed, 8);
    }
}
