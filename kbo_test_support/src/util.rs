use chrono::NaiveDate;
use duckdb::Connection;
use kbo_batch::ExtractContext;
use kbo_catalog::staging::StagedRow;
use kbo_time::{mock_at_epoch, MockProvider, Time};
use kbo_types::{ExtractType, ImportJob, JobId, JobStatus, Operation, TableName};
use observability_deps::tracing::debug;
use std::sync::Arc;

/// An in-memory catalog wired up the way a live `processBatch`/`finalize` call would find it:
/// schema already applied, a [`MockProvider`] standing in for wall-clock time.
///
/// Construction panics on failure (opening an in-memory DuckDB connection and running DDL
/// against it are not expected to fail in a test process): setup failures surface as test
/// panics rather than threading `Result` through every call site.
pub struct TestCatalog {
    pub conn: Connection,
    pub time_provider: Arc<MockProvider>,
}

impl TestCatalog {
    /// A fresh catalog with the full schema applied and the clock fixed at the Unix epoch.
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().expect("opening an in-memory duckdb connection");
        kbo_catalog::ensure_schema(&conn).expect("applying schema DDL");
        Self {
            conn,
            time_provider: mock_at_epoch(),
        }
    }

    /// The fixture's current mock time.
    pub fn now(&self) -> Time {
        self.time_provider.now()
    }

    /// Advance the fixture's mock clock, e.g. to exercise the stale-lock sweeper.
    pub fn advance(&self, delta: chrono::Duration) {
        self.time_provider.inc(delta);
    }

    /// Create a job row, moved straight to `processing` as `prepare` would once staging and
    /// planning succeed.
    pub fn create_job(&self, extract_number: i64, extract_type: ExtractType, snapshot_date: NaiveDate, worker_type: &str) -> ImportJob {
        let job = ImportJob {
            id: JobId::new(),
            extract_number,
            extract_type,
            snapshot_date,
            extract_timestamp: None,
            status: JobStatus::Preparing,
            started_at: self.now(),
            completed_at: None,
            error_message: None,
            records_inserted: 0,
            records_deleted: 0,
            records_processed: 0,
            worker_type: worker_type.to_string(),
        };
        kbo_catalog::jobs::create(&self.conn, &job).expect("creating a job row");
        kbo_catalog::jobs::set_status(&self.conn, job.id, JobStatus::Processing, None).expect("moving job to processing");
        job
    }

    /// Append staged rows for one `(table, operation)` pair, as the Staging Loader would.
    pub fn stage_rows(&self, job_id: JobId, table: TableName, operation: Operation, rows: Vec<StagedRow>) {
        debug!(%job_id, %table, %operation, rows = rows.len(), "test_support: staging rows");
        kbo_catalog::staging::append_rows(&self.conn, table, job_id, operation, &rows).expect("appending staged rows");
    }

    /// Plan every staged batch for `job_id` and run every one of them to completion, in plan
    /// order. Returns the total rows affected across all batches.
    pub fn plan_and_run_all(&self, job_id: JobId, extract_number: i64, snapshot_date: NaiveDate, batch_size: i64) -> i64 {
        let (batches, _counts) = kbo_batch::plan_batches(&self.conn, job_id, batch_size).expect("planning batches");
        kbo_catalog::batches::plan(&self.conn, job_id, &batches).expect("persisting the batch plan");

        let ctx = ExtractContext {
            extract_number,
            snapshot_date,
        };
        let mut total_rows_affected = 0;
        for batch in &batches {
            let result = kbo_batch::process_batch(&self.conn, job_id, batch.table, batch.operation, batch.batch_index, ctx, self.now())
                .expect("processing a planned batch");
            total_rows_affected += result.rows_affected;
        }
        total_rows_affected
    }

    /// Run the Primary-Name Resolver, as `finalize` would when the plan touched enterprises or
    /// denominations.
    pub fn resolve_primary_names(&self, extract_number: i64) -> i64 {
        kbo_resolver::resolve_primary_names(&self.conn, extract_number).expect("resolving primary names")
    }

    /// Recompute the job's authoritative record counts from the temporal tables, as `finalize`
    /// would (§4.8).
    pub fn reconcile_record_counts(&self, job_id: JobId, extract_number: i64) {
        kbo_catalog::jobs::reconcile_record_counts(&self.conn, job_id, extract_number).expect("reconciling record counts");
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}
