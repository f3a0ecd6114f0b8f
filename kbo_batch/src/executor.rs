use crate::error::{BatchFailedSnafu, Result};
use duckdb::{params, Connection};
use kbo_catalog::StartOutcome;
use kbo_time::Time;
use kbo_types::{JobId, Operation, TableName};
use observability_deps::tracing::{info, warn};
use snafu::ResultExt;

/// Outcome of one `processBatch` call (§4.5, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub rows_affected: i64,
    /// `false` when the batch had already completed and this call was a no-op replay.
    pub newly_executed: bool,
}

/// Parameters an insert batch needs beyond its own row range: the extract this job is writing
/// and the snapshot date stamped onto every newly-current row (§6 date format, §3.1).
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext {
    pub extract_number: i64,
    pub snapshot_date: chrono::NaiveDate,
}

/// Execute one planned batch (§4.5). Idempotent: replaying a `completed` batch returns its
/// original row count without touching the target table again.
pub fn process_batch(
    conn: &Connection,
    job_id: JobId,
    table: TableName,
    operation: Operation,
    batch_index: i64,
    ctx: ExtractContext,
    now: Time,
) -> Result<BatchResult> {
    let batch = kbo_catalog::batches::get(conn, job_id, table, operation, batch_index)?;

    match kbo_catalog::batches::try_start(conn, job_id, table, operation, batch_index, now)? {
        StartOutcome::AlreadyCompleted => {
            return Ok(BatchResult {
                rows_affected: batch.rows_affected.unwrap_or(0),
                newly_executed: false,
            });
        }
        StartOutcome::Started => {}
    }

    let outcome = match operation {
        Operation::Delete => run_delete(conn, table, job_id, batch.row_sequence_lo, batch.row_sequence_hi, ctx.extract_number),
        Operation::Insert => run_insert(conn, table, job_id, batch.row_sequence_lo, batch.row_sequence_hi, ctx),
    };

    match outcome {
        Ok(rows_affected) => {
            kbo_catalog::batches::mark_completed(conn, job_id, table, operation, batch_index, rows_affected)?;
            info!(%job_id, %table, %operation, batch_index, rows_affected, "batch completed");
            Ok(BatchResult {
                rows_affected,
                newly_executed: true,
            })
        }
        Err(source) => {
            let message = source.to_string();
            kbo_catalog::batches::mark_failed(conn, job_id, table, operation, batch_index, &message)?;
            warn!(%job_id, %table, %operation, batch_index, error = %message, "batch failed");
            Err(source).context(BatchFailedSnafu)
        }
    }
}

fn run_delete(conn: &Connection, table: TableName, job_id: JobId, lo: i64, hi: i64, extract_number: i64) -> duckdb::Result<i64> {
    let key = table.natural_key_column();
    let sql = format!(
        "UPDATE {target} SET _is_current = false, _deleted_at_extract = ? \
         WHERE {key} IN ( \
             SELECT _natural_key FROM {staging} \
             WHERE job_id = ? AND operation = 'delete' AND row_sequence BETWEEN ? AND ? \
         ) AND _is_current = true",
        target = table.db_name(),
        staging = table.staging_name(),
    );
    conn.execute(&sql, params![extract_number, job_id.as_uuid().to_string(), lo, hi])
        .map(|n| n as i64)
}

fn run_insert(conn: &Connection, table: TableName, job_id: JobId, lo: i64, hi: i64, ctx: ExtractContext) -> duckdb::Result<i64> {
    let business_columns = kbo_catalog::business_column_names(table);
    let key = table.natural_key_column();

    let dedup = format!(
        "SELECT *, ROW_NUMBER() OVER (PARTITION BY _natural_key ORDER BY row_sequence DESC) AS rn \
         FROM {staging} WHERE job_id = ? AND operation = 'insert' AND row_sequence BETWEEN ? AND ?",
        staging = table.staging_name(),
    );

    let (select_list, from_clause, target_columns) = if table == TableName::Enterprises {
        // Enterprise inserts carry forward the previous primary_name* columns from the most
        // recent row of the same enterprise, so the row stays displayable before the
        // Primary-Name Resolver runs (§4.6). A brand-new enterprise_number has no prior row, so
        // primary_name falls back to the enterprise_number placeholder the resolver looks for.
        let business_select = business_columns
            .iter()
            .filter(|c| !c.starts_with("primary_name"))
            .map(|c| format!("s.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let select_list = format!(
            "{business_select}, \
             COALESCE(prev.primary_name, s.enterprise_number) AS primary_name, \
             prev.primary_name_language AS primary_name_language, \
             prev.primary_name_nl AS primary_name_nl, \
             prev.primary_name_fr AS primary_name_fr, \
             prev.primary_name_de AS primary_name_de"
        );
        let from_clause = format!(
            "({dedup}) s \
             LEFT JOIN LATERAL ( \
                 SELECT primary_name, primary_name_language, primary_name_nl, primary_name_fr, primary_name_de \
                 FROM enterprises e \
                 WHERE e.enterprise_number = s.enterprise_number \
                 ORDER BY e._extract_number DESC LIMIT 1 \
             ) prev ON true \
             WHERE s.rn = 1"
        );
        (select_list, from_clause, business_columns.clone())
    } else {
        let business_select = business_columns.iter().map(|c| format!("s.{c}")).collect::<Vec<_>>().join(", ");
        let mut target_columns = business_columns.clone();
        target_columns.push("id");
        target_columns.push("entity_type");
        let select_list = format!("{business_select}, s._natural_key AS id, s.entity_type AS entity_type");
        let from_clause = format!("({dedup}) s WHERE s.rn = 1");
        (select_list, from_clause, target_columns)
    };

    let conflict_key = if table.is_natural_key_table() { key.to_string() } else { "id".to_string() };
    let sql = format!(
        "INSERT INTO {target} ({target_columns}, _snapshot_date, _extract_number, _is_current, _deleted_at_extract) \
         SELECT {select_list}, ?, ?, true, NULL \
         FROM {from_clause} \
         ON CONFLICT ({conflict_key}, _extract_number) DO NOTHING",
        target = table.db_name(),
        target_columns = target_columns.join(", "),
    );

    conn.execute(&sql, params![ctx.snapshot_date, ctx.extract_number, job_id.as_uuid().to_string(), lo, hi])
        .map(|n| n as i64)
}
