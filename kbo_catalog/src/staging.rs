use crate::error::{QuerySnafu, Result};
use duckdb::{params, Appender, Connection};
use kbo_types::{JobId, Operation, TableName};
use snafu::ResultExt;

/// One staged row, ready to be appended to `staging_<table>` (§3.3, §4.3).
///
/// `business_values[i]` lines up positionally with the column list the Staging Loader used to
/// build this row (the table's business columns in the order `kbo_catalog::schema` declares
/// them); callers get that order from [`crate::business_column_names`].
pub struct StagedRow {
    pub row_sequence: i64,
    pub natural_key: String,
    pub entity_type: Option<&'static str>,
    pub business_values: Vec<Option<String>>,
}

/// Bulk-append staged rows for one `(job, table, operation)` triple (§4.3 step 4).
///
/// Uses DuckDB's `Appender` API, the bulk-load path recommended for large sequential inserts
/// (a single `INSERT` per row would dominate the `prepare` call's runtime on a million-row
/// `enterprise_insert.csv`).
pub fn append_rows(conn: &Connection, table: TableName, job_id: JobId, operation: Operation, rows: &[StagedRow]) -> Result<()> {
    let mut appender: Appender<'_> = conn.appender(&table.staging_name()).context(QuerySnafu)?;
    for row in rows {
        let mut values: Vec<Box<dyn duckdb::ToSql>> = vec![
            Box::new(job_id.as_uuid().to_string()),
            Box::new(operation.as_str().to_string()),
            Box::new(row.row_sequence),
            Box::new(row.natural_key.clone()),
        ];
        if !table.is_natural_key_table() {
            values.push(Box::new(row.entity_type.map(|s| s.to_string())));
        }
        for value in &row.business_values {
            values.push(Box::new(value.clone()));
        }
        appender.append_row(duckdb::params_from_iter(values.iter().map(|v| v.as_ref())))
            .context(QuerySnafu)?;
    }
    appender.flush().context(QuerySnafu)
}

/// Delete every staged row belonging to `job_id` across all seven staging tables (§3.3:
/// "staging rows live only for the duration of a job").
pub fn clear_for_job(conn: &Connection, job_id: JobId) -> Result<()> {
    for table in TableName::DEPENDENCY_ORDER {
        conn.execute(
            &format!("DELETE FROM {} WHERE job_id = ?", table.staging_name()),
            params![job_id.as_uuid().to_string()],
        )
        .context(QuerySnafu)?;
    }
    Ok(())
}

/// Count staged rows for a `(job, table, operation)` triple — the input to the Batch Planner's
/// `⌈staging_rows / BATCH_SIZE⌉` computation (§4.3).
pub fn count(conn: &Connection, table: TableName, job_id: JobId, operation: Operation) -> Result<i64> {
    conn.query_row(
        &format!(
            "SELECT count(*) FROM {} WHERE job_id = ? AND operation = ?",
            table.staging_name()
        ),
        params![job_id.as_uuid().to_string(), operation.as_str()],
        |r| r.get(0),
    )
    .context(QuerySnafu)
}
