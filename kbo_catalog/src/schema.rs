use crate::error::{Result, SchemaSnafu};
use duckdb::Connection;
use kbo_types::TableName;
use snafu::ResultExt;

/// `(column name, SQL type)` pairs for the business columns of one temporal table, i.e.
/// everything except the four `_`-prefixed bookkeeping columns and `entity_type` (added
/// separately for composite-ID tables). Staging tables carry the same business columns, all as
/// `TEXT`, since the Staging Loader stores the raw CSV values verbatim (§3.3, §4.2).
fn business_columns(table: TableName) -> &'static [(&'static str, &'static str)] {
    match table {
        TableName::Enterprises => &[
            ("enterprise_number", "TEXT"),
            ("status", "TEXT"),
            ("juridical_situation", "TEXT"),
            ("type_of_enterprise", "TEXT"),
            ("juridical_form", "TEXT"),
            ("juridical_form_cac", "TEXT"),
            ("start_date", "DATE"),
            ("primary_name", "TEXT"),
            ("primary_name_language", "TEXT"),
            ("primary_name_nl", "TEXT"),
            ("primary_name_fr", "TEXT"),
            ("primary_name_de", "TEXT"),
        ],
        TableName::Establishments => &[
            ("establishment_number", "TEXT"),
            ("enterprise_number", "TEXT"),
            ("start_date", "DATE"),
        ],
        TableName::Denominations => &[
            ("entity_number", "TEXT"),
            ("language", "TEXT"),
            ("type_of_denomination", "TEXT"),
            ("denomination", "TEXT"),
        ],
        TableName::Addresses => &[
            ("entity_number", "TEXT"),
            ("type_of_address", "TEXT"),
            ("country_nl", "TEXT"),
            ("country_fr", "TEXT"),
            ("zipcode", "TEXT"),
            ("municipality_nl", "TEXT"),
            ("municipality_fr", "TEXT"),
            ("street_nl", "TEXT"),
            ("street_fr", "TEXT"),
            ("house_number", "TEXT"),
            ("box_number", "TEXT"),
            ("extra_address_info", "TEXT"),
            ("date_striking_off", "DATE"),
        ],
        TableName::Activities => &[
            ("entity_number", "TEXT"),
            ("activity_group", "TEXT"),
            ("version", "TEXT"),
            ("nace_code", "TEXT"),
            ("nace_version", "TEXT"),
            ("classification", "TEXT"),
        ],
        TableName::Contacts => &[
            ("entity_number", "TEXT"),
            ("entity_contact", "TEXT"),
            ("contact_type", "TEXT"),
            ("value", "TEXT"),
        ],
        TableName::Branches => &[
            ("entity_number", "TEXT"),
            ("branch_number", "TEXT"),
            ("start_date", "DATE"),
        ],
    }
}

/// The business column names for `table`, in the order the Staging Loader must supply
/// [`crate::staging::StagedRow::business_values`] and the Batch Executor must copy them across
/// into the target table (§4.2, §4.5).
pub fn business_column_names(table: TableName) -> Vec<&'static str> {
    business_columns(table).iter().map(|(name, _)| *name).collect()
}

fn bookkeeping_columns() -> &'static [(&'static str, &'static str)] {
    &[
        ("_snapshot_date", "DATE NOT NULL"),
        ("_extract_number", "BIGINT NOT NULL"),
        ("_is_current", "BOOLEAN NOT NULL"),
        ("_deleted_at_extract", "BIGINT"),
    ]
}

fn target_ddl(table: TableName) -> String {
    let mut cols = Vec::new();
    for (name, ty) in business_columns(table) {
        cols.push(format!("{name} {ty}"));
    }
    if !table.is_natural_key_table() {
        cols.push("id TEXT NOT NULL".to_string());
        cols.push("entity_type TEXT NOT NULL".to_string());
    }
    for (name, ty) in bookkeeping_columns() {
        cols.push(format!("{name} {ty}"));
    }
    let pk = table.natural_key_column();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {},\n    PRIMARY KEY ({pk}, _extract_number)\n);",
        table.db_name(),
        cols.join(",\n    "),
    )
}

fn staging_ddl(table: TableName) -> String {
    let mut cols = vec!["job_id TEXT NOT NULL".to_string(), "operation TEXT NOT NULL".to_string(), "row_sequence BIGINT NOT NULL".to_string()];
    cols.push("_natural_key TEXT".to_string());
    if !table.is_natural_key_table() {
        cols.push("entity_type TEXT".to_string());
    }
    for (name, _ty) in business_columns(table) {
        // Staging holds raw CSV text; conversion/validation happens on the way into the target
        // table, not here.
        cols.push(format!("{name} TEXT"));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        table.staging_name(),
        cols.join(",\n    "),
    )
}

const CONTROL_DDL: &str = "
CREATE TABLE IF NOT EXISTS import_jobs (
    id TEXT PRIMARY KEY,
    extract_number BIGINT NOT NULL,
    extract_type TEXT NOT NULL,
    snapshot_date DATE NOT NULL,
    extract_timestamp TIMESTAMP,
    status TEXT NOT NULL,
    started_at TIMESTAMP NOT NULL,
    completed_at TIMESTAMP,
    error_message TEXT,
    records_inserted BIGINT NOT NULL DEFAULT 0,
    records_deleted BIGINT NOT NULL DEFAULT 0,
    records_processed BIGINT NOT NULL DEFAULT 0,
    worker_type TEXT NOT NULL,
    UNIQUE (extract_number, extract_type)
);

CREATE TABLE IF NOT EXISTS batch_status (
    job_id TEXT NOT NULL,
    table_name TEXT NOT NULL,
    operation TEXT NOT NULL,
    batch_index BIGINT NOT NULL,
    row_sequence_lo BIGINT NOT NULL,
    row_sequence_hi BIGINT NOT NULL,
    state TEXT NOT NULL,
    attempt INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    rows_affected BIGINT,
    started_running_at TIMESTAMP,
    PRIMARY KEY (job_id, table_name, operation, batch_index)
);
";

const AUX_DDL: &str = "
CREATE TABLE IF NOT EXISTS codes (
    category TEXT NOT NULL,
    code TEXT NOT NULL,
    language TEXT NOT NULL,
    description TEXT,
    PRIMARY KEY (category, code, language)
);

CREATE TABLE IF NOT EXISTS nace_codes (
    nace_version TEXT NOT NULL,
    nace_code TEXT NOT NULL,
    language TEXT NOT NULL,
    description TEXT,
    PRIMARY KEY (nace_version, nace_code, language)
);
";

/// Apply the full DDL: the seven temporal tables, their staging companions, the two control
/// tables, and the two auxiliary lookup tables (§3). Idempotent: every statement is
/// `CREATE TABLE IF NOT EXISTS`.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let mut statements = String::new();
    for table in TableName::DEPENDENCY_ORDER {
        statements.push_str(&target_ddl(table));
        statements.push('\n');
        statements.push_str(&staging_ddl(table));
        statements.push('\n');
    }
    statements.push_str(CONTROL_DDL);
    statements.push_str(AUX_DDL);
    conn.execute_batch(&statements).context(SchemaSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
    }

    #[test]
    fn every_temporal_and_staging_table_is_created() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        for table in TableName::DEPENDENCY_ORDER {
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {}", table.db_name()), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0);
            let count: i64 = conn
                .query_row(&format!("SELECT count(*) FROM {}", table.staging_name()), [], |r| r.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }
    }
}
