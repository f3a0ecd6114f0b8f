use snafu::Snafu;

/// Errors raised by the catalog layer (§7: `ArchiveInvalid`/`MetadataInvalid` are
/// `kbo_archive`'s concern; this crate raises the control-plane and storage kinds).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("failed to open duckdb database at {path}: {source}"))]
    Open { path: String, source: duckdb::Error },

    #[snafu(display("failed to configure duckdb connection: {source}"))]
    Configure { source: duckdb::Error },

    #[snafu(display("failed to apply catalog schema: {source}"))]
    Schema { source: duckdb::Error },

    #[snafu(display("duckdb query failed: {source}"))]
    Query { source: duckdb::Error },

    #[snafu(display("no import job found for id {job_id}"))]
    JobNotFound { job_id: String },

    #[snafu(display("a completed job already exists for extract {extract_number} ({extract_type})"))]
    DuplicateJob { extract_number: i64, extract_type: String },

    #[snafu(display("no batch_status row found for job {job_id}, table {table}, operation {operation}, batch {batch_index}"))]
    BatchNotFound {
        job_id: String,
        table: String,
        operation: String,
        batch_index: i64,
    },

    #[snafu(display("batch is already running (job {job_id}, table {table}, operation {operation}, batch {batch_index})"))]
    BatchBusy {
        job_id: String,
        table: String,
        operation: String,
        batch_index: i64,
    },
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
