use snafu::Snafu;

/// Errors raised by the Orchestrator Facade (§4.9, §7). Every variant maps onto one of the
/// error kinds §7 names so a caller can translate this into whatever shape the durable
/// runtime expects without losing the distinction drawn between them.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("archive error: {source}"))]
    Archive { source: kbo_archive::Error },

    #[snafu(display("catalog error: {source}"))]
    Catalog { source: kbo_catalog::Error },

    #[snafu(display("batch error: {source}"))]
    Batch { source: kbo_batch::Error },

    #[snafu(display("primary-name resolution error: {source}"))]
    Resolver { source: kbo_resolver::Error },

    #[snafu(display("staged row for table {table} is missing required column {column:?}"))]
    MissingColumn { table: String, column: String },

    #[snafu(display("staged row for table {table} has unknown column {column:?}"))]
    UnknownColumn { table: String, column: String },

    #[snafu(display("job {job_id} has not finished all of its batches"))]
    BatchesIncomplete { job_id: String },
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<kbo_archive::Error> for Error {
    fn from(source: kbo_archive::Error) -> Self {
        Error::Archive { source }
    }
}

impl From<kbo_catalog::Error> for Error {
    fn from(source: kbo_catalog::Error) -> Self {
        Error::Catalog { source }
    }
}

impl From<kbo_batch::Error> for Error {
    fn from(source: kbo_batch::Error) -> Self {
        Error::Batch { source }
    }
}

impl From<kbo_resolver::Error> for Error {
    fn from(source: kbo_resolver::Error) -> Self {
        Error::Resolver { source }
    }
}
