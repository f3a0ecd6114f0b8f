use snafu::Snafu;

/// Errors raised by the Batch Planner and Batch Executor (§4.4, §4.5, §7).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("catalog error: {source}"))]
    Catalog { source: kbo_catalog::Error },

    #[snafu(display("batch execution failed: {source}"))]
    BatchFailed { source: duckdb::Error },
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<kbo_catalog::Error> for Error {
    fn from(source: kbo_catalog::Error) -> Self {
        Error::Catalog { source }
    }
}
