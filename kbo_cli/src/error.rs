use thiserror::Error;

/// The CLI binary's leaf error type: every library error is a variant here, wrapped just deep
/// enough to print and exit (§10.2). Unlike the library crates it wraps, there is nothing
/// upstream of this type to compose further.
#[derive(Debug, Error)]
pub enum Error {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog error: {0}")]
    Catalog(#[from] kbo_catalog::Error),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] kbo_orchestrator::Error),

    #[error("serializing output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid job id {0:?}")]
    InvalidJobId(String),

    #[error("unknown table {0:?}, expected one of the seven KBO temporal tables")]
    UnknownTable(String),

    #[error("invalid operation {0:?}, expected \"insert\" or \"delete\"")]
    InvalidOperation(String),
}

/// Convenience alias for this binary's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
