use snafu::Snafu;

/// Errors raised by [`crate::Archive`] (§7: `ArchiveInvalid`, `MetadataInvalid`,
/// `EntryNotFound`).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("archive is not a valid ZIP: {source}"))]
    ArchiveInvalid { source: zip::result::ZipError },

    #[snafu(display("failed to read archive bytes: {source}"))]
    ArchiveIo { source: std::io::Error },

    #[snafu(display("archive entry {name:?} not found"))]
    EntryNotFound { name: String },

    #[snafu(display("archive entry {name:?} is not valid UTF-8: {source}"))]
    EntryNotUtf8 {
        name: String,
        source: std::string::FromUtf8Error,
    },

    #[snafu(display("malformed CSV in entry {name:?}: {source}"))]
    CsvInvalid { name: String, source: csv::Error },

    #[snafu(display("invalid metadata: {reason}"))]
    MetadataInvalid { reason: String },
}

/// A specialized [`Result`] for this crate's operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
