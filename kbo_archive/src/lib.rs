//! Random-access reading of a KBO-style registry archive: a ZIP of CSVs plus a `meta.csv`
//! describing the extract (§4.1).
//!
//! The archive is read by entry name rather than streamed end to end, matching ZIP's
//! central-directory design: [`Archive::open`] indexes the central directory once, and each
//! call to [`Archive::csv_rows`] or [`Archive::read_entry_bytes`] seeks directly to one entry.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

mod csv_rows;
mod error;
mod metadata;

pub use csv_rows::{CsvRow, CsvRows};
pub use error::{Error, Result};
pub use metadata::Metadata;

use observability_deps::tracing::debug;
use snafu::ResultExt;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// An opened archive. Holds the ZIP central directory and the raw bytes; individual entries
/// are decompressed on demand.
///
/// All methods take `&mut self`: the underlying [`zip::ZipArchive`] only supports one entry
/// being read at a time, matching §4.1's "the archive permits at most one reader at a time".
pub struct Archive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl Archive {
    /// Open an archive from its raw bytes, indexing the ZIP central directory.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes)).context(error::ArchiveInvalidSnafu)?;
        Ok(Self { zip })
    }

    /// The names of every entry in the archive, in central-directory order.
    pub fn entry_names(&self) -> Vec<String> {
        self.zip.file_names().map(ToString::to_string).collect()
    }

    /// Whether an entry with this exact name exists.
    pub fn has_entry(&self, name: &str) -> bool {
        self.zip.file_names().any(|n| n == name)
    }

    /// Read one entry's full decompressed bytes.
    ///
    /// Fails with [`Error::EntryNotFound`] if absent; callers that treat a missing
    /// `_delete`/`_insert` CSV as "zero rows" (§7) must check [`Archive::has_entry`] first or
    /// match on that variant specifically.
    pub fn read_entry_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .zip
            .by_name(name)
            .map_err(|_| Error::EntryNotFound {
                name: name.to_string(),
            })?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf).context(error::ArchiveIoSnafu)?;
        Ok(buf)
    }

    /// Parse one entry as CSV, producing rows lazily (§4.1: "Rows are produced lazily to
    /// bound memory for million-row files").
    pub fn csv_rows(&mut self, name: &str, has_header: bool) -> Result<CsvRows> {
        let bytes = self.read_entry_bytes(name)?;
        debug!(entry = name, bytes = bytes.len(), "read archive entry");
        CsvRows::new(name.to_string(), bytes, has_header)
    }

    /// Parse `meta.csv` into a [`Metadata`] (§4.1).
    pub fn read_metadata(&mut self) -> Result<Metadata> {
        let bytes = self.read_entry_bytes("meta.csv")?;
        metadata::parse(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::default();
            for (name, contents) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn reads_metadata_and_entries() {
        let bytes = build_archive(&[
            ("meta.csv", "Variable,Value\nSnapshotDate,05-10-2025\nExtractNumber,140\nExtractType,full\n"),
            ("enterprise.csv", "EnterpriseNumber,Status\n0100.100.100,AC\n"),
        ]);
        let mut archive = Archive::open(bytes).unwrap();
        let meta = archive.read_metadata().unwrap();
        assert_eq!(meta.extract_number, 140);

        let rows: Vec<_> = archive
            .csv_rows("enterprise.csv", true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn missing_entry_is_entry_not_found() {
        let bytes = build_archive(&[("meta.csv", "SnapshotDate,05-10-2025\nExtractNumber,1\nExtractType,full\n")]);
        let mut archive = Archive::open(bytes).unwrap();
        let err = archive.csv_rows("denomination_delete.csv", false).unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
    }

    #[test]
    fn invalid_zip_bytes_fail_to_open() {
        let err = Archive::open(b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::ArchiveInvalid { .. }));
    }
}
