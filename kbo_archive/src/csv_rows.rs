use crate::error::{self, Result};
use snafu::ResultExt;
use std::io::Cursor;
use std::sync::Arc;

/// One row of a parsed CSV file. Empty fields are `None` per the archive's CSV dialect (§4.1,
/// §6): comma delimiter, `"`-quoted text, `""` escape, UTF-8, optional BOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub fields: Vec<Option<String>>,
}

impl CsvRow {
    /// Look up a field by its position in `headers`, returning `None` for both "column absent"
    /// and "value was empty".
    pub fn get<'a>(&'a self, headers: &[String], column: &str) -> Option<&'a str> {
        let idx = headers.iter().position(|h| h == column)?;
        self.fields.get(idx)?.as_deref()
    }
}

/// A lazy iterator over the rows of one archive entry.
///
/// Only the entry being iterated is held in memory as raw bytes; rows are parsed one at a
/// time so that a million-row `enterprise_insert.csv` doesn't require materializing a
/// million-element `Vec` up front.
pub struct CsvRows {
    name: String,
    reader: csv::Reader<Cursor<Vec<u8>>>,
    headers: Option<Arc<[String]>>,
}

impl CsvRows {
    pub(crate) fn new(name: String, bytes: Vec<u8>, has_header: bool) -> Result<Self> {
        let bytes = strip_bom(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(Cursor::new(bytes));

        let headers = if has_header {
            let mut records = reader.records();
            let header_record = records
                .next()
                .transpose()
                .with_context(|_| error::CsvInvalidSnafu { name: name.clone() })?;
            header_record.map(|record| {
                record
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .into()
            })
        } else {
            None
        };

        Ok(Self {
            name,
            reader,
            headers,
        })
    }

    /// The column names, if this entry was parsed with a header row.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }
}

impl Iterator for CsvRows {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => {
                let fields = record
                    .iter()
                    .map(|field| if field.is_empty() { None } else { Some(field.to_string()) })
                    .collect();
                Some(Ok(CsvRow { fields }))
            }
            Ok(false) => None,
            Err(source) => Some(Err(error::Error::CsvInvalid {
                name: self.name.clone(),
                source,
            })),
        }
    }
}

fn strip_bom(bytes: Vec<u8>) -> Vec<u8> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes[3..].to_vec()
    } else {
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_become_none() {
        let csv = b"A,B,C\n1,,3\n".to_vec();
        let mut rows = CsvRows::new("t.csv".into(), csv, true).unwrap();
        assert_eq!(rows.headers(), Some(&["A".to_string(), "B".to_string(), "C".to_string()][..]));
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.fields, vec![Some("1".into()), None, Some("3".into())]);
        assert!(rows.next().is_none());
    }

    #[test]
    fn quoted_fields_with_escaped_quotes() {
        let csv = b"Name\n\"O\"\"Brien, Inc.\"\n".to_vec();
        let mut rows = CsvRows::new("t.csv".into(), csv, true).unwrap();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.fields, vec![Some("O\"Brien, Inc.".into())]);
    }

    #[test]
    fn no_header_mode_yields_every_row_as_data() {
        let csv = b"1,2\n3,4\n".to_vec();
        let rows: Vec<_> = CsvRows::new("t.csv".into(), csv, false)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn bom_is_stripped() {
        let mut csv = vec![0xEF, 0xBB, 0xBF];
        csv.extend_from_slice(b"A\nx\n");
        let mut rows = CsvRows::new("t.csv".into(), csv, true).unwrap();
        assert_eq!(rows.headers(), Some(&["A".to_string()][..]));
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.fields, vec![Some("x".into())]);
    }
}
