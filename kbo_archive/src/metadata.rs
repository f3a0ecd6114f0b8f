use crate::error::{self, Result};
use kbo_types::ExtractType;
use snafu::{OptionExt, ResultExt};
use std::collections::HashMap;
use std::str::FromStr;

/// The parsed contents of an archive's `meta.csv` (§4.1, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub snapshot_date: chrono::NaiveDate,
    pub extract_number: i64,
    pub extract_type: ExtractType,
    pub extract_timestamp: Option<chrono::NaiveDateTime>,
    pub version: Option<String>,
}

/// Parse the raw `variable,value` rows of `meta.csv` into a [`Metadata`].
///
/// Tolerates an optional `Variable,Value` header row. Fails with [`error::Error::MetadataInvalid`]
/// if any required key (`SnapshotDate`, `ExtractNumber`, `ExtractType`) is missing or malformed.
pub(crate) fn parse(bytes: &[u8]) -> Result<Metadata> {
    let text = String::from_utf8(strip_bom(bytes).to_vec()).map_err(|source| {
        error::Error::EntryNotUtf8 {
            name: "meta.csv".to_string(),
            source,
        }
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut fields: HashMap<String, String> = HashMap::new();
    for record in reader.records() {
        let record = record.with_context(|_| error::CsvInvalidSnafu {
            name: "meta.csv".to_string(),
        })?;
        let Some(key) = record.get(0) else { continue };
        if key.eq_ignore_ascii_case("variable") {
            // header row
            continue;
        }
        let value = record.get(1).unwrap_or("").to_string();
        fields.insert(key.to_string(), value);
    }

    let snapshot_date_raw = fields
        .get("SnapshotDate")
        .context(error::MetadataInvalidSnafu {
            reason: "missing required key SnapshotDate".to_string(),
        })?;
    let snapshot_date =
        chrono::NaiveDate::parse_from_str(snapshot_date_raw, "%d-%m-%Y").map_err(|_| {
            error::Error::MetadataInvalid {
                reason: format!("SnapshotDate {snapshot_date_raw:?} is not DD-MM-YYYY"),
            }
        })?;

    let extract_number_raw =
        fields
            .get("ExtractNumber")
            .context(error::MetadataInvalidSnafu {
                reason: "missing required key ExtractNumber".to_string(),
            })?;
    let extract_number = extract_number_raw.trim().parse::<i64>().map_err(|_| {
        error::Error::MetadataInvalid {
            reason: format!("ExtractNumber {extract_number_raw:?} is not an integer"),
        }
    })?;

    let extract_type_raw = fields
        .get("ExtractType")
        .context(error::MetadataInvalidSnafu {
            reason: "missing required key ExtractType".to_string(),
        })?;
    let extract_type = ExtractType::from_str(extract_type_raw.trim().to_ascii_lowercase().as_str())
        .map_err(|_| error::Error::MetadataInvalid {
            reason: format!("ExtractType {extract_type_raw:?} must be \"full\" or \"update\""),
        })?;

    let extract_timestamp = fields
        .get("ExtractTimestamp")
        .filter(|s| !s.trim().is_empty())
        .and_then(|raw| {
            chrono::NaiveDateTime::parse_from_str(raw.trim(), "%d-%m-%Y %H:%M:%S")
                .ok()
                .or_else(|| {
                    chrono::NaiveDate::parse_from_str(raw.trim(), "%d-%m-%Y")
                        .ok()
                        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
                })
        });

    let version = fields
        .get("Version")
        .filter(|s| !s.trim().is_empty())
        .cloned();

    Ok(Metadata {
        snapshot_date,
        extract_number,
        extract_type,
        extract_timestamp,
        version,
    })
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_keys() {
        let csv = "Variable,Value\nSnapshotDate,05-10-2025\nExtractNumber,140\nExtractType,full\nExtractTimestamp,05-10-2025 03:00:00\nVersion,1\n";
        let meta = parse(csv.as_bytes()).unwrap();
        assert_eq!(
            meta.snapshot_date,
            chrono::NaiveDate::from_ymd_opt(2025, 10, 5).unwrap()
        );
        assert_eq!(meta.extract_number, 140);
        assert_eq!(meta.extract_type, ExtractType::Full);
        assert_eq!(meta.version.as_deref(), Some("1"));
    }

    #[test]
    fn tolerates_missing_header_row() {
        let csv = "SnapshotDate,05-10-2025\nExtractNumber,141\nExtractType,update\n";
        let meta = parse(csv.as_bytes()).unwrap();
        assert_eq!(meta.extract_number, 141);
        assert_eq!(meta.extract_type, ExtractType::Update);
        assert!(meta.extract_timestamp.is_none());
    }

    #[test]
    fn missing_required_key_fails() {
        let csv = "Variable,Value\nSnapshotDate,05-10-2025\nExtractType,full\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, error::Error::MetadataInvalid { .. }));
    }

    #[test]
    fn bad_extract_type_fails() {
        let csv = "SnapshotDate,05-10-2025\nExtractNumber,140\nExtractType,quarterly\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, error::Error::MetadataInvalid { .. }));
    }
}
