use once_cell::sync::Lazy;
use regex::Regex;

static DDMMYYYY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").unwrap());

/// A column is treated as a date column if its lowercased name contains `date` (§4.2), e.g.
/// `StartDate`, `SnapshotDate`, `date_strike`.
pub fn is_date_column(db_column_name: &str) -> bool {
    db_column_name.to_ascii_lowercase().contains("date")
}

/// Rewrite a `DD-MM-YYYY` value to `YYYY-MM-DD`.
///
/// Values that don't match the expected pattern are returned unchanged: the mapper narrows
/// and rewrites known-good data, it doesn't validate it (validation of malformed source data is
/// out of scope for this component; a value that fails to convert is stored as-is and will
/// simply fail to compare correctly as a date downstream).
pub fn convert_date_value(value: &str) -> String {
    match DDMMYYYY.captures(value) {
        Some(caps) => format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_date_columns_case_insensitively() {
        assert!(is_date_column("StartDate"));
        assert!(is_date_column("snapshot_date"));
        assert!(!is_date_column("EnterpriseNumber"));
    }

    #[test]
    fn converts_ddmmyyyy_to_iso() {
        assert_eq!(convert_date_value("05-10-2025"), "2025-10-05");
        assert_eq!(convert_date_value("31-12-1999"), "1999-12-31");
    }

    #[test]
    fn leaves_non_matching_values_unchanged() {
        assert_eq!(convert_date_value("2025-10-05"), "2025-10-05");
        assert_eq!(convert_date_value(""), "");
        assert_eq!(convert_date_value("not a date"), "not a date");
    }
}
