use kbo_time::Time;
use snafu::Snafu;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of an [`ImportJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh, random job id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (used when round-tripping through the catalog).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an archive is a monthly full snapshot or a daily incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ExtractType {
    Full,
    Update,
}

impl ExtractType {
    /// The string stored in `meta.csv`'s `ExtractType` value and in the DB.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractType::Full => "full",
            ExtractType::Update => "update",
        }
    }
}

impl fmt::Display for ExtractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing an [`ExtractType`] from a metadata string.
#[derive(Debug, Snafu)]
#[snafu(display("unrecognized ExtractType {value:?}, expected \"full\" or \"update\""))]
pub struct ParseExtractTypeError {
    value: String,
}

impl FromStr for ExtractType {
    type Err = ParseExtractTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(ExtractType::Full),
            "update" => Ok(ExtractType::Update),
            other => ParseExtractTypeSnafu { value: other }.fail(),
        }
    }
}

/// The lifecycle of an [`ImportJob`], advanced only by the Orchestrator Façade (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum JobStatus {
    Pending,
    Preparing,
    Processing,
    Finalizing,
    Completed,
    Failed,
}

impl JobStatus {
    /// The string stored in the `import_jobs.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Preparing => "preparing",
            JobStatus::Processing => "processing",
            JobStatus::Finalizing => "finalizing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A control-plane record tracking one archive's import from `prepare` through `finalize`.
///
/// See §3.4. Unique by `(extract_number, extract_type)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImportJob {
    pub id: JobId,
    pub extract_number: i64,
    pub extract_type: ExtractType,
    pub snapshot_date: chrono::NaiveDate,
    pub extract_timestamp: Option<chrono::NaiveDateTime>,
    pub status: JobStatus,
    pub started_at: Time,
    pub completed_at: Option<Time>,
    pub error_message: Option<String>,
    pub records_inserted: i64,
    pub records_deleted: i64,
    pub records_processed: i64,
    pub worker_type: String,
}

impl ImportJob {
    /// `records_processed` must always equal `records_inserted + records_deleted` (§4.5,
    /// invariant 4 in §8). `records_updated` is intentionally absent: this design models all
    /// mutation as insert-new + mark-old-historical.
    pub fn recompute_processed(&mut self) {
        self.records_processed = self.records_inserted + self.records_deleted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_type_round_trips_through_its_string_form() {
        assert_eq!("full".parse::<ExtractType>().unwrap(), ExtractType::Full);
        assert_eq!("update".parse::<ExtractType>().unwrap(), ExtractType::Update);
        assert!("quarterly".parse::<ExtractType>().is_err());
    }

    #[test]
    fn recompute_processed_sums_inserts_and_deletes() {
        let mut job = ImportJob {
            id: JobId::new(),
            extract_number: 140,
            extract_type: ExtractType::Full,
            snapshot_date: chrono::NaiveDate::from_ymd_opt(2025, 10, 5).unwrap(),
            extract_timestamp: None,
            status: JobStatus::Processing,
            started_at: Time::from_timestamp(0, 0),
            completed_at: None,
            error_message: None,
            records_inserted: 7,
            records_deleted: 3,
            records_processed: 0,
            worker_type: "full-import".into(),
        };
        job.recompute_processed();
        assert_eq!(job.records_processed, 10);
    }
}
