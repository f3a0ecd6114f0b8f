use crate::table::TableName;
use std::fmt;

/// Whether a batch applies the `_delete.csv` or the `_insert.csv` side of a table's staged rows.
///
/// Delete batches for a table are always scheduled before that table's insert batches (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Delete,
    Insert,
}

impl Operation {
    /// The string stored in the `operation` column of staging tables and `batch_status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Delete => "delete",
            Operation::Insert => "insert",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of one planned batch, advanced only by the Batch Executor (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BatchState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl BatchState {
    /// The string stored in the `batch_status.state` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Pending => "pending",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
            BatchState::Failed => "failed",
        }
    }

    /// Parse back from the DB string; unknown strings are a bug, not a recoverable condition,
    /// so callers match this against the small known set rather than treating it as `Option`.
    pub fn from_str_strict(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BatchState::Pending),
            "running" => Some(BatchState::Running),
            "completed" => Some(BatchState::Completed),
            "failed" => Some(BatchState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the `batch_status` control table: the unit of durability the Orchestrator
/// resumes from after a crash (§3.4, §5).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchStatusRow {
    pub table: TableName,
    pub operation: Operation,
    pub batch_index: i64,
    /// Inclusive lower bound of `row_sequence` (insert batches) or ordinal position among
    /// distinct deleted keys (delete batches) covered by this batch.
    pub row_sequence_lo: i64,
    /// Inclusive upper bound, same units as `row_sequence_lo`.
    pub row_sequence_hi: i64,
    pub state: BatchState,
    pub attempt: i32,
    pub last_error: Option<String>,
    pub rows_affected: Option<i64>,
}

impl BatchStatusRow {
    /// A stable ordering key matching the Batch Planner's required iteration order: table
    /// dependency order, deletes before inserts, then ascending batch index (§4.4).
    pub fn order_key(&self) -> (usize, u8, i64) {
        let table_rank = TableName::DEPENDENCY_ORDER
            .iter()
            .position(|t| *t == self.table)
            .expect("TableName::DEPENDENCY_ORDER covers every TableName variant");
        let op_rank = match self.operation {
            Operation::Delete => 0,
            Operation::Insert => 1,
        };
        (table_rank, op_rank, self.batch_index)
    }
}

/// Per-(table, operation) batch counts produced by the Batch Planner (§4.4) and surfaced in
/// [`crate::PlanSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableBatchCounts {
    pub delete_batches: i64,
    pub insert_batches: i64,
}

impl TableBatchCounts {
    pub fn total(&self) -> i64 {
        self.delete_batches + self.insert_batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(table: TableName, operation: Operation, batch_index: i64) -> BatchStatusRow {
        BatchStatusRow {
            table,
            operation,
            batch_index,
            row_sequence_lo: 1,
            row_sequence_hi: 10_000,
            state: BatchState::Pending,
            attempt: 0,
            last_error: None,
            rows_affected: None,
        }
    }

    #[test]
    fn order_key_puts_deletes_before_inserts_within_a_table() {
        let delete = row(TableName::Enterprises, Operation::Delete, 0);
        let insert = row(TableName::Enterprises, Operation::Insert, 0);
        assert!(delete.order_key() < insert.order_key());
    }

    #[test]
    fn order_key_respects_table_dependency_order() {
        let enterprises = row(TableName::Enterprises, Operation::Insert, 5);
        let branches = row(TableName::Branches, Operation::Delete, 0);
        assert!(enterprises.order_key() < branches.order_key());
    }

    #[test]
    fn batch_state_string_round_trips() {
        for state in [
            BatchState::Pending,
            BatchState::Running,
            BatchState::Completed,
            BatchState::Failed,
        ] {
            assert_eq!(BatchState::from_str_strict(state.as_str()), Some(state));
        }
    }
}
