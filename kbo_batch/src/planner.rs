use crate::error::Result;
use duckdb::Connection;
use kbo_types::{BatchState, BatchStatusRow, JobId, Operation, TableBatchCounts, TableName};
use std::collections::BTreeMap;

/// Split `staged_rows` into `⌈staged_rows / batch_size⌉` `(lo, hi)` ranges, 1-based and
/// inclusive, matching `row_sequence` numbering (§4.3).
fn batch_ranges(staged_rows: i64, batch_size: i64) -> Vec<(i64, i64)> {
    if staged_rows == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    let mut lo = 1;
    while lo <= staged_rows {
        let hi = (lo + batch_size - 1).min(staged_rows);
        ranges.push((lo, hi));
        lo = hi + 1;
    }
    ranges
}

/// Count staged rows for every `(table, operation)` pair and slice them into `BatchStatusRow`s
/// in `DEPENDENCY_ORDER`, deletes before inserts per table (§4.4).
///
/// Does not persist anything; the caller hands the result to [`kbo_catalog::batches::plan`].
pub fn plan_batches(conn: &Connection, job_id: JobId, batch_size: i64) -> Result<(Vec<BatchStatusRow>, BTreeMap<TableName, TableBatchCounts>)> {
    let mut batches = Vec::new();
    let mut counts_by_table = BTreeMap::new();

    for table in TableName::DEPENDENCY_ORDER {
        let mut counts = TableBatchCounts::default();

        for operation in [Operation::Delete, Operation::Insert] {
            let staged_rows = kbo_catalog::staging::count(conn, table, job_id, operation)?;
            let ranges = batch_ranges(staged_rows, batch_size);
            match operation {
                Operation::Delete => counts.delete_batches = ranges.len() as i64,
                Operation::Insert => counts.insert_batches = ranges.len() as i64,
            }
            for (batch_index, (lo, hi)) in ranges.into_iter().enumerate() {
                batches.push(BatchStatusRow {
                    table,
                    operation,
                    batch_index: batch_index as i64,
                    row_sequence_lo: lo,
                    row_sequence_hi: hi,
                    state: BatchState::Pending,
                    attempt: 0,
                    last_error: None,
                    rows_affected: None,
                });
            }
        }

        counts_by_table.insert(table, counts);
    }

    Ok((batches, counts_by_table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ranges_covers_every_row_exactly_once() {
        let ranges = batch_ranges(25_000, 10_000);
        assert_eq!(ranges, vec![(1, 10_000), (10_001, 20_000), (20_001, 25_000)]);
    }

    #[test]
    fn batch_ranges_of_zero_rows_is_empty() {
        assert_eq!(batch_ranges(0, 10_000), Vec::new());
    }

    #[test]
    fn batch_ranges_of_fewer_rows_than_batch_size_is_one_batch() {
        assert_eq!(batch_ranges(42, 10_000), vec![(1, 42)]);
    }

    #[test]
    fn plan_batches_schedules_deletes_before_inserts_per_table() {
        let conn = Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let job_id = JobId::new();
        kbo_catalog::staging::append_rows(
            &conn,
            TableName::Enterprises,
            job_id,
            Operation::Insert,
            &[kbo_catalog::staging::StagedRow {
                row_sequence: 1,
                natural_key: "1234.567.890".into(),
                entity_type: None,
                business_values: vec![Some("1234.567.890".into()), None, None, None, None, None, None, None, None, None, None, None],
            }],
        )
        .unwrap();

        let (batches, counts) = plan_batches(&conn, job_id, 10_000).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].operation, Operation::Insert);
        assert_eq!(counts[&TableName::Enterprises].insert_batches, 1);
        assert_eq!(counts[&TableName::Enterprises].delete_batches, 0);
    }
}
