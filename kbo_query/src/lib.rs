//! Temporal Query Builder (§4.7): pure SQL construction for current and point-in-time reads.
//!
//! Nothing in this crate touches a connection. Every function returns a [`Query`] — SQL text
//! with `?` placeholders plus the bind values in order — so that callers (and this crate's own
//! tests) never string-concatenate a value that came from outside the process (§9 security
//! note: SQL text is built only from fixed, compiled-in column/table names).
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

use kbo_types::TableName;

/// A bound SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Int(i64),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

/// Which version of history a query reconstructs (§4.7, §3.2 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Only rows with `_is_current = true`.
    Current,
    /// The state as of extract `N`: `_extract_number <= N` and either never superseded or
    /// superseded at an extract after `N`, deduplicated to the latest qualifying row.
    PointInTime(i64),
}

/// SQL text with its bind parameters, in the order they appear as `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<Param>,
}

/// The column joining a composite-ID table (or `establishments`) back to its owning entity.
fn child_key_column(table: TableName) -> &'static str {
    match table {
        TableName::Establishments => "enterprise_number",
        _ => "entity_number",
    }
}

/// Query one child table (a composite-ID table, or `establishments`) for a single parent entity
/// (§4.7).
///
/// `partition_key` is the column point-in-time reconstruction deduplicates on — `id` for
/// composite-ID tables, `establishment_number` for `establishments`.
pub fn child_table_query(
    table: TableName,
    columns: &[&str],
    entity_number: &str,
    filter: Filter,
    order_by: Option<&str>,
    partition_key: &str,
) -> Query {
    let key_column = child_key_column(table);
    let mut params = vec![Param::from(entity_number)];
    let base = format!("SELECT {} FROM {} WHERE {key_column} = ?", columns.join(", "), table.db_name());

    build(base, &mut params, filter, order_by, partition_key, "t")
}

/// Query a natural-key table (`enterprises`/`establishments`) starting from an arbitrary
/// `from_expr` (typically the table name itself, occasionally a pre-filtered subquery) and an
/// optional additional `where_clause`, both fixed compiled-in SQL fragments — never
/// user-supplied text (§4.7, §9).
pub fn point_in_time_query(
    columns: &[&str],
    from_expr: &str,
    where_clause: Option<&str>,
    partition_key: &str,
    order_by: Option<&str>,
    filter: Filter,
) -> Query {
    let mut params = Vec::new();
    let mut base = format!("SELECT {} FROM {from_expr}", columns.join(", "));
    if let Some(clause) = where_clause {
        base.push_str(" WHERE ");
        base.push_str(clause);
    }
    build(base, &mut params, filter, order_by, partition_key, "t")
}

fn build(base: String, params: &mut Vec<Param>, filter: Filter, order_by: Option<&str>, partition_key: &str, alias: &str) -> Query {
    match filter {
        Filter::Current => {
            let joiner = if base.to_ascii_uppercase().contains(" WHERE ") { "AND" } else { "WHERE" };
            let mut sql = format!("{base} {joiner} _is_current = true");
            if let Some(order_by) = order_by {
                sql.push_str(&format!(" ORDER BY {order_by}"));
            }
            Query { sql, params: params.clone() }
        }
        Filter::PointInTime(extract_number) => {
            let joiner = if base.to_ascii_uppercase().contains(" WHERE ") { "AND" } else { "WHERE" };
            let inner = format!(
                "{base} {joiner} _extract_number <= ? AND (_deleted_at_extract IS NULL OR _deleted_at_extract > ?)"
            );
            params.push(Param::Int(extract_number));
            params.push(Param::Int(extract_number));
            let mut sql = format!(
                "SELECT {alias}.* FROM ( \
                     SELECT *, ROW_NUMBER() OVER (PARTITION BY {partition_key} ORDER BY _extract_number DESC, _snapshot_date DESC) AS rn \
                     FROM ({inner}) \
                 ) {alias} WHERE {alias}.rn = 1"
            );
            if let Some(order_by) = order_by {
                sql.push_str(&format!(" ORDER BY {order_by}"));
            }
            Query { sql, params: params.clone() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_child_query_binds_the_entity_number_not_concatenates_it() {
        let query = child_table_query(
            TableName::Addresses,
            &["id", "street_nl"],
            "1234.567.890",
            Filter::Current,
            None,
            "id",
        );
        assert!(!query.sql.contains("1234.567.890"));
        assert_eq!(query.params, vec![Param::from("1234.567.890")]);
        assert!(query.sql.contains("entity_number = ?"));
        assert!(query.sql.contains("_is_current = true"));
    }

    #[test]
    fn point_in_time_child_query_wraps_with_a_row_number_window() {
        let query = child_table_query(
            TableName::Denominations,
            &["id", "denomination"],
            "1234.567.890",
            Filter::PointInTime(140),
            None,
            "id",
        );
        assert!(query.sql.contains("ROW_NUMBER() OVER (PARTITION BY id"));
        assert!(query.sql.contains("rn = 1"));
        assert_eq!(query.params, vec![Param::from("1234.567.890"), Param::Int(140), Param::Int(140)]);
    }

    #[test]
    fn establishments_are_joined_by_enterprise_number() {
        let query = child_table_query(TableName::Establishments, &["establishment_number"], "1234.567.890", Filter::Current, None, "establishment_number");
        assert!(query.sql.contains("enterprise_number = ?"));
    }

    #[test]
    fn point_in_time_query_over_enterprises_applies_the_window_and_order_by() {
        let query = point_in_time_query(
            &["enterprise_number", "primary_name"],
            "enterprises",
            None,
            "enterprise_number",
            Some("enterprise_number"),
            Filter::PointInTime(140),
        );
        assert!(query.sql.starts_with("SELECT t.* FROM"));
        assert!(query.sql.ends_with("ORDER BY enterprise_number"));
        assert_eq!(query.params, vec![Param::Int(140), Param::Int(140)]);
    }
}
