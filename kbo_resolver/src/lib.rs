//! Primary-Name Resolver (§4.6).
//!
//! Runs once per job, after all its batches have succeeded. For every enterprise this job
//! inserted whose `primary_name` still equals its own `enterprise_number` (the Batch
//! Executor's insert placeholder, §4.5), it picks a denomination by priority — legal name
//! (`type_of_denomination = '001'`) before any other type, language preference Dutch > French >
//! unknown > German > English — and overwrites `primary_name` plus the per-language
//! denormalized fields.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

use duckdb::{params, Connection};
use observability_deps::tracing::info;
use snafu::{ResultExt, Snafu};

/// Errors raised while resolving primary names.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("primary-name resolution query failed: {source}"))]
    Query { source: duckdb::Error },
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// KBO language codes, in resolver priority order (highest first): Dutch, French, unknown,
/// German, English. Encoded as a `CASE` expression rather than a Rust-side lookup table so the
/// ranking happens inside the single `UPDATE ... FROM` statement below.
const LANGUAGE_RANK_CASE: &str = "CASE language WHEN '2' THEN 0 WHEN '1' THEN 1 WHEN '3' THEN 3 WHEN '4' THEN 4 ELSE 2 END";
const TYPE_RANK_CASE: &str = "CASE WHEN type_of_denomination = '001' THEN 0 ELSE 1 END";

fn best_denomination_subquery(language_filter: Option<&str>) -> String {
    let filter = match language_filter {
        Some(lang) => format!("AND language = '{lang}'"),
        None => String::new(),
    };
    format!(
        "(SELECT entity_number, denomination, language, \
              ROW_NUMBER() OVER (PARTITION BY entity_number ORDER BY {TYPE_RANK_CASE}, {LANGUAGE_RANK_CASE}) AS rn \
          FROM denominations WHERE _is_current = true {filter})"
    )
}

/// Resolve primary names for every still-placeholder enterprise current at `extract_number`.
/// Returns the number of enterprises updated (`names_resolved` in `finalize`'s result, §4.9).
pub fn resolve_primary_names(conn: &Connection, extract_number: i64) -> Result<i64> {
    let sql = format!(
        "UPDATE enterprises AS e \
         SET primary_name = best.denomination, \
             primary_name_language = best.language, \
             primary_name_nl = best_nl.denomination, \
             primary_name_fr = best_fr.denomination, \
             primary_name_de = best_de.denomination \
         FROM {best} best \
         LEFT JOIN {best_nl} best_nl ON best_nl.entity_number = best.entity_number AND best_nl.rn = 1 \
         LEFT JOIN {best_fr} best_fr ON best_fr.entity_number = best.entity_number AND best_fr.rn = 1 \
         LEFT JOIN {best_de} best_de ON best_de.entity_number = best.entity_number AND best_de.rn = 1 \
         WHERE best.entity_number = e.enterprise_number AND best.rn = 1 \
           AND e._is_current = true AND e._extract_number = ? \
           AND e.primary_name = e.enterprise_number",
        best = best_denomination_subquery(None),
        best_nl = best_denomination_subquery(Some("2")),
        best_fr = best_denomination_subquery(Some("1")),
        best_de = best_denomination_subquery(Some("3")),
    );
    let rows_affected = conn.execute(&sql, params![extract_number]).context(QuerySnafu)?;
    info!(extract_number, rows_affected, "resolved primary names");
    Ok(rows_affected as i64)
}
