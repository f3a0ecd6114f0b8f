//! Staging Loader (§4.3): reads one archive's CSVs, narrows each row through the Column & Key
//! Mapper, and bulk-appends the result into the matching staging table.

use crate::error::{MissingColumnSnafu, Result, UnknownColumnSnafu};
use kbo_archive::Archive;
use kbo_catalog::staging::StagedRow;
use kbo_types::{EntityType, Operation, TableName};
use snafu::OptionExt;

/// What the Staging Loader found (or didn't) for one table of one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableLoadCounts {
    pub deleted: i64,
    pub inserted: i64,
}

/// Read every `<table>[_delete|_insert].csv` entry present in `archive` and append its rows to
/// the matching staging table, tagged with `job_id` (§4.3 steps 3-4).
///
/// A full archive carries one `<table>.csv` per table (all rows are inserts); an update
/// archive carries the `_delete`/`_insert` pair, either half of which may be absent. Missing
/// entries are zero rows, not an error (§7 `EntryNotFound`).
pub fn load_staging(
    conn: &duckdb::Connection,
    archive: &mut Archive,
    job_id: kbo_types::JobId,
    extract_type: kbo_types::ExtractType,
) -> Result<std::collections::BTreeMap<TableName, TableLoadCounts>> {
    let mut counts = std::collections::BTreeMap::new();

    for table in TableName::DEPENDENCY_ORDER {
        let mut table_counts = TableLoadCounts::default();

        match extract_type {
            kbo_types::ExtractType::Full => {
                let entry = format!("{}.csv", table.csv_name());
                if let Some(rows) = load_entry(archive, table, &entry)? {
                    table_counts.inserted = rows.len() as i64;
                    kbo_catalog::staging::append_rows(conn, table, job_id, Operation::Insert, &rows)?;
                }
            }
            kbo_types::ExtractType::Update => {
                let delete_entry = format!("{}_delete.csv", table.csv_name());
                if let Some(rows) = load_entry(archive, table, &delete_entry)? {
                    table_counts.deleted = rows.len() as i64;
                    kbo_catalog::staging::append_rows(conn, table, job_id, Operation::Delete, &rows)?;
                }

                let insert_entry = format!("{}_insert.csv", table.csv_name());
                if let Some(rows) = load_entry(archive, table, &insert_entry)? {
                    table_counts.inserted = rows.len() as i64;
                    kbo_catalog::staging::append_rows(conn, table, job_id, Operation::Insert, &rows)?;
                }
            }
        }

        counts.insert(table, table_counts);
    }

    Ok(counts)
}

fn load_entry(archive: &mut Archive, table: TableName, entry: &str) -> Result<Option<Vec<StagedRow>>> {
    if !archive.has_entry(entry) {
        return Ok(None);
    }
    let mut rows = archive.csv_rows(entry, true)?;
    let headers: Vec<String> = rows.headers().expect("entry was parsed with has_header=true").to_vec();
    let mut staged = Vec::new();
    for (zero_based_index, row) in rows.by_ref().enumerate() {
        let row = row?;
        let business_values = map_row_values(table, &headers, &row.fields)?;
        let (natural_key, entity_type) = derive_key(table, &business_values)?;
        staged.push(StagedRow {
            row_sequence: zero_based_index as i64 + 1,
            natural_key,
            entity_type: entity_type.map(|e| e.as_str()),
            business_values,
        });
    }
    Ok(Some(staged))
}

/// Map one CSV row's raw fields onto the table's business column positions, converting dates
/// and rejecting columns the schema doesn't recognize (§4.2, §9: "Unknown columns are
/// rejected, not silently ignored").
fn map_row_values(table: TableName, headers: &[String], fields: &[Option<String>]) -> Result<Vec<Option<String>>> {
    let business_columns = kbo_catalog::business_column_names(table);
    let mut values: Vec<Option<String>> = vec![None; business_columns.len()];

    for (i, header) in headers.iter().enumerate() {
        let db_column = kbo_schema::csv_column_to_db_column_for_table(table.csv_name(), header);
        let Some(position) = business_columns.iter().position(|c| *c == db_column) else {
            return UnknownColumnSnafu {
                table: table.db_name().to_string(),
                column: db_column,
            }
            .fail();
        };
        let raw = fields.get(i).cloned().flatten();
        values[position] = match raw {
            Some(value) if kbo_schema::is_date_column(&db_column) => Some(kbo_schema::convert_date_value(&value)),
            other => other,
        };
    }

    Ok(values)
}

fn column_value<'a>(table: TableName, values: &'a [Option<String>], column: &str) -> Result<&'a str> {
    let business_columns = kbo_catalog::business_column_names(table);
    let position = business_columns
        .iter()
        .position(|c| *c == column)
        .unwrap_or_else(|| panic!("{column} is not a business column of {table}"));
    values
        .get(position)
        .and_then(|v| v.as_deref())
        .context(MissingColumnSnafu {
            table: table.db_name().to_string(),
            column: column.to_string(),
        })
}

/// Compute the natural key (and, for composite-ID tables, the entity type) a mapped row's
/// business values carry, per the derivation rules in §3.1/§4.2.
fn derive_key(table: TableName, values: &[Option<String>]) -> Result<(String, Option<EntityType>)> {
    match table {
        TableName::Enterprises => Ok((column_value(table, values, "enterprise_number")?.to_string(), None)),
        TableName::Establishments => Ok((column_value(table, values, "establishment_number")?.to_string(), None)),
        TableName::Denominations => {
            let entity_number = column_value(table, values, "entity_number")?;
            let entity_type = kbo_schema::entity_type_of(entity_number);
            let type_code = column_value(table, values, "type_of_denomination")?;
            let language = column_value(table, values, "language")?;
            let denomination = column_value(table, values, "denomination")?;
            let id = kbo_schema::denomination_id(entity_number, type_code, language, denomination);
            Ok((id, Some(entity_type)))
        }
        TableName::Addresses => {
            let entity_number = column_value(table, values, "entity_number")?;
            let entity_type = kbo_schema::entity_type_of(entity_number);
            let type_of_address = column_value(table, values, "type_of_address")?;
            let id = kbo_schema::address_id(entity_number, type_of_address);
            Ok((id, Some(entity_type)))
        }
        TableName::Activities => {
            let entity_number = column_value(table, values, "entity_number")?;
            let entity_type = kbo_schema::entity_type_of(entity_number);
            let group = column_value(table, values, "activity_group")?;
            let version = column_value(table, values, "version")?;
            let code = column_value(table, values, "nace_code")?;
            let classification = column_value(table, values, "classification")?;
            let id = kbo_schema::activity_id(entity_number, group, version, code, classification);
            Ok((id, Some(entity_type)))
        }
        TableName::Contacts => {
            let entity_number = column_value(table, values, "entity_number")?;
            let entity_type = kbo_schema::entity_type_of(entity_number);
            let entity_contact = column_value(table, values, "entity_contact")?;
            let contact_type = column_value(table, values, "contact_type")?;
            let value = column_value(table, values, "value")?;
            let id = kbo_schema::contact_id(entity_number, entity_contact, contact_type, value);
            Ok((id, Some(entity_type)))
        }
        TableName::Branches => {
            let entity_number = column_value(table, values, "entity_number")?;
            let entity_type = kbo_schema::entity_type_of(entity_number);
            let branch_number = column_value(table, values, "branch_number")?;
            let id = kbo_schema::branch_id(entity_number, branch_number);
            Ok((id, Some(entity_type)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbo_types::ExtractType;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_archive(entries: &[(&str, &str)]) -> Archive {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = FileOptions::default();
            for (name, contents) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        Archive::open(buf).unwrap()
    }

    #[test]
    fn full_archive_loads_every_table_present_as_inserts() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let mut archive = build_archive(&[(
            "enterprise.csv",
            "EnterpriseNumber,Status\n0100.100.100,AC\n0100.100.101,AC\n",
        )]);
        let job_id = kbo_types::JobId::new();
        let counts = load_staging(&conn, &mut archive, job_id, ExtractType::Full).unwrap();
        assert_eq!(counts[&TableName::Enterprises].inserted, 2);
        assert_eq!(
            kbo_catalog::staging::count(&conn, TableName::Enterprises, job_id, Operation::Insert).unwrap(),
            2
        );
    }

    #[test]
    fn update_archive_tolerates_a_missing_half() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let mut archive = build_archive(&[(
            "denomination_delete.csv",
            "EntityNumber,Language,TypeOfDenomination,Denomination\n0100.100.100,2,001,ACME\n",
        )]);
        let job_id = kbo_types::JobId::new();
        let counts = load_staging(&conn, &mut archive, job_id, ExtractType::Update).unwrap();
        assert_eq!(counts[&TableName::Denominations].deleted, 1);
        assert_eq!(counts[&TableName::Denominations].inserted, 0);
    }

    #[test]
    fn date_columns_are_converted_on_the_way_in() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let mut archive = build_archive(&[(
            "enterprise.csv",
            "EnterpriseNumber,StartDate\n0100.100.100,05-10-2025\n",
        )]);
        let job_id = kbo_types::JobId::new();
        load_staging(&conn, &mut archive, job_id, ExtractType::Full).unwrap();
        let start_date: String = conn
            .query_row(
                "SELECT start_date FROM staging_enterprises WHERE job_id = ?",
                duckdb::params![job_id.as_uuid().to_string()],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(start_date, "2025-10-05");
    }

    #[test]
    fn unknown_column_is_rejected() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let mut archive = build_archive(&[("enterprise.csv", "EnterpriseNumber,Nonsense\n0100.100.100,x\n")]);
        let job_id = kbo_types::JobId::new();
        let err = load_staging(&conn, &mut archive, job_id, ExtractType::Full).unwrap_err();
        assert_matches::assert_matches!(err, crate::Error::UnknownColumn { .. });
    }

    #[test]
    fn composite_id_tables_derive_their_id_and_entity_type() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        kbo_catalog::ensure_schema(&conn).unwrap();
        let mut archive = build_archive(&[(
            "denomination.csv",
            "EntityNumber,Language,TypeOfDenomination,Denomination\n0100.100.100,2,001,ACME\n",
        )]);
        let job_id = kbo_types::JobId::new();
        load_staging(&conn, &mut archive, job_id, ExtractType::Full).unwrap();
        let (id, entity_type): (String, String) = conn
            .query_row(
                "SELECT _natural_key, entity_type FROM staging_denominations WHERE job_id = ?",
                duckdb::params![job_id.as_uuid().to_string()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(id, kbo_schema::denomination_id("0100.100.100", "001", "2", "ACME"));
        assert_eq!(entity_type, "enterprise");
    }
}
