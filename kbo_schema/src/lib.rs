//! Pure, side-effect-free mapping from raw KBO CSV shapes to the temporal DB schema (§4.2).
//!
//! Everything in this crate is a deterministic function of its inputs: column/table renaming,
//! date reformatting, entity-type inference, and composite ID derivation. None of it touches a
//! filesystem or a database connection — that's `kbo_archive` and `kbo_catalog`'s job.

mod columns;
mod dates;
mod entity_type;
mod ids;

pub use columns::{csv_column_to_db_column, csv_column_to_db_column_for_table, csv_table_to_db_table};
pub use dates::{convert_date_value, is_date_column};
pub use entity_type::entity_type_of;
pub use ids::{
    activity_id, address_id, branch_id, contact_id, denomination_id, short_hash, DENOMINATION_HASH_HEX_LEN,
};
