//! DuckDB-backed storage for the KBO importer (§4.8, §6).
//!
//! This crate owns the schema (temporal tables, staging tables, the `import_jobs` and
//! `batch_status` control tables) and the repository-style functions that read and write them.
//! It deliberately has no opinion on *when* to call those functions — that's `kbo_orchestrator`.
//! Per §6, callers open exactly one [`duckdb::Connection`] per façade call via [`open`] and let
//! it drop (closing the connection) when the call completes.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

pub mod batches;
mod connection;
mod error;
pub mod jobs;
mod schema;
pub mod staging;

pub use batches::StartOutcome;
pub use connection::{open, ScratchDirs};
pub use error::{Error, Result};
pub use schema::{business_column_names, ensure_schema};
