//! Orchestrator Façade (§4.9): `prepare`, `processBatch`, `getProgress`, `finalize`, and the
//! stale-lock sweeper (§10.5) — the only entry points a durable-workflow runtime calls.
//!
//! Everything upstream of this crate (`kbo_archive`, `kbo_schema`, `kbo_catalog`, `kbo_batch`,
//! `kbo_resolver`) is a pure function or a narrow repository; this crate is where their call
//! order — stage, plan, execute, resolve, reconcile — lives.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

mod error;
mod facade;
mod loader;

pub use error::{Error, Result};
pub use facade::{finalize, get_progress, prepare, process_batch, sweep_stale_batches};
pub use loader::TableLoadCounts;
