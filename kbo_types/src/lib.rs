//! Shared data types for the KBO importer.
//!
//! This crate is deliberately inert: no I/O, no SQL, no ZIP/CSV parsing. It exists so that
//! `kbo_archive`, `kbo_schema`, `kbo_catalog`, `kbo_batch`, `kbo_resolver`, `kbo_query` and
//! `kbo_orchestrator` all agree on the shape of a job, a batch, and a table without depending
//! on each other.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]
#![allow(missing_docs)] // field-level docs on plain data structs would be pure noise here

mod batch;
mod job;
mod progress;
mod table;

pub use batch::{BatchState, BatchStatusRow, Operation, TableBatchCounts};
pub use job::{ExtractType, ImportJob, JobId, JobStatus, ParseExtractTypeError};
pub use progress::{FinalizeResult, NextBatch, OverallProgress, PlanSummary, ProgressSnapshot, TableProgress};
pub use table::{EntityType, TableName};

/// The one tunable knob the Staging Loader and Batch Planner share (§4.3): the number of rows
/// per batch. Smaller batches improve resumability at the cost of overhead; larger batches
/// shorten wall time at the risk of exceeding the per-call execution budget (§5).
pub const DEFAULT_BATCH_SIZE: i64 = 10_000;

/// How long a batch may sit in `running` before the stale-lock sweeper (§10.5, `StaleLock` in
/// §7) considers it abandoned and resets it to `pending`.
pub const DEFAULT_STALE_LOCK_THRESHOLD_SECS: i64 = 300;

/// Runtime limits threaded through the Batch Planner, Batch Executor and sweeper.
///
/// Kept as an explicit struct (rather than the constants above being read directly) so tests
/// can exercise small batch sizes and short stale-lock thresholds without behaving differently
/// from production in any other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub batch_size: i64,
    pub stale_lock_threshold_secs: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            stale_lock_threshold_secs: DEFAULT_STALE_LOCK_THRESHOLD_SECS,
        }
    }
}
