//! Batch planning and execution (§4.4, §4.5): slices a job's staged rows into durable,
//! idempotent checkpoints and runs each one as a single DuckDB statement.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_docs, clippy::use_self)]

mod error;
mod executor;
mod planner;

pub use error::{Error, Result};
pub use executor::{process_batch, BatchResult, ExtractContext};
pub use planner::plan_batches;
