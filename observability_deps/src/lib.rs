//! Observability ecosystem dependencies, to ensure consistent versions and unified updates.
//!
//! Every crate in this workspace logs through `observability_deps::tracing` rather than
//! depending on `tracing` directly, so the whole workspace moves to a new `tracing` release
//! in one place.

pub use tracing;
