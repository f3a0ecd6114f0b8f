use crate::error::Result;
use duckdb::Connection;
use kbo_catalog::ScratchDirs;
use kbo_types::Limits;
use std::path::PathBuf;

/// Runtime configuration shared by every subcommand (§10.3): one struct, `#[clap(flatten)]`-ed
/// into the top-level parser, every field also settable by an environment variable so the same
/// binary runs unchanged whether invoked by hand or by a durable-workflow runtime.
#[derive(Debug, Clone, clap::Parser)]
pub struct Config {
    /// Path to the DuckDB database file. Use `:memory:` for an ephemeral run.
    #[clap(long = "db-path", env = "KBO_DB_PATH", default_value = "kbo.duckdb")]
    pub db_path: String,

    /// Base directory for DuckDB's temp/extension/scratch files (§6). Created if missing.
    #[clap(long = "scratch-dir", env = "KBO_SCRATCH_DIR", default_value = "./kbo-scratch")]
    pub scratch_dir: PathBuf,

    /// Rows per planned batch (§4.4).
    #[clap(long = "batch-size", env = "KBO_BATCH_SIZE", default_value_t = kbo_types::DEFAULT_BATCH_SIZE)]
    pub batch_size: i64,

    /// Seconds a batch may sit `running` before the stale-lock sweeper resets it to `pending`
    /// (§10.5).
    #[clap(
        long = "stale-lock-threshold-secs",
        env = "KBO_STALE_LOCK_THRESHOLD_SECS",
        default_value_t = kbo_types::DEFAULT_STALE_LOCK_THRESHOLD_SECS
    )]
    pub stale_lock_threshold_secs: i64,
}

impl Config {
    /// The [`Limits`] every façade call needs, derived from this config.
    pub fn limits(&self) -> Limits {
        Limits {
            batch_size: self.batch_size,
            stale_lock_threshold_secs: self.stale_lock_threshold_secs,
        }
    }

    /// Open a connection against `db_path`, configured with this run's [`ScratchDirs`].
    ///
    /// Per §6, exactly one connection is opened per invocation; the caller drops it when the
    /// command completes.
    pub fn open_connection(&self) -> Result<Connection> {
        let dirs = ScratchDirs::under(&self.scratch_dir)?;
        Ok(kbo_catalog::open(&self.db_path, &dirs)?)
    }
}
