use crate::error::{ConfigureSnafu, OpenSnafu, Result};
use duckdb::Connection;
use snafu::ResultExt;
use std::path::{Path, PathBuf};

/// Where DuckDB is allowed to write scratch, extension and temp-file state.
///
/// On an ephemeral-filesystem host (a serverless/FaaS-style `processBatch` invocation) these
/// must all point under a single writable temp location *before* any `ATTACH` happens, or
/// DuckDB falls back to paths beside the database file, which may not be writable (§6).
///
/// DuckDB's connection settings only distinguish `temp_directory` (spill/scratch files written
/// once the in-memory limit is exceeded) from `extension_directory`; there is no separate
/// "scratch" knob. `scratch_directory` is therefore the same path as `temp_directory` rather than
/// a third distinct location — §6's "scratch, extension, and temp directories all point at a
/// writable temp location" reads naturally as one location for both, and `configure` applies it
/// through `temp_directory`, the setting DuckDB actually exposes for that role.
#[derive(Debug, Clone)]
pub struct ScratchDirs {
    pub temp_directory: PathBuf,
    pub extension_directory: PathBuf,
    pub scratch_directory: PathBuf,
}

impl ScratchDirs {
    /// All three directories rooted under one writable base, created if missing.
    pub fn under(base: impl AsRef<Path>) -> std::io::Result<Self> {
        let base = base.as_ref();
        let temp_directory = base.join("tmp");
        let dirs = Self {
            temp_directory: temp_directory.clone(),
            extension_directory: base.join("extensions"),
            scratch_directory: temp_directory,
        };
        std::fs::create_dir_all(&dirs.temp_directory)?;
        std::fs::create_dir_all(&dirs.extension_directory)?;
        Ok(dirs)
    }
}

/// Open a connection to the database at `path` (or `:memory:` for tests) and configure it per
/// [`ScratchDirs`] before any attach or DDL runs.
///
/// Per §6, the engine opens exactly one connection per façade call; the caller is responsible
/// for dropping it (which closes the connection) when the call completes.
pub fn open(path: &str, dirs: &ScratchDirs) -> Result<Connection> {
    let conn = Connection::open(path).context(OpenSnafu { path })?;
    configure(&conn, dirs)?;
    Ok(conn)
}

fn configure(conn: &Connection, dirs: &ScratchDirs) -> Result<()> {
    conn.execute_batch(&format!(
        "SET temp_directory = '{}';\n\
         SET extension_directory = '{}';",
        dirs.temp_directory.display(),
        dirs.extension_directory.display(),
    ))
    .context(ConfigureSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dirs_are_created_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ScratchDirs::under(tmp.path()).unwrap();
        assert!(dirs.temp_directory.is_dir());
        assert!(dirs.extension_directory.is_dir());
        assert!(dirs.scratch_directory.is_dir());
        assert_eq!(dirs.scratch_directory, dirs.temp_directory);
    }

    #[test]
    fn open_configures_an_in_memory_connection_with_the_scratch_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = ScratchDirs::under(tmp.path()).unwrap();
        let conn = open(":memory:", &dirs).unwrap();
        let temp_dir: String = conn
            .query_row("SELECT current_setting('temp_directory')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(temp_dir, dirs.temp_directory.display().to_string());
        assert_eq!(temp_dir, dirs.scratch_directory.display().to_string());
    }
}
