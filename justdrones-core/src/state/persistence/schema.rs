use rusqlite::{Connection, Result as SqlResult};

/// Schema version for the settings store.
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables and record the schema version.
pub fn create_tables(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per key; a key holds either a number or a blob.
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    number REAL,
    blob BLOB
);
";
