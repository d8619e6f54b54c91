use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Timestamp expression shared by every table, UTC with milliseconds so rows
/// created in quick succession still order predictably.
pub(crate) const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Open (creating if needed) the SQLite database at `path`, run lazy
/// migrations, and return a live connection. Foreign keys are switched on so
/// deleting a user cascades to its roles.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS persons (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                birth_date TEXT NOT NULL DEFAULT '',
                death_date TEXT NOT NULL DEFAULT '',
                image_url TEXT NOT NULL,
                fallback TEXT NOT NULL,
                prayer_audio TEXT,
                created_at TEXT NOT NULL DEFAULT ({NOW_SQL}),
                updated_at TEXT NOT NULL DEFAULT ({NOW_SQL})
            )"
        ),
        [],
    )
    .context("failed to create persons table")?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT ({NOW_SQL})
            )"
        ),
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_roles (
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            PRIMARY KEY (user_id, role),
            FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create user_roles table")?;

    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Read `PRAGMA user_version`, which tracks one-off data migrations.
pub(crate) fn schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("failed to read schema version")
}

pub(crate) fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))
        .context("failed to write schema version")
}
