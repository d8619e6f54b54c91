use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension};

use crate::models::{Role, User};

/// A user row together with the secrets needed to check a password.
pub(crate) struct StoredCredentials {
    pub(crate) user: User,
    /// PHC string, salt included.
    pub(crate) password_hash: String,
}

pub(crate) fn create_user(conn: &Connection, email: &str, password_hash: &str) -> Result<User> {
    conn.execute(
        "INSERT INTO users (email, password_hash) VALUES (?1, ?2)",
        params![email, password_hash],
    )
    .map_err(|err| map_unique_constraint(err, email))
    .context("failed to insert user")?;

    let id = conn.last_insert_rowid();
    conn.query_row(
        "SELECT id, email, created_at FROM users WHERE id = ?1",
        [id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .context("failed to reload user")
}

/// Email lookups are case-insensitive (the column uses `COLLATE NOCASE`).
pub(crate) fn find_credentials(conn: &Connection, email: &str) -> Result<Option<StoredCredentials>> {
    conn.query_row(
        "SELECT id, email, created_at, password_hash FROM users WHERE email = ?1",
        [email],
        |row| {
            Ok(StoredCredentials {
                user: User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    created_at: row.get(2)?,
                },
                password_hash: row.get(3)?,
            })
        },
    )
    .optional()
    .context("failed to load user")
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    Ok(find_credentials(conn, email)?.map(|stored| stored.user))
}

/// Grant `role` to a user. Granting twice is a no-op.
pub fn grant_role(conn: &Connection, user_id: i64, role: Role) -> Result<()> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role)
             SELECT id, ?2 FROM users WHERE id = ?1",
            params![user_id, role.as_str()],
        )
        .context("failed to grant role")?;

    if inserted == 0 && !user_exists(conn, user_id)? {
        Err(anyhow!("User not found"))
    } else {
        Ok(())
    }
}

pub fn revoke_role(conn: &Connection, user_id: i64, role: Role) -> Result<()> {
    conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2",
        params![user_id, role.as_str()],
    )
    .context("failed to revoke role")?;
    Ok(())
}

pub fn has_role(conn: &Connection, user_id: i64, role: Role) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM user_roles WHERE user_id = ?1 AND role = ?2",
        params![user_id, role.as_str()],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .context("failed to check role")
}

fn user_exists(conn: &Connection, user_id: i64) -> Result<bool> {
    conn.query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .context("failed to check user")
}

/// Turn the unique-email violation into a readable message.
fn map_unique_constraint(err: SqlError, email: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        anyhow!("An account for {email} already exists.")
    } else {
        err.into()
    }
}
