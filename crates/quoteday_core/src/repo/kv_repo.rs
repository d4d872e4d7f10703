//! Key-value repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide string-keyed blob get/set/remove over the `kv_entries` table.
//! - Reject connections whose schema was not migrated.
//!
//! # Invariants
//! - `set_value` is an upsert: a key holds at most one value.
//! - Values are stored verbatim; encoding is the caller's concern.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

const KV_TABLE: &str = "kv_entries";
const KV_COLUMNS: &[&str] = &["key", "value", "updated_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for key-value persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "store schema is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "store schema is missing required column `{table}.{column}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string-keyed blob store.
pub trait KvRepository {
    /// Returns the stored value, or `None` when the key was never written.
    fn get_value(&self, key: &str) -> RepoResult<Option<String>>;
    /// Inserts or replaces the value under `key`.
    fn set_value(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes `key`. Returns whether a value existed.
    fn remove_value(&self, key: &str) -> RepoResult<bool>;
}

impl<R: KvRepository + ?Sized> KvRepository for &R {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get_value(key)
    }

    fn set_value(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).set_value(key, value)
    }

    fn remove_value(&self, key: &str) -> RepoResult<bool> {
        (**self).remove_value(key)
    }
}

/// SQLite-backed key-value repository.
///
/// Borrows the connection immutably, so several stores can share one
/// connection at the same time.
pub struct SqliteKvRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the connection
    ///   did not go through `open_db` / `open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_kv_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl KvRepository for SqliteKvRepository<'_> {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_value(&self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

fn ensure_kv_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, KV_TABLE)? {
        return Err(RepoError::MissingRequiredTable(KV_TABLE));
    }
    for &column in KV_COLUMNS {
        if !table_has_column(conn, KV_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: KV_TABLE,
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{KvRepository, RepoError, SqliteKvRepository};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn set_value_upserts_and_get_value_reads_back() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKvRepository::try_new(&conn).unwrap();

        assert_eq!(repo.get_value("k").unwrap(), None);
        repo.set_value("k", "first").unwrap();
        repo.set_value("k", "second").unwrap();
        assert_eq!(repo.get_value("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn remove_value_reports_whether_key_existed() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKvRepository::try_new(&conn).unwrap();
        repo.set_value("k", "v").unwrap();

        assert!(repo.remove_value("k").unwrap());
        assert!(!repo.remove_value("k").unwrap());
        assert_eq!(repo.get_value("k").unwrap(), None);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqliteKvRepository::try_new(&conn);
        assert!(matches!(
            result,
            Err(RepoError::MissingRequiredTable("kv_entries"))
        ));
    }
}
