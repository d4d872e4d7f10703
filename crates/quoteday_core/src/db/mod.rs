//! SQLite file holding QuoteDay's key-value blobs.
//!
//! # Responsibility
//! - Open the database that backs favorites, diary and note snapshots.
//! - Bring its `kv_entries` schema up to date before any store reads it.
//!
//! # Invariants
//! - The blob schema version lives in `PRAGMA user_version`.
//! - A file written by a newer QuoteDay is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created at `path`.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// A pragma, migration or statement failed on an open connection.
    Sqlite(rusqlite::Error),
    /// The file carries blob schema `found`; this build knows up to
    /// `supported`.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::Sqlite(_) => "db_sqlite_failed",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open quote store `{}`: {source}", path.display())
            }
            Self::Sqlite(err) => write!(f, "quote store query failed: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "quote store schema v{found} was written by a newer QuoteDay (this build supports up to v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
