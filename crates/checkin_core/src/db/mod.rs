//! The attendance store: one SQLite file holding the roster, the live
//! ledger and the archived logs.
//!
//! # Invariants
//! - Callers only ever receive connections at `migrations::latest_version`.
//! - A file last written by a newer build is left untouched and refused.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the attendance store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file carries a schema this build does not know how to read.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "attendance store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "attendance store is at schema {db_version} but this build reads up to {latest_supported}; upgrade the kiosk software"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;

    #[test]
    fn schema_mismatch_message_names_both_versions() {
        let message = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 3,
        }
        .to_string();
        assert!(message.contains("schema 9"));
        assert!(message.contains("up to 3"));
    }
}
