//! Repository layer: persistence contracts for the stored collections.
//!
//! # Responsibility
//! - Define collection-oriented data access contracts (ledger, log store,
//!   roster, coaches) so services never see SQL.
//! - Provide SQLite implementations over a migrated connection.
//!
//! # Invariants
//! - SQLite repositories are only constructed over a fully migrated schema.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories never publish change notifications; services do.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod coach_repo;
pub mod ledger_repo;
pub mod log_repo;
pub mod roster_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for any collection.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target document does not exist.
    NotFound {
        collection: &'static str,
        id: Uuid,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Store refused the write or could not be reached.
    Rejected(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} document not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Rejected(message) => write!(f, "store rejected operation: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "repository requires table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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

/// Verifies schema version and that `table` exists.
pub(crate) fn ensure_connection_ready(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn encode_names(names: &BTreeSet<String>) -> RepoResult<String> {
    serde_json::to_string(names)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode assignment names: {err}")))
}

pub(crate) fn decode_names(json: &str, column: &str) -> RepoResult<BTreeSet<String>> {
    serde_json::from_str(json)
        .map_err(|err| RepoError::InvalidData(format!("invalid name list in {column}: {err}")))
}

/// SQLite stores booleans as 0/1; anything else is corrupt data.
pub(crate) fn decode_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
