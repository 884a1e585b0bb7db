//! Historical log store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one document per reset and list them for reporting.
//! - Replace a whole document by id for corrections.
//!
//! # Invariants
//! - The event sequence is stored as one JSON document column, so a replace
//!   never leaves a half-written event list behind.
//! - `list_logs` returns newest first (`created_at DESC, id ASC`).

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::checkin::CheckInEvent;
use crate::model::log_entry::{LogEntry, LogEntryId};
use rusqlite::{params, Connection, Row};

const LOG_TABLE: &str = "checkin_logs";

const LOG_SELECT_SQL: &str = "SELECT
    id,
    created_at,
    created_by,
    events,
    last_edited_at
FROM checkin_logs";

/// Repository interface for the log store collection.
pub trait LogRepository {
    fn create_log(&self, entry: &LogEntry) -> RepoResult<LogEntryId>;
    fn get_log(&self, id: LogEntryId) -> RepoResult<Option<LogEntry>>;
    fn list_logs(&self) -> RepoResult<Vec<LogEntry>>;
    /// Overwrites the stored document with `entry`.
    ///
    /// Returns `NotFound` when no document has `entry.id`.
    fn replace_log(&self, entry: &LogEntry) -> RepoResult<()>;
}

impl<T: LogRepository + ?Sized> LogRepository for &T {
    fn create_log(&self, entry: &LogEntry) -> RepoResult<LogEntryId> {
        (**self).create_log(entry)
    }

    fn get_log(&self, id: LogEntryId) -> RepoResult<Option<LogEntry>> {
        (**self).get_log(id)
    }

    fn list_logs(&self) -> RepoResult<Vec<LogEntry>> {
        (**self).list_logs()
    }

    fn replace_log(&self, entry: &LogEntry) -> RepoResult<()> {
        (**self).replace_log(entry)
    }
}

/// SQLite-backed log store.
pub struct SqliteLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, LOG_TABLE)?;
        Ok(Self { conn })
    }
}

impl LogRepository for SqliteLogRepository<'_> {
    fn create_log(&self, entry: &LogEntry) -> RepoResult<LogEntryId> {
        self.conn.execute(
            "INSERT INTO checkin_logs (
                id,
                created_at,
                created_by,
                events,
                last_edited_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id.to_string(),
                entry.created_at,
                entry.created_by.as_str(),
                encode_events(&entry.events)?,
                entry.last_edited_at,
            ],
        )?;
        Ok(entry.id)
    }

    fn get_log(&self, id: LogEntryId) -> RepoResult<Option<LogEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOG_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_log_row(row)?));
        }
        Ok(None)
    }

    fn list_logs(&self) -> RepoResult<Vec<LogEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOG_SELECT_SQL} ORDER BY created_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_log_row(row)?);
        }
        Ok(entries)
    }

    fn replace_log(&self, entry: &LogEntry) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE checkin_logs
             SET
                created_at = ?1,
                created_by = ?2,
                events = ?3,
                last_edited_at = ?4
             WHERE id = ?5;",
            params![
                entry.created_at,
                entry.created_by.as_str(),
                encode_events(&entry.events)?,
                entry.last_edited_at,
                entry.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                collection: LOG_TABLE,
                id: entry.id,
            });
        }
        Ok(())
    }
}

fn encode_events(events: &[CheckInEvent]) -> RepoResult<String> {
    serde_json::to_string(events)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode log events: {err}")))
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<LogEntry> {
    let id_text: String = row.get("id")?;
    let events_json: String = row.get("events")?;
    let events: Vec<CheckInEvent> = serde_json::from_str(&events_json).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid events document in checkin_logs.events for `{id_text}`: {err}"
        ))
    })?;

    Ok(LogEntry {
        id: parse_uuid(&id_text, "checkin_logs.id")?,
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        events,
        last_edited_at: row.get("last_edited_at")?,
    })
}
