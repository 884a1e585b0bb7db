//! Live check-in ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store today's not-yet-archived check-in events.
//! - Support create-one, list-all and delete-many-by-id.
//!
//! # Invariants
//! - No uniqueness on (athlete, activity): repeated check-ins are all kept.
//! - Listing order is insertion order.
//! - `delete_events` is all-or-nothing and ignores ids that are already gone.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::activity::ActivityType;
use crate::model::checkin::{CheckInEvent, CheckInId};
use rusqlite::{params, Connection, Row};

const LEDGER_TABLE: &str = "current_checkins";

const LEDGER_SELECT_SQL: &str = "SELECT
    id,
    athlete_id,
    athlete_name,
    activity_type,
    activity_name,
    timestamp
FROM current_checkins";

/// Repository interface for the live ledger collection.
pub trait LedgerRepository {
    fn insert_event(&self, event: &CheckInEvent) -> RepoResult<CheckInId>;
    fn list_events(&self) -> RepoResult<Vec<CheckInEvent>>;
    /// Deletes the given events, returning how many rows were removed.
    fn delete_events(&self, ids: &[CheckInId]) -> RepoResult<usize>;
}

impl<T: LedgerRepository + ?Sized> LedgerRepository for &T {
    fn insert_event(&self, event: &CheckInEvent) -> RepoResult<CheckInId> {
        (**self).insert_event(event)
    }

    fn list_events(&self) -> RepoResult<Vec<CheckInEvent>> {
        (**self).list_events()
    }

    fn delete_events(&self, ids: &[CheckInId]) -> RepoResult<usize> {
        (**self).delete_events(ids)
    }
}

/// SQLite-backed ledger repository.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, LEDGER_TABLE)?;
        Ok(Self { conn })
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn insert_event(&self, event: &CheckInEvent) -> RepoResult<CheckInId> {
        self.conn.execute(
            "INSERT INTO current_checkins (
                id,
                athlete_id,
                athlete_name,
                activity_type,
                activity_name,
                timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.id.to_string(),
                event.athlete_id.to_string(),
                event.athlete_name.as_str(),
                event.activity_type.as_str(),
                event.activity_name.as_str(),
                event.timestamp,
            ],
        )?;
        Ok(event.id)
    }

    fn list_events(&self) -> RepoResult<Vec<CheckInEvent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LEDGER_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn delete_events(&self, ids: &[CheckInId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM current_checkins WHERE id = ?1;")?;
            for id in ids {
                removed += stmt.execute([id.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<CheckInEvent> {
    let id_text: String = row.get("id")?;
    let athlete_text: String = row.get("athlete_id")?;
    let type_text: String = row.get("activity_type")?;
    let activity_type = ActivityType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid activity type `{type_text}` in current_checkins.activity_type"
        ))
    })?;

    Ok(CheckInEvent {
        id: parse_uuid(&id_text, "current_checkins.id")?,
        athlete_id: parse_uuid(&athlete_text, "current_checkins.athlete_id")?,
        athlete_name: row.get("athlete_name")?,
        activity_type,
        activity_name: row.get("activity_name")?,
        timestamp: row.get("timestamp")?,
    })
}
