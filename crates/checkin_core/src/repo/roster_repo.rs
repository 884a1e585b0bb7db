//! Roster collection contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read athletes with their team/class assignments and approval flag.
//! - Offer the minimal write surface roster management needs
//!   (register, update, approve).
//!
//! # Invariants
//! - Reconciliation and check-in only ever use `RosterRepository` (read-only).
//! - Listing order is `name ASC, id ASC`.

use super::{
    decode_flag, decode_names, encode_names, ensure_connection_ready, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::athlete::{Athlete, AthleteId};
use rusqlite::{params, Connection, Row};

const ROSTER_TABLE: &str = "athletes";

const ROSTER_SELECT_SQL: &str = "SELECT
    id,
    name,
    teams,
    classes,
    is_approved
FROM athletes";

/// Read-only roster access.
pub trait RosterRepository {
    fn list_athletes(&self) -> RepoResult<Vec<Athlete>>;
    fn get_athlete(&self, id: AthleteId) -> RepoResult<Option<Athlete>>;
}

/// Write access used by roster management.
pub trait RosterWriter {
    /// Inserts or fully replaces one athlete document.
    fn upsert_athlete(&self, athlete: &Athlete) -> RepoResult<()>;
    fn set_approved(&self, id: AthleteId, approved: bool) -> RepoResult<()>;
}

impl<T: RosterRepository + ?Sized> RosterRepository for &T {
    fn list_athletes(&self) -> RepoResult<Vec<Athlete>> {
        (**self).list_athletes()
    }

    fn get_athlete(&self, id: AthleteId) -> RepoResult<Option<Athlete>> {
        (**self).get_athlete(id)
    }
}

impl<T: RosterWriter + ?Sized> RosterWriter for &T {
    fn upsert_athlete(&self, athlete: &Athlete) -> RepoResult<()> {
        (**self).upsert_athlete(athlete)
    }

    fn set_approved(&self, id: AthleteId, approved: bool) -> RepoResult<()> {
        (**self).set_approved(id, approved)
    }
}

/// SQLite-backed roster.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ROSTER_TABLE)?;
        Ok(Self { conn })
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn list_athletes(&self) -> RepoResult<Vec<Athlete>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROSTER_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut athletes = Vec::new();
        while let Some(row) = rows.next()? {
            athletes.push(parse_athlete_row(row)?);
        }
        Ok(athletes)
    }

    fn get_athlete(&self, id: AthleteId) -> RepoResult<Option<Athlete>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROSTER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_athlete_row(row)?));
        }
        Ok(None)
    }
}

impl RosterWriter for SqliteRosterRepository<'_> {
    fn upsert_athlete(&self, athlete: &Athlete) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO athletes (id, name, teams, classes, is_approved)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                teams = excluded.teams,
                classes = excluded.classes,
                is_approved = excluded.is_approved,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                athlete.id.to_string(),
                athlete.name.as_str(),
                encode_names(&athlete.teams)?,
                encode_names(&athlete.classes)?,
                i64::from(athlete.is_approved),
            ],
        )?;
        Ok(())
    }

    fn set_approved(&self, id: AthleteId, approved: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE athletes
             SET
                is_approved = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![i64::from(approved), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                collection: ROSTER_TABLE,
                id,
            });
        }
        Ok(())
    }
}

fn parse_athlete_row(row: &Row<'_>) -> RepoResult<Athlete> {
    let id_text: String = row.get("id")?;
    let teams_json: String = row.get("teams")?;
    let classes_json: String = row.get("classes")?;
    let is_approved = decode_flag(row.get("is_approved")?, "athletes.is_approved")?;

    Ok(Athlete {
        id: parse_uuid(&id_text, "athletes.id")?,
        name: row.get("name")?,
        teams: decode_names(&teams_json, "athletes.teams")?,
        classes: decode_names(&classes_json, "athletes.classes")?,
        is_approved,
    })
}
