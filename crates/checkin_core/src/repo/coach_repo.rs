//! Coach account contracts and SQLite implementation.
//!
//! # Invariants
//! - Emails are unique ignoring case (`COLLATE NOCASE`).
//! - Password digests are only written through `insert_coach` and
//!   `set_password`, and only read through `password_hash`.
//! - Listing order is `name ASC, id ASC`.

use super::{
    decode_flag, decode_names, encode_names, ensure_connection_ready, parse_uuid, RepoError,
    RepoResult,
};
use crate::auth::password::PasswordHash;
use crate::model::coach::{Coach, CoachId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COACH_TABLE: &str = "coaches";

const COACH_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone,
    teams,
    classes,
    is_approved
FROM coaches";

pub trait CoachRepository {
    fn list_coaches(&self) -> RepoResult<Vec<Coach>>;
    fn get_coach(&self, id: CoachId) -> RepoResult<Option<Coach>>;
    fn find_coach_by_email(&self, email: &str) -> RepoResult<Option<Coach>>;
    fn insert_coach(&self, coach: &Coach, password: &PasswordHash) -> RepoResult<()>;
    /// Replaces profile fields; `NotFound` when the coach does not exist.
    fn update_coach(&self, coach: &Coach) -> RepoResult<()>;
    fn set_coach_approved(&self, id: CoachId, approved: bool) -> RepoResult<()>;
    fn set_password(&self, id: CoachId, password: &PasswordHash) -> RepoResult<()>;
    fn password_hash(&self, id: CoachId) -> RepoResult<Option<PasswordHash>>;
    fn delete_coach(&self, id: CoachId) -> RepoResult<()>;
}

impl<T: CoachRepository + ?Sized> CoachRepository for &T {
    fn list_coaches(&self) -> RepoResult<Vec<Coach>> {
        (**self).list_coaches()
    }

    fn get_coach(&self, id: CoachId) -> RepoResult<Option<Coach>> {
        (**self).get_coach(id)
    }

    fn find_coach_by_email(&self, email: &str) -> RepoResult<Option<Coach>> {
        (**self).find_coach_by_email(email)
    }

    fn insert_coach(&self, coach: &Coach, password: &PasswordHash) -> RepoResult<()> {
        (**self).insert_coach(coach, password)
    }

    fn update_coach(&self, coach: &Coach) -> RepoResult<()> {
        (**self).update_coach(coach)
    }

    fn set_coach_approved(&self, id: CoachId, approved: bool) -> RepoResult<()> {
        (**self).set_coach_approved(id, approved)
    }

    fn set_password(&self, id: CoachId, password: &PasswordHash) -> RepoResult<()> {
        (**self).set_password(id, password)
    }

    fn password_hash(&self, id: CoachId) -> RepoResult<Option<PasswordHash>> {
        (**self).password_hash(id)
    }

    fn delete_coach(&self, id: CoachId) -> RepoResult<()> {
        (**self).delete_coach(id)
    }
}

pub struct SqliteCoachRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCoachRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, COACH_TABLE)?;
        Ok(Self { conn })
    }

    fn query_one(&self, filter: &str, value: String) -> RepoResult<Option<Coach>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COACH_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_coach_row(row)?));
        }
        Ok(None)
    }

    fn expect_changed(changed: usize, id: CoachId) -> RepoResult<()> {
        if changed == 0 {
            return Err(RepoError::NotFound {
                collection: COACH_TABLE,
                id,
            });
        }
        Ok(())
    }
}

impl CoachRepository for SqliteCoachRepository<'_> {
    fn list_coaches(&self) -> RepoResult<Vec<Coach>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COACH_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut coaches = Vec::new();
        while let Some(row) = rows.next()? {
            coaches.push(parse_coach_row(row)?);
        }
        Ok(coaches)
    }

    fn get_coach(&self, id: CoachId) -> RepoResult<Option<Coach>> {
        self.query_one("id = ?1", id.to_string())
    }

    fn find_coach_by_email(&self, email: &str) -> RepoResult<Option<Coach>> {
        self.query_one("email = ?1", email.to_string())
    }

    fn insert_coach(&self, coach: &Coach, password: &PasswordHash) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO coaches (
                id,
                name,
                email,
                phone,
                teams,
                classes,
                is_approved,
                password_salt,
                password_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                coach.id.to_string(),
                coach.name.as_str(),
                coach.email.as_str(),
                coach.phone.as_deref(),
                encode_names(&coach.teams)?,
                encode_names(&coach.classes)?,
                i64::from(coach.is_approved),
                password.salt.as_str(),
                password.digest.as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_coach(&self, coach: &Coach) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE coaches
             SET
                name = ?1,
                email = ?2,
                phone = ?3,
                teams = ?4,
                classes = ?5,
                is_approved = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7;",
            params![
                coach.name.as_str(),
                coach.email.as_str(),
                coach.phone.as_deref(),
                encode_names(&coach.teams)?,
                encode_names(&coach.classes)?,
                i64::from(coach.is_approved),
                coach.id.to_string(),
            ],
        )?;
        Self::expect_changed(changed, coach.id)
    }

    fn set_coach_approved(&self, id: CoachId, approved: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE coaches
             SET
                is_approved = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![i64::from(approved), id.to_string()],
        )?;
        Self::expect_changed(changed, id)
    }

    fn set_password(&self, id: CoachId, password: &PasswordHash) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE coaches
             SET
                password_salt = ?1,
                password_hash = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                password.salt.as_str(),
                password.digest.as_str(),
                id.to_string()
            ],
        )?;
        Self::expect_changed(changed, id)
    }

    fn password_hash(&self, id: CoachId) -> RepoResult<Option<PasswordHash>> {
        let hash = self
            .conn
            .query_row(
                "SELECT password_salt, password_hash FROM coaches WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok(PasswordHash {
                        salt: row.get(0)?,
                        digest: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(hash)
    }

    fn delete_coach(&self, id: CoachId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM coaches WHERE id = ?1;", [id.to_string()])?;
        Self::expect_changed(changed, id)
    }
}

fn parse_coach_row(row: &Row<'_>) -> RepoResult<Coach> {
    let id_text: String = row.get("id")?;
    let teams_json: String = row.get("teams")?;
    let classes_json: String = row.get("classes")?;

    Ok(Coach {
        id: parse_uuid(&id_text, "coaches.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        teams: decode_names(&teams_json, "coaches.teams")?,
        classes: decode_names(&classes_json, "coaches.classes")?,
        is_approved: decode_flag(row.get("is_approved")?, "coaches.is_approved")?,
    })
}
