//! Correction editor for archived log entries.
//!
//! # Responsibility
//! - Open a log entry for editing behind the authorization gate.
//! - Validate manual additions, removals and field edits on a working copy.
//! - Save the working copy back as one whole-document replace.
//!
//! # Invariants
//! - Nothing is written until `save`; dropping or cancelling a session
//!   discards the working copy.
//! - `save` replaces the entire event sequence and stamps `last_edited_at`.
//! - A working copy never gains a second event for the same
//!   (athlete, activity type, activity name) through `append`.

use crate::auth::gate::{AuthorizationGate, GuardedAction};
use crate::clock::Clock;
use crate::config::ActivityCatalog;
use crate::error::{CoreResult, ValidationError};
use crate::feed::{publish_snapshot, ChangeFeed};
use crate::model::activity::Activity;
use crate::model::athlete::{normalize_name, Athlete, AthleteId};
use crate::model::checkin::CheckInEvent;
use crate::model::log_entry::{LogEntry, LogEntryId};
use crate::repo::log_repo::LogRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::RepoError;
use chrono::{DateTime, NaiveDateTime};
use log::{error, info};
use std::sync::Arc;

/// Manual check-in as typed into the correction form; any field may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualCheckIn {
    pub athlete_id: Option<AthleteId>,
    pub activity: Option<Activity>,
    /// Unix epoch milliseconds.
    pub timestamp: Option<i64>,
}

/// Editable field of one working-copy event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    AthleteName,
    Timestamp,
}

/// Working copy of one log entry's events.
#[derive(Debug, Clone)]
pub struct CorrectionSession {
    entry: LogEntry,
    working: Vec<CheckInEvent>,
    roster: Vec<Athlete>,
    catalog: ActivityCatalog,
}

impl CorrectionSession {
    /// Starts a session over `entry` with roster/catalog snapshots for
    /// validation.
    pub fn new(entry: LogEntry, roster: Vec<Athlete>, catalog: ActivityCatalog) -> Self {
        Self {
            working: entry.events.clone(),
            entry,
            roster,
            catalog,
        }
    }

    pub fn log_id(&self) -> LogEntryId {
        self.entry.id
    }

    pub fn events(&self) -> &[CheckInEvent] {
        &self.working
    }

    /// Whether the working copy differs from the stored events.
    pub fn is_dirty(&self) -> bool {
        self.working != self.entry.events
    }

    pub fn append(&mut self, manual: ManualCheckIn) -> Result<&CheckInEvent, ValidationError> {
        let athlete_id = manual
            .athlete_id
            .ok_or(ValidationError::MissingField("athlete_id"))?;
        let activity = manual
            .activity
            .ok_or(ValidationError::MissingField("activity"))?;
        if activity.name.trim().is_empty() {
            return Err(ValidationError::MissingField("activity_name"));
        }
        let timestamp = manual
            .timestamp
            .ok_or(ValidationError::MissingField("timestamp"))?;

        let athlete = self
            .roster
            .iter()
            .find(|athlete| athlete.id == athlete_id)
            .ok_or(ValidationError::UnknownAthlete(athlete_id))?;
        if !self.catalog.contains(&activity) {
            return Err(ValidationError::UnknownActivity(activity));
        }
        if self
            .working
            .iter()
            .any(|event| event.matches(athlete_id, &activity))
        {
            return Err(ValidationError::DuplicateActivity {
                athlete_id,
                activity,
            });
        }

        let event = CheckInEvent::new(athlete_id, athlete.name.clone(), activity, timestamp);
        self.working.push(event);
        Ok(&self.working[self.working.len() - 1])
    }

    pub fn remove(&mut self, index: usize) -> Result<CheckInEvent, ValidationError> {
        self.check_index(index)?;
        Ok(self.working.remove(index))
    }

    /// Updates one field; timestamps accept epoch milliseconds, RFC 3339, or
    /// a `YYYY-MM-DDTHH:MM[:SS]` form value read as UTC.
    pub fn edit(
        &mut self,
        index: usize,
        field: EventField,
        value: &str,
    ) -> Result<(), ValidationError> {
        self.check_index(index)?;
        match field {
            EventField::AthleteName => {
                let name = normalize_name(value).ok_or(ValidationError::BlankName)?;
                self.working[index].athlete_name = name;
            }
            EventField::Timestamp => {
                self.working[index].timestamp = parse_timestamp(value)?;
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.working.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.working.len(),
            });
        }
        Ok(())
    }
}

/// Bare numbers shorter than this are rejected; 12 digits reach back to 1973.
const MIN_EPOCH_MS_DIGITS: usize = 12;

/// Parses an edited timestamp into epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Result<i64, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("timestamp"));
    }
    if trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        // A short number is a typo (a year, an hour), not a 1970 instant.
        if trimmed.len() < MIN_EPOCH_MS_DIGITS {
            return Err(ValidationError::InvalidTimestamp(trimmed.to_string()));
        }
        return trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidTimestamp(trimmed.to_string()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc().timestamp_millis());
        }
    }
    Err(ValidationError::InvalidTimestamp(trimmed.to_string()))
}

/// Opens and saves correction sessions.
pub struct CorrectionService<S: LogRepository, R: RosterRepository> {
    logs: S,
    roster: R,
    catalog: ActivityCatalog,
    gate: AuthorizationGate,
    feed: Arc<ChangeFeed<LogEntry>>,
    clock: Arc<dyn Clock>,
}

impl<S: LogRepository, R: RosterRepository> CorrectionService<S, R> {
    pub fn new(
        logs: S,
        roster: R,
        catalog: ActivityCatalog,
        gate: AuthorizationGate,
        feed: Arc<ChangeFeed<LogEntry>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            logs,
            roster,
            catalog,
            gate,
            feed,
            clock,
        }
    }

    /// Opens `log_id` for editing after a passcode check.
    pub fn begin(&self, log_id: LogEntryId, passcode: &str) -> CoreResult<CorrectionSession> {
        self.gate.authorize(GuardedAction::EditLogEntry, passcode)?;
        let entry = self.logs.get_log(log_id)?.ok_or(RepoError::NotFound {
            collection: "checkin_logs",
            id: log_id,
        })?;
        let roster = self.roster.list_athletes()?;
        info!(
            "event=log_edit_begin module=correction status=ok log_id={log_id} events={}",
            entry.events.len()
        );
        Ok(CorrectionSession::new(entry, roster, self.catalog.clone()))
    }

    /// Writes the whole working copy back and stamps `last_edited_at`.
    pub fn save(&self, session: CorrectionSession) -> CoreResult<LogEntry> {
        let CorrectionSession { entry, working, .. } = session;
        let updated = LogEntry {
            events: working,
            last_edited_at: Some(self.clock.now_ms()),
            ..entry
        };
        if let Err(err) = self.logs.replace_log(&updated) {
            error!(
                "event=log_edit_save module=correction status=error log_id={} error={err}",
                updated.id
            );
            return Err(err.into());
        }
        info!(
            "event=log_edit_save module=correction status=ok log_id={} events={}",
            updated.id,
            updated.events.len()
        );
        publish_snapshot(&self.feed, self.logs.list_logs());
        Ok(updated)
    }

    /// Discards a session without writing.
    pub fn cancel(&self, session: CorrectionSession) {
        info!(
            "event=log_edit_cancel module=correction status=ok log_id={} dirty={}",
            session.log_id(),
            session.is_dirty()
        );
    }
}
