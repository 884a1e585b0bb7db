//! Archived day record produced by one reset.
//!
//! # Invariants
//! - `events` is replaced only as a whole sequence.
//! - `last_edited_at` is `None` until the first correction save.

use super::checkin::CheckInEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LogEntryId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    /// Unix epoch milliseconds of the reset that produced this entry.
    pub created_at: i64,
    /// Opaque actor id/display value of whoever ran the reset.
    pub created_by: String,
    pub events: Vec<CheckInEvent>,
    pub last_edited_at: Option<i64>,
}

impl LogEntry {
    /// Creates a new entry with a fresh id around an event snapshot.
    pub fn new(created_at: i64, created_by: impl Into<String>, events: Vec<CheckInEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            created_by: created_by.into(),
            events,
            last_edited_at: None,
        }
    }
}
