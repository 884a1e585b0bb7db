//! Check-in event record.
//!
//! # Invariants
//! - `athlete_name` is denormalized when the event is created and is not
//!   refreshed from the roster afterwards.
//! - Events are never edited while they sit in the live ledger; only the
//!   correction editor changes archived copies.

use super::activity::{Activity, ActivityType};
use super::athlete::AthleteId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CheckInId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInEvent {
    pub id: CheckInId,
    pub athlete_id: AthleteId,
    pub athlete_name: String,
    pub activity_type: ActivityType,
    pub activity_name: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl CheckInEvent {
    /// Creates an event with a fresh id.
    pub fn new(
        athlete_id: AthleteId,
        athlete_name: impl Into<String>,
        activity: Activity,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            athlete_id,
            athlete_name: athlete_name.into(),
            activity_type: activity.kind,
            activity_name: activity.name,
            timestamp,
        }
    }

    pub fn activity(&self) -> Activity {
        Activity::new(self.activity_type, self.activity_name.clone())
    }

    /// Returns whether this event records `athlete_id` attending `activity`.
    pub fn matches(&self, athlete_id: AthleteId, activity: &Activity) -> bool {
        self.athlete_id == athlete_id
            && self.activity_type == activity.kind
            && self.activity_name == activity.name
    }
}
