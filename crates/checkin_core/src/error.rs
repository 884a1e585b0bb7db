//! Outcome taxonomy surfaced to the invoking layer.
//!
//! # Invariants
//! - Every failure is reported as one discrete kind; none are swallowed.
//! - Core never retries; retry is an explicit operator re-action.

use crate::auth::gate::AuthorizationError;
use crate::model::activity::Activity;
use crate::model::athlete::AthleteId;
use crate::model::log_entry::LogEntryId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Rejected input. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    BlankName,
    UnknownAthlete(AthleteId),
    /// Athlete exists but has not been approved by a coach.
    AthleteNotApproved(AthleteId),
    /// Activity is not one of the configured team/class names.
    UnknownActivity(Activity),
    /// Athlete is not assigned to the activity they tried to check into.
    NotAssigned {
        athlete_id: AthleteId,
        activity: Activity,
    },
    /// Working copy already holds an event for this athlete and activity.
    DuplicateActivity {
        athlete_id: AthleteId,
        activity: Activity,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    InvalidTimestamp(String),
    InvalidEmail(String),
    /// Another coach already signs in with this email.
    DuplicateEmail(String),
    WeakPassword {
        min_len: usize,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::BlankName => write!(f, "name must not be blank"),
            Self::UnknownAthlete(id) => write!(f, "unknown athlete: {id}"),
            Self::AthleteNotApproved(id) => write!(f, "athlete is not approved: {id}"),
            Self::UnknownActivity(activity) => write!(f, "unknown activity: {activity}"),
            Self::NotAssigned {
                athlete_id,
                activity,
            } => write!(f, "athlete {athlete_id} is not assigned to {activity}"),
            Self::DuplicateActivity {
                athlete_id,
                activity,
            } => write!(
                f,
                "duplicate activity: athlete {athlete_id} is already recorded for {activity}"
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "event index {index} out of range for {len} events")
            }
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::DuplicateEmail(value) => write!(f, "email already in use: {value}"),
            Self::WeakPassword { min_len } => {
                write!(f, "password must be at least {min_len} characters")
            }
        }
    }
}

impl Error for ValidationError {}

#[derive(Debug)]
pub enum CoreError {
    Validation(ValidationError),
    /// Store unreachable or write rejected; nothing was committed by the
    /// failing step.
    Persistence(RepoError),
    /// Reset archived the snapshot as `log_id` but could not clear the
    /// ledger. The archived entry stays; the next reset will archive the
    /// same events again.
    PartialReset {
        log_id: LogEntryId,
        source: RepoError,
    },
    Authorization(AuthorizationError),
}

impl CoreError {
    /// Stable short code used in log lines and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Persistence(_) => "persistence_error",
            Self::PartialReset { .. } => "partial_reset",
            Self::Authorization(_) => "authorization_error",
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::PartialReset { log_id, source } => write!(
                f,
                "check-ins were archived as log {log_id} but the ledger was not cleared: {source}"
            ),
            Self::Authorization(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::PartialReset { source, .. } => Some(source),
            Self::Authorization(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

impl From<AuthorizationError> for CoreError {
    fn from(value: AuthorizationError) -> Self {
        Self::Authorization(value)
    }
}
