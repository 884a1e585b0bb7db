//! Attendance reconciliation and archival core for the gym check-in kiosk.
//! This crate is the single source of truth for ledger, reset, history,
//! coach account and correction invariants.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod gesture;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;

pub use auth::gate::{AuthorizationError, AuthorizationGate, GateDecision, GuardedAction};
pub use auth::password::{PasswordHash, MIN_PASSWORD_LEN};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ActivityCatalog, ConfigError, CoreConfig};
pub use error::{CoreError, CoreResult, ValidationError};
pub use feed::{ChangeFeed, CollectionFeeds, SubscriptionId};
pub use gesture::{GestureInput, GestureOutcome, GesturePad, GestureState, HoldGesture};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityType};
pub use model::athlete::{Athlete, AthleteId};
pub use model::checkin::{CheckInEvent, CheckInId};
pub use model::coach::{normalize_email, Coach, CoachId};
pub use model::log_entry::{LogEntry, LogEntryId};
pub use reconcile::engine::{reconcile, AttendanceStatus, ReconciliationRow};
pub use reconcile::filter::{CategoryFilter, EntityFilter, ReportFilter, StatusFilter};
pub use reconcile::report::{history_report, LogReport};
pub use repo::coach_repo::{CoachRepository, SqliteCoachRepository};
pub use repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use repo::log_repo::{LogRepository, SqliteLogRepository};
pub use repo::roster_repo::{RosterRepository, RosterWriter, SqliteRosterRepository};
pub use repo::{RepoError, RepoResult};
pub use service::archival_service::ArchivalService;
pub use service::coach_service::CoachService;
pub use service::correction::{
    parse_timestamp, CorrectionService, CorrectionSession, EventField, ManualCheckIn,
};
pub use service::history_service::HistoryService;
pub use service::ledger_service::LedgerService;
pub use service::roster_service::{RosterService, RosterStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
