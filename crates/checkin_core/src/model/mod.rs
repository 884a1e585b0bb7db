//! Attendance domain model.
//!
//! # Responsibility
//! - Define the records shared by the ledger, the log store and reporting.
//! - Keep one canonical shape for a check-in whether it is live or archived.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Timestamps are Unix epoch milliseconds.
//! - Athletes are owned by roster management; core code only reads them.
//! - Coach records carry no password material.

pub mod activity;
pub mod athlete;
pub mod checkin;
pub mod coach;
pub mod log_entry;
