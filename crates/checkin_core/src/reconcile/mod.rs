//! Expected-vs-actual attendance reconciliation.
//!
//! # Responsibility
//! - Combine the roster's assignments with one log entry's events into
//!   per-athlete, per-activity `CheckedIn`/`Missed` rows.
//! - Apply the history view filters (name, status, category, entity).
//!
//! # Invariants
//! - Pure: identical inputs always produce identical, identically ordered
//!   output. No I/O, no clock.
//! - At most one row per (athlete, activity type, activity name); when both
//!   statuses arise for one key, `CheckedIn` wins.
//! - Unapproved athletes never produce rows.

pub mod engine;
pub mod filter;
pub mod report;
