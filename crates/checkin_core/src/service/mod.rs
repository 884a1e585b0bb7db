//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the kiosk, reset, history, roster,
//!   coach and correction use-cases.
//! - Publish collection snapshots to live subscribers after each successful
//!   mutation.
//!
//! # Invariants
//! - Services never bypass repository contracts.
//! - Services stay storage-agnostic; tests substitute fake repositories.
//! - Every failure is returned to the caller as a `CoreError`; nothing is
//!   retried.

pub mod archival_service;
pub mod coach_service;
pub mod correction;
pub mod history_service;
pub mod ledger_service;
pub mod roster_service;
