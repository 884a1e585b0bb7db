//! Multi-entry history report.

use super::engine::{reconcile, ReconciliationRow};
use super::filter::ReportFilter;
use crate::model::athlete::Athlete;
use crate::model::log_entry::{LogEntry, LogEntryId};
use serde::Serialize;

/// Reconciled rows for one log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
    pub log_id: LogEntryId,
    pub created_at: i64,
    pub created_by: String,
    pub last_edited_at: Option<i64>,
    pub rows: Vec<ReconciliationRow>,
}

/// Reconciles every entry in `logs`, keeping input order and dropping
/// entries whose filtered row set is empty.
pub fn history_report(
    roster: &[Athlete],
    logs: &[LogEntry],
    filter: &ReportFilter,
) -> Vec<LogReport> {
    logs.iter()
        .filter_map(|entry| {
            let rows = reconcile(roster, &entry.events, filter);
            (!rows.is_empty()).then(|| LogReport {
                log_id: entry.id,
                created_at: entry.created_at,
                created_by: entry.created_by.clone(),
                last_edited_at: entry.last_edited_at,
                rows,
            })
        })
        .collect()
}
