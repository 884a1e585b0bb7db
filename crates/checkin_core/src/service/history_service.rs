//! Read side of the log store: listing, subscriptions and reports.

use crate::error::CoreResult;
use crate::feed::{ChangeFeed, SubscriptionId};
use crate::model::log_entry::{LogEntry, LogEntryId};
use crate::reconcile::engine::{reconcile, ReconciliationRow};
use crate::reconcile::filter::ReportFilter;
use crate::reconcile::report::{history_report, LogReport};
use crate::repo::log_repo::LogRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::RepoError;
use log::debug;
use std::sync::Arc;

pub struct HistoryService<S: LogRepository, R: RosterRepository> {
    logs: S,
    roster: R,
    feed: Arc<ChangeFeed<LogEntry>>,
}

impl<S: LogRepository, R: RosterRepository> HistoryService<S, R> {
    pub fn new(logs: S, roster: R, feed: Arc<ChangeFeed<LogEntry>>) -> Self {
        Self { logs, roster, feed }
    }

    /// All log entries, newest first.
    pub fn list_logs(&self) -> CoreResult<Vec<LogEntry>> {
        Ok(self.logs.list_logs()?)
    }

    pub fn get_log(&self, id: LogEntryId) -> CoreResult<LogEntry> {
        Ok(self.logs.get_log(id)?.ok_or(RepoError::NotFound {
            collection: "checkin_logs",
            id,
        })?)
    }

    /// Reconciles one entry against the current roster.
    pub fn reconcile_log(
        &self,
        id: LogEntryId,
        filter: &ReportFilter,
    ) -> CoreResult<Vec<ReconciliationRow>> {
        let entry = self.get_log(id)?;
        let roster = self.roster.list_athletes()?;
        Ok(reconcile(&roster, &entry.events, filter))
    }

    /// Reconciles every entry (newest first), dropping entries with no rows.
    pub fn report(&self, filter: &ReportFilter) -> CoreResult<Vec<LogReport>> {
        let logs = self.logs.list_logs()?;
        let roster = self.roster.list_athletes()?;
        let reports = history_report(&roster, &logs, filter);
        debug!(
            "event=history_report module=history status=ok logs={} reported={}",
            logs.len(),
            reports.len()
        );
        Ok(reports)
    }

    /// Subscribes to log store changes; the current list is delivered
    /// immediately.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[LogEntry]) + Send + Sync + 'static,
    ) -> CoreResult<SubscriptionId> {
        Ok(self.feed.subscribe_with_snapshot(listener, || self.logs.list_logs())?)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }
}
