//! Day reset: archive the ledger into a new log entry, then clear it.
//!
//! # Responsibility
//! - Snapshot the ledger, persist the snapshot as one `LogEntry`, and delete
//!   exactly the snapshotted events.
//!
//! # Invariants
//! - If persisting the log entry fails, the ledger is untouched.
//! - If the log entry is persisted but the delete fails, the entry is kept
//!   and `CoreError::PartialReset` is returned; a later reset archives the
//!   same events again.
//! - Snapshot, write and delete are not serialized against concurrent
//!   check-ins or concurrent resets. A check-in that lands after the snapshot
//!   stays in the ledger for the next reset; two overlapping resets can both
//!   archive the same events. This matches the document-store behavior the
//!   system was built on and is intentionally not hidden here.

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::feed::{publish_snapshot, CollectionFeeds};
use crate::model::checkin::CheckInId;
use crate::model::log_entry::LogEntry;
use crate::repo::ledger_repo::LedgerRepository;
use crate::repo::log_repo::LogRepository;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

pub struct ArchivalService<L: LedgerRepository, S: LogRepository> {
    ledger: L,
    logs: S,
    feeds: CollectionFeeds,
    clock: Arc<dyn Clock>,
}

impl<L: LedgerRepository, S: LogRepository> ArchivalService<L, S> {
    pub fn new(ledger: L, logs: S, feeds: CollectionFeeds, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            logs,
            feeds,
            clock,
        }
    }

    /// Archives the current ledger on behalf of `actor`.
    ///
    /// An empty ledger still produces a log entry (a day where nobody
    /// attended is a valid, reportable day).
    pub fn reset(&self, actor: &str) -> CoreResult<LogEntry> {
        let started_at = Instant::now();
        info!("event=ledger_reset module=archival status=start");

        let snapshot = self.ledger.list_events().map_err(|err| {
            error!(
                "event=ledger_reset module=archival status=error stage=snapshot error={err}"
            );
            CoreError::Persistence(err)
        })?;
        let snapshot_ids: Vec<CheckInId> = snapshot.iter().map(|event| event.id).collect();

        let entry = LogEntry::new(self.clock.now_ms(), actor, snapshot);
        if let Err(err) = self.logs.create_log(&entry) {
            error!(
                "event=ledger_reset module=archival status=error stage=archive events={} error={err}",
                snapshot_ids.len()
            );
            return Err(CoreError::Persistence(err));
        }
        publish_snapshot(&self.feeds.logs, self.logs.list_logs());

        match self.ledger.delete_events(&snapshot_ids) {
            Ok(removed) => {
                if removed != snapshot_ids.len() {
                    warn!(
                        "event=ledger_reset module=archival status=drift log_id={} archived={} removed={removed}",
                        entry.id,
                        snapshot_ids.len()
                    );
                }
                info!(
                    "event=ledger_reset module=archival status=ok log_id={} events={} duration_ms={}",
                    entry.id,
                    snapshot_ids.len(),
                    started_at.elapsed().as_millis()
                );
                publish_snapshot(&self.feeds.ledger, self.ledger.list_events());
                Ok(entry)
            }
            Err(err) => {
                error!(
                    "event=ledger_reset module=archival status=error stage=clear log_id={} events={} error={err}",
                    entry.id,
                    snapshot_ids.len()
                );
                Err(CoreError::PartialReset {
                    log_id: entry.id,
                    source: err,
                })
            }
        }
    }
}
