//! Live check-in ledger use-cases.
//!
//! # Responsibility
//! - Append kiosk check-ins with a fresh id and the current time.
//! - Expose today's events and push them to subscribers on change.
//!
//! # Invariants
//! - Check-ins are append-only; the same athlete may check into the same
//!   activity any number of times before reset.
//! - `check_in` only accepts approved athletes, configured activities and
//!   activities the athlete is assigned to.

use crate::clock::Clock;
use crate::config::ActivityCatalog;
use crate::error::{CoreResult, ValidationError};
use crate::feed::{publish_snapshot, ChangeFeed, SubscriptionId};
use crate::model::activity::Activity;
use crate::model::athlete::AthleteId;
use crate::model::checkin::{CheckInEvent, CheckInId};
use crate::repo::ledger_repo::LedgerRepository;
use crate::repo::roster_repo::RosterRepository;
use log::{error, info};
use std::sync::Arc;

pub struct LedgerService<L: LedgerRepository> {
    repo: L,
    feed: Arc<ChangeFeed<CheckInEvent>>,
    clock: Arc<dyn Clock>,
}

impl<L: LedgerRepository> LedgerService<L> {
    pub fn new(repo: L, feed: Arc<ChangeFeed<CheckInEvent>>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, feed, clock }
    }

    /// Records one check-in without roster validation.
    pub fn append(
        &self,
        athlete_id: AthleteId,
        athlete_name: &str,
        activity: Activity,
    ) -> CoreResult<CheckInEvent> {
        let event = CheckInEvent::new(athlete_id, athlete_name, activity, self.clock.now_ms());
        if let Err(err) = self.repo.insert_event(&event) {
            error!(
                "event=checkin_append module=ledger status=error athlete_id={athlete_id} error={err}"
            );
            return Err(err.into());
        }
        info!(
            "event=checkin_append module=ledger status=ok checkin_id={} athlete_id={athlete_id} activity_type={}",
            event.id, event.activity_type
        );
        self.publish();
        Ok(event)
    }

    /// Kiosk entry point: validates against roster and catalog, then appends.
    pub fn check_in(
        &self,
        roster: &impl RosterRepository,
        catalog: &ActivityCatalog,
        athlete_id: AthleteId,
        activity: Activity,
    ) -> CoreResult<CheckInEvent> {
        if !catalog.contains(&activity) {
            return Err(ValidationError::UnknownActivity(activity).into());
        }
        let athlete = roster
            .get_athlete(athlete_id)?
            .ok_or(ValidationError::UnknownAthlete(athlete_id))?;
        if !athlete.is_approved {
            return Err(ValidationError::AthleteNotApproved(athlete_id).into());
        }
        if !athlete.is_assigned_to(&activity) {
            return Err(ValidationError::NotAssigned {
                athlete_id,
                activity,
            }
            .into());
        }
        self.append(athlete.id, &athlete.name, activity)
    }

    pub fn list(&self) -> CoreResult<Vec<CheckInEvent>> {
        Ok(self.repo.list_events()?)
    }

    /// Removes the given events; unknown ids are ignored.
    pub fn delete_many(&self, ids: &[CheckInId]) -> CoreResult<usize> {
        let removed = self.repo.delete_events(ids)?;
        info!(
            "event=checkin_delete module=ledger status=ok requested={} removed={removed}",
            ids.len()
        );
        self.publish();
        Ok(removed)
    }

    /// Subscribes to ledger changes; the current snapshot is delivered
    /// immediately.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[CheckInEvent]) + Send + Sync + 'static,
    ) -> CoreResult<SubscriptionId> {
        Ok(self.feed.subscribe_with_snapshot(listener, || self.repo.list_events())?)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }

    fn publish(&self) {
        publish_snapshot(&self.feed, self.repo.list_events());
    }
}
