//! Roster views for the kiosk and coach screens, plus gated roster edits.
//!
//! # Invariants
//! - Kiosk and status views only list approved athletes.
//! - Newly registered athletes start unapproved.
//! - Approval and edits require the shared passcode.

use crate::auth::gate::{AuthorizationGate, GuardedAction};
use crate::config::ActivityCatalog;
use crate::error::{CoreResult, ValidationError};
use crate::feed::{publish_snapshot, ChangeFeed, SubscriptionId};
use crate::model::activity::Activity;
use crate::model::athlete::{normalize_name, Athlete, AthleteId};
use crate::model::checkin::CheckInEvent;
use crate::repo::roster_repo::{RosterRepository, RosterWriter};
use crate::repo::RepoError;
use log::info;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One athlete's attendance for one activity in the live ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterStatus {
    pub athlete: Athlete,
    pub checked_in: bool,
    pub latest_check_in: Option<i64>,
    /// Today's check-ins for the activity, newest first.
    pub check_ins: Vec<CheckInEvent>,
}

pub struct RosterService<R: RosterRepository> {
    repo: R,
    catalog: ActivityCatalog,
    gate: AuthorizationGate,
    feed: Arc<ChangeFeed<Athlete>>,
}

impl<R: RosterRepository> RosterService<R> {
    pub fn new(
        repo: R,
        catalog: ActivityCatalog,
        gate: AuthorizationGate,
        feed: Arc<ChangeFeed<Athlete>>,
    ) -> Self {
        Self {
            repo,
            catalog,
            gate,
            feed,
        }
    }

    pub fn list_athletes(&self) -> CoreResult<Vec<Athlete>> {
        Ok(self.repo.list_athletes()?)
    }

    /// Unapproved athletes waiting for a coach.
    pub fn pending_athletes(&self) -> CoreResult<Vec<Athlete>> {
        let mut athletes = self.repo.list_athletes()?;
        athletes.retain(|athlete| !athlete.is_approved);
        Ok(athletes)
    }

    /// Approved athletes assigned to `activity`, sorted by name; one kiosk
    /// button each.
    pub fn kiosk_roster(&self, activity: &Activity) -> CoreResult<Vec<Athlete>> {
        if !self.catalog.contains(activity) {
            return Err(ValidationError::UnknownActivity(activity.clone()).into());
        }
        let mut athletes = self.repo.list_athletes()?;
        athletes.retain(|athlete| athlete.is_approved && athlete.is_assigned_to(activity));
        athletes.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(athletes)
    }

    /// Joins the kiosk roster with today's ledger `events` for `activity`.
    pub fn today_status(
        &self,
        activity: &Activity,
        events: &[CheckInEvent],
    ) -> CoreResult<Vec<RosterStatus>> {
        let statuses = self
            .kiosk_roster(activity)?
            .into_iter()
            .map(|athlete| {
                let mut check_ins: Vec<CheckInEvent> = events
                    .iter()
                    .filter(|event| event.matches(athlete.id, activity))
                    .cloned()
                    .collect();
                check_ins.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                RosterStatus {
                    checked_in: !check_ins.is_empty(),
                    latest_check_in: check_ins.first().map(|event| event.timestamp),
                    check_ins,
                    athlete,
                }
            })
            .collect();
        Ok(statuses)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&[Athlete]) + Send + Sync + 'static,
    ) -> CoreResult<SubscriptionId> {
        Ok(self.feed.subscribe_with_snapshot(listener, || self.repo.list_athletes())?)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }
}

impl<R: RosterRepository + RosterWriter> RosterService<R> {
    /// Self-registration from the kiosk; the athlete waits for approval.
    pub fn register_athlete(
        &self,
        name: &str,
        teams: BTreeSet<String>,
        classes: BTreeSet<String>,
    ) -> CoreResult<Athlete> {
        let name = normalize_name(name).ok_or(ValidationError::BlankName)?;
        let athlete = Athlete {
            teams,
            classes,
            ..Athlete::new(name)
        };
        self.catalog
            .check_assignments(&athlete.teams, &athlete.classes)?;
        self.repo.upsert_athlete(&athlete)?;
        info!(
            "event=athlete_register module=roster status=ok athlete_id={}",
            athlete.id
        );
        self.publish();
        Ok(athlete)
    }

    pub fn approve_athlete(&self, id: AthleteId, passcode: &str) -> CoreResult<()> {
        self.gate.authorize(GuardedAction::ApproveAthlete, passcode)?;
        self.repo.set_approved(id, true)?;
        info!("event=athlete_approve module=roster status=ok athlete_id={id}");
        self.publish();
        Ok(())
    }

    /// Replaces an existing athlete's profile (name, assignments, approval).
    pub fn update_athlete(&self, athlete: &Athlete, passcode: &str) -> CoreResult<Athlete> {
        self.gate.authorize(GuardedAction::EditAthlete, passcode)?;
        if self.repo.get_athlete(athlete.id)?.is_none() {
            return Err(RepoError::NotFound {
                collection: "athletes",
                id: athlete.id,
            }
            .into());
        }
        let name = normalize_name(&athlete.name).ok_or(ValidationError::BlankName)?;
        let updated = Athlete {
            name,
            ..athlete.clone()
        };
        self.catalog
            .check_assignments(&updated.teams, &updated.classes)?;
        self.repo.upsert_athlete(&updated)?;
        info!(
            "event=athlete_update module=roster status=ok athlete_id={}",
            updated.id
        );
        self.publish();
        Ok(updated)
    }

    fn publish(&self) {
        publish_snapshot(&self.feed, self.repo.list_athletes());
    }
}
