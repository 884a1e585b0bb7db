//! Coach account administration and sign-in.
//!
//! # Responsibility
//! - Create, approve, edit and delete coach accounts and reset their
//!   passwords, each behind the shared passcode.
//! - Check coach sign-in credentials.
//!
//! # Invariants
//! - The passcode is checked before any input validation or store access.
//! - New coaches start unapproved; unapproved coaches never sign in.
//! - Emails are stored normalized and stay unique.

use crate::auth::gate::{AuthorizationGate, GuardedAction};
use crate::auth::password::{PasswordHash, MIN_PASSWORD_LEN};
use crate::config::ActivityCatalog;
use crate::error::{CoreResult, ValidationError};
use crate::feed::{publish_snapshot, ChangeFeed, SubscriptionId};
use crate::model::athlete::normalize_name;
use crate::model::coach::{normalize_email, Coach, CoachId};
use crate::repo::coach_repo::CoachRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::sync::Arc;

pub struct CoachService<C: CoachRepository> {
    repo: C,
    catalog: ActivityCatalog,
    gate: AuthorizationGate,
    feed: Arc<ChangeFeed<Coach>>,
}

impl<C: CoachRepository> CoachService<C> {
    pub fn new(
        repo: C,
        catalog: ActivityCatalog,
        gate: AuthorizationGate,
        feed: Arc<ChangeFeed<Coach>>,
    ) -> Self {
        Self {
            repo,
            catalog,
            gate,
            feed,
        }
    }

    pub fn list_coaches(&self) -> CoreResult<Vec<Coach>> {
        Ok(self.repo.list_coaches()?)
    }

    /// Adds an unapproved coach with an initial sign-in password.
    pub fn create_coach(
        &self,
        draft: &Coach,
        initial_password: &str,
        passcode: &str,
    ) -> CoreResult<Coach> {
        self.gate.authorize(GuardedAction::CreateCoach, passcode)?;
        let coach = Coach {
            is_approved: false,
            ..self.validated(draft)?
        };
        check_password(initial_password)?;
        if self.repo.find_coach_by_email(&coach.email)?.is_some() {
            return Err(ValidationError::DuplicateEmail(coach.email).into());
        }

        self.repo
            .insert_coach(&coach, &PasswordHash::derive(initial_password))?;
        info!(
            "event=coach_create module=coach status=ok coach_id={}",
            coach.id
        );
        self.publish();
        Ok(coach)
    }

    pub fn approve_coach(&self, id: CoachId, passcode: &str) -> CoreResult<()> {
        self.gate.authorize(GuardedAction::ApproveCoach, passcode)?;
        self.repo.set_coach_approved(id, true)?;
        info!("event=coach_approve module=coach status=ok coach_id={id}");
        self.publish();
        Ok(())
    }

    /// Replaces a coach's profile (name, email, phone, assignments, approval).
    pub fn update_coach(&self, coach: &Coach, passcode: &str) -> CoreResult<Coach> {
        self.gate.authorize(GuardedAction::EditCoach, passcode)?;
        let updated = self.validated(coach)?;
        if self.repo.get_coach(updated.id)?.is_none() {
            return Err(RepoError::NotFound {
                collection: "coaches",
                id: updated.id,
            }
            .into());
        }
        if let Some(holder) = self.repo.find_coach_by_email(&updated.email)? {
            if holder.id != updated.id {
                return Err(ValidationError::DuplicateEmail(updated.email).into());
            }
        }

        self.repo.update_coach(&updated)?;
        info!(
            "event=coach_update module=coach status=ok coach_id={}",
            updated.id
        );
        self.publish();
        Ok(updated)
    }

    pub fn delete_coach(&self, id: CoachId, passcode: &str) -> CoreResult<()> {
        self.gate.authorize(GuardedAction::DeleteCoach, passcode)?;
        self.repo.delete_coach(id)?;
        info!("event=coach_delete module=coach status=ok coach_id={id}");
        self.publish();
        Ok(())
    }

    /// Sets a new sign-in password for `id`.
    pub fn change_password(
        &self,
        id: CoachId,
        new_password: &str,
        passcode: &str,
    ) -> CoreResult<()> {
        self.gate
            .authorize(GuardedAction::ChangeCoachPassword, passcode)?;
        check_password(new_password)?;
        self.repo.set_password(id, &PasswordHash::derive(new_password))?;
        info!("event=coach_password module=coach status=ok coach_id={id}");
        Ok(())
    }

    /// Returns the coach when `email` and `password` match an approved
    /// account, `None` otherwise.
    pub fn sign_in(&self, email: &str, password: &str) -> CoreResult<Option<Coach>> {
        let Some(email) = normalize_email(email) else {
            return Ok(None);
        };
        let Some(coach) = self.repo.find_coach_by_email(&email)? else {
            warn!("event=coach_sign_in module=coach status=deny reason=unknown_email");
            return Ok(None);
        };
        let matches = self
            .repo
            .password_hash(coach.id)?
            .is_some_and(|hash| hash.verify(password));
        if !matches {
            warn!(
                "event=coach_sign_in module=coach status=deny reason=bad_password coach_id={}",
                coach.id
            );
            return Ok(None);
        }
        if !coach.is_approved {
            warn!(
                "event=coach_sign_in module=coach status=deny reason=unapproved coach_id={}",
                coach.id
            );
            return Ok(None);
        }
        info!(
            "event=coach_sign_in module=coach status=ok coach_id={}",
            coach.id
        );
        Ok(Some(coach))
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&[Coach]) + Send + Sync + 'static,
    ) -> CoreResult<SubscriptionId> {
        Ok(self
            .feed
            .subscribe_with_snapshot(listener, || self.repo.list_coaches())?)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }

    fn validated(&self, coach: &Coach) -> Result<Coach, ValidationError> {
        let name = normalize_name(&coach.name).ok_or(ValidationError::BlankName)?;
        let email = normalize_email(&coach.email)
            .ok_or_else(|| ValidationError::InvalidEmail(coach.email.trim().to_string()))?;
        let phone = coach
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);
        self.catalog
            .check_assignments(&coach.teams, &coach.classes)?;
        Ok(Coach {
            name,
            email,
            phone,
            ..coach.clone()
        })
    }

    fn publish(&self) {
        publish_snapshot(&self.feed, self.repo.list_coaches());
    }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}
