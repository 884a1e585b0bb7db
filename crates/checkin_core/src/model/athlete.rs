//! Roster athlete record.
//!
//! # Invariants
//! - `teams` and `classes` are sets; iteration order is lexicographic.
//! - Only approved athletes take part in check-in and reconciliation.

use super::activity::{Activity, ActivityType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable athlete identifier assigned by roster management.
pub type AthleteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    #[serde(default)]
    pub teams: BTreeSet<String>,
    #[serde(default)]
    pub classes: BTreeSet<String>,
    #[serde(default)]
    pub is_approved: bool,
}

impl Athlete {
    /// Creates an unapproved athlete with a fresh id and no assignments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            teams: BTreeSet::new(),
            classes: BTreeSet::new(),
            is_approved: false,
        }
    }

    /// Builder-style helper adding one team assignment.
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.teams.insert(team.into());
        self
    }

    /// Builder-style helper adding one class assignment.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn approved(mut self) -> Self {
        self.is_approved = true;
        self
    }

    /// Returns the assignment set for one activity category.
    pub fn assignments(&self, kind: ActivityType) -> &BTreeSet<String> {
        match kind {
            ActivityType::Team => &self.teams,
            ActivityType::Class => &self.classes,
        }
    }

    pub fn is_assigned_to(&self, activity: &Activity) -> bool {
        self.assignments(activity.kind).contains(&activity.name)
    }
}

/// Trims and collapses internal whitespace runs to one space.
///
/// Returns `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, Athlete};
    use crate::model::activity::Activity;

    #[test]
    fn normalize_name_collapses_whitespace() {
        assert_eq!(
            normalize_name("  Jamie \t  Lee\n").as_deref(),
            Some("Jamie Lee")
        );
        assert_eq!(normalize_name(" \n "), None);
    }

    #[test]
    fn assignment_lookup_is_per_category() {
        let athlete = Athlete::new("Jamie").with_team("Power Pumas");
        assert!(athlete.is_assigned_to(&Activity::team("Power Pumas")));
        assert!(!athlete.is_assigned_to(&Activity::class("Power Pumas")));
        assert!(!athlete.is_approved);
    }
}
