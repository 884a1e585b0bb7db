//! Coach account record.
//!
//! # Invariants
//! - Email is the login name and is unique ignoring ASCII case.
//! - Password material never lives on this type; it stays in the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type CoachId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coach {
    pub id: CoachId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub teams: BTreeSet<String>,
    #[serde(default)]
    pub classes: BTreeSet<String>,
    /// Unapproved coaches cannot sign in.
    #[serde(default)]
    pub is_approved: bool,
}

impl Coach {
    /// Creates an unapproved coach with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: None,
            teams: BTreeSet::new(),
            classes: BTreeSet::new(),
            is_approved: false,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.teams.insert(team.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }
}

/// Lower-cased, trimmed email when it has the `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_ascii_lowercase();
    let (local, domain) = email.split_once('@')?;
    let shaped = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    shaped.then_some(email)
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn normalize_email_lowercases_and_checks_shape() {
        assert_eq!(
            normalize_email("  Alex@Example.COM ").as_deref(),
            Some("alex@example.com")
        );
        assert_eq!(normalize_email("alex"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("alex@example"), None);
        assert_eq!(normalize_email("a b@example.com"), None);
        assert_eq!(normalize_email("a@b@example.com"), None);
    }
}
