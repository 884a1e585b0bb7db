//! Report filters.

use super::engine::AttendanceStatus;
use crate::model::activity::ActivityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    CheckedIn,
    Missed,
}

impl StatusFilter {
    pub fn allows(self, status: AttendanceStatus) -> bool {
        match self {
            Self::All => true,
            Self::CheckedIn => status == AttendanceStatus::CheckedIn,
            Self::Missed => status == AttendanceStatus::Missed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Team,
    Class,
}

impl CategoryFilter {
    pub fn allows(self, kind: ActivityType) -> bool {
        match self {
            Self::All => true,
            Self::Team => kind == ActivityType::Team,
            Self::Class => kind == ActivityType::Class,
        }
    }
}

impl From<ActivityType> for CategoryFilter {
    fn from(value: ActivityType) -> Self {
        match value {
            ActivityType::Team => Self::Team,
            ActivityType::Class => Self::Class,
        }
    }
}

/// Restricts rows to one team/class name (exact match), in either category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntityFilter {
    #[default]
    All,
    Named(String),
}

impl EntityFilter {
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(expected) => expected == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportFilter {
    /// Case-insensitive substring of the athlete name; empty matches all.
    pub name_substring: String,
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub entity: EntityFilter,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_entity(mut self, name: impl Into<String>) -> Self {
        self.entity = EntityFilter::Named(name.into());
        self
    }

    pub fn with_name(mut self, substring: impl Into<String>) -> Self {
        self.name_substring = substring.into();
        self
    }

    pub(crate) fn matches_name(&self, athlete_name: &str) -> bool {
        athlete_name
            .to_lowercase()
            .contains(&self.name_substring.to_lowercase())
    }
}
