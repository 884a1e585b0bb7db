//! Team/class activity identity.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Category of a scheduled activity an athlete can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Competitive team practice.
    Team,
    /// Open class session.
    Class,
}

impl ActivityType {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Class => "class",
        }
    }

    /// Parses the storage/wire value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "team" => Some(Self::Team),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete activity: a category plus the configured team/class name.
///
/// Names are matched exactly (case-sensitive) everywhere in core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub name: String,
}

impl Activity {
    pub fn new(kind: ActivityType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self::new(ActivityType::Team, name)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(ActivityType::Class, name)
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityType};

    #[test]
    fn activity_type_parse_is_case_insensitive() {
        assert_eq!(ActivityType::parse(" Team "), Some(ActivityType::Team));
        assert_eq!(ActivityType::parse("CLASS"), Some(ActivityType::Class));
        assert_eq!(ActivityType::parse("squad"), None);
    }

    #[test]
    fn activity_display_includes_kind_and_name() {
        assert_eq!(Activity::team("Power Pumas").to_string(), "team:Power Pumas");
    }
}
