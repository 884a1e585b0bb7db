//! Gym configuration: activity catalog, hold thresholds and shared passcode.
//!
//! # Invariants
//! - Every field has a default, so an empty JSON object is a valid config.
//! - Activity names are unique within their category and never blank.
//! - Hold thresholds are at least one tick.

use crate::error::ValidationError;
use crate::model::activity::{Activity, ActivityType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_TEAMS: &[&str] = &[
    "Sparkle Squad",
    "Power Pumas",
    "Victory Vipers",
    "Cheer Comets",
];
const DEFAULT_CLASSES: &[&str] = &[
    "Tumble Basics",
    "Jump & Stunt Drills",
    "Flexibility Fusion",
    "Routine Polish",
];
const DEFAULT_MASTER_PASSCODE: &str = "cheer123";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub teams: Vec<String>,
    pub classes: Vec<String>,
    /// Seconds a kiosk button must be held to commit one check-in.
    pub check_in_hold_seconds: u32,
    /// Seconds the reset control must be held to archive the day.
    pub reset_hold_seconds: u32,
    /// Shared secret for the authorization gate.
    pub master_passcode: String,
    pub log_level: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            teams: DEFAULT_TEAMS.iter().map(|name| name.to_string()).collect(),
            classes: DEFAULT_CLASSES.iter().map(|name| name.to_string()).collect(),
            check_in_hold_seconds: 2,
            reset_hold_seconds: 5,
            master_passcode: DEFAULT_MASTER_PASSCODE.to_string(),
            log_level: None,
        }
    }
}

impl CoreConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_names(ActivityType::Team, &self.teams)?;
        validate_names(ActivityType::Class, &self.classes)?;
        if self.check_in_hold_seconds == 0 {
            return Err(ConfigError::Invalid(
                "check_in_hold_seconds must be at least 1".to_string(),
            ));
        }
        if self.reset_hold_seconds == 0 {
            return Err(ConfigError::Invalid(
                "reset_hold_seconds must be at least 1".to_string(),
            ));
        }
        if self.master_passcode.is_empty() {
            return Err(ConfigError::Invalid(
                "master_passcode must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog(&self) -> ActivityCatalog {
        ActivityCatalog {
            teams: self.teams.clone(),
            classes: self.classes.clone(),
        }
    }
}

fn validate_names(kind: ActivityType, names: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("blank {kind} name")));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate {kind} name `{name}`")));
        }
    }
    Ok(())
}

/// The configured team and class names, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityCatalog {
    teams: Vec<String>,
    classes: Vec<String>,
}

impl ActivityCatalog {
    pub fn new(teams: Vec<String>, classes: Vec<String>) -> Self {
        Self { teams, classes }
    }

    pub fn names(&self, kind: ActivityType) -> &[String] {
        match kind {
            ActivityType::Team => &self.teams,
            ActivityType::Class => &self.classes,
        }
    }

    pub fn contains(&self, activity: &Activity) -> bool {
        self.names(activity.kind)
            .iter()
            .any(|name| *name == activity.name)
    }

    /// Rejects the first team or class name that is not configured.
    pub fn check_assignments(
        &self,
        teams: &BTreeSet<String>,
        classes: &BTreeSet<String>,
    ) -> Result<(), ValidationError> {
        let assigned = teams
            .iter()
            .map(Activity::team)
            .chain(classes.iter().map(Activity::class));
        for activity in assigned {
            if !self.contains(&activity) {
                return Err(ValidationError::UnknownActivity(activity));
            }
        }
        Ok(())
    }

    /// All configured activities, teams first.
    pub fn activities(&self) -> impl Iterator<Item = Activity> + '_ {
        self.teams
            .iter()
            .map(Activity::team)
            .chain(self.classes.iter().map(Activity::class))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityCatalog, ConfigError, CoreConfig};
    use crate::model::activity::Activity;

    #[test]
    fn empty_object_yields_defaults() {
        let config: CoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.check_in_hold_seconds, 2);
        assert_eq!(config.reset_hold_seconds, 5);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_and_blank_names() {
        let mut config = CoreConfig {
            teams: vec!["A".to_string(), "A".to_string()],
            ..CoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("duplicate")));

        config.teams = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let config = CoreConfig {
            reset_hold_seconds: 0,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn catalog_matches_exact_names_per_category() {
        let catalog = ActivityCatalog::new(vec!["Power Pumas".to_string()], vec![]);
        assert!(catalog.contains(&Activity::team("Power Pumas")));
        assert!(!catalog.contains(&Activity::team("power pumas")));
        assert!(!catalog.contains(&Activity::class("Power Pumas")));
        assert_eq!(catalog.activities().count(), 1);
    }

    #[test]
    fn load_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gym.json");
        std::fs::write(&path, r#"{ "teams": ["Rockets"], "master_passcode": "9999" }"#).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.teams, vec!["Rockets".to_string()]);
        assert_eq!(config.master_passcode, "9999");
        assert_eq!(config.classes.len(), 4);
    }
}
