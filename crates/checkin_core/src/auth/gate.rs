//! Gate decision logic and the list of guarded actions.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mutation that requires the shared passcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedAction {
    ApproveAthlete,
    EditAthlete,
    ApproveCoach,
    EditCoach,
    CreateCoach,
    DeleteCoach,
    ChangeCoachPassword,
    EditLogEntry,
}

impl GuardedAction {
    /// Stable id used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApproveAthlete => "approve_athlete",
            Self::EditAthlete => "edit_athlete",
            Self::ApproveCoach => "approve_coach",
            Self::EditCoach => "edit_coach",
            Self::CreateCoach => "create_coach",
            Self::DeleteCoach => "delete_coach",
            Self::ChangeCoachPassword => "change_coach_password",
            Self::EditLogEntry => "edit_log_entry",
        }
    }
}

impl Display for GuardedAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny,
}

/// Wrong passcode for a guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationError {
    pub action: GuardedAction,
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "incorrect passcode for `{}`", self.action)
    }
}

impl Error for AuthorizationError {}

/// Shared-secret check. Cloning shares nothing mutable; there is no state.
#[derive(Clone)]
pub struct AuthorizationGate {
    secret: String,
}

impl AuthorizationGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compares `attempt` against the shared secret.
    pub fn challenge(&self, attempt: &str) -> GateDecision {
        if attempt == self.secret {
            GateDecision::Allow
        } else {
            GateDecision::Deny
        }
    }

    /// Runs `challenge` for `action`, mapping a denial to an error.
    pub fn authorize(&self, action: GuardedAction, attempt: &str) -> Result<(), AuthorizationError> {
        match self.challenge(attempt) {
            GateDecision::Allow => {
                info!("event=gate_check module=auth status=allow action={action}");
                Ok(())
            }
            GateDecision::Deny => {
                warn!("event=gate_check module=auth status=deny action={action}");
                Err(AuthorizationError { action })
            }
        }
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationGate, GateDecision, GuardedAction};

    #[test]
    fn challenge_allows_only_exact_secret() {
        let gate = AuthorizationGate::new("cheer123");
        assert_eq!(gate.challenge("cheer123"), GateDecision::Allow);
        assert_eq!(gate.challenge("Cheer123"), GateDecision::Deny);
        assert_eq!(gate.challenge("cheer123 "), GateDecision::Deny);
        assert_eq!(gate.challenge(""), GateDecision::Deny);
    }

    #[test]
    fn repeated_failures_never_lock_out() {
        let gate = AuthorizationGate::new("1234");
        for _ in 0..100 {
            let err = gate
                .authorize(GuardedAction::DeleteCoach, "0000")
                .expect_err("wrong secret must be denied");
            assert_eq!(err.action, GuardedAction::DeleteCoach);
        }
        gate.authorize(GuardedAction::DeleteCoach, "1234")
            .expect("correct secret still allowed after failures");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let gate = AuthorizationGate::new("top-secret");
        assert!(!format!("{gate:?}").contains("top-secret"));
    }
}
