//! Run configuration fixed at setup time.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Create a new participant id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Role of a participant, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Collects contributions, aggregates, and broadcasts the result.
    Coordinator,
    /// Contributes local data and consumes the global result.
    Member,
}

impl Role {
    /// Build a role from the setup flag.
    pub fn from_flag(is_coordinator: bool) -> Self {
        if is_coordinator {
            Role::Coordinator
        } else {
            Role::Member
        }
    }

    /// Check whether this is the coordinator role.
    pub fn is_coordinator(self) -> bool {
        matches!(self, Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Member => write!(f, "member"),
        }
    }
}

/// Errors raised while validating setup parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The participant id was blank.
    #[error("participant id must not be blank")]
    BlankId,

    /// A coordinator was configured without a participant roster.
    #[error("coordinator requires a non-empty participant roster")]
    EmptyRoster,
}

/// Configuration set once at setup and never mutated afterward.
///
/// The roster lists every participant in the run, the coordinator
/// included; both barriers compare collection sizes against its length
/// exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// This participant's id.
    pub id: ParticipantId,
    /// This participant's role.
    pub role: Role,
    /// Full roster (coordinator only; empty for members).
    pub participants: Vec<ParticipantId>,
}

impl RunConfig {
    /// Validate setup parameters and build the run configuration.
    ///
    /// Fails without side effects if the id is blank or a coordinator was
    /// given an empty roster. Members ignore any roster they were sent.
    pub fn new(
        id: ParticipantId,
        role: Role,
        participants: Vec<ParticipantId>,
    ) -> Result<Self, ConfigError> {
        if id.as_str().trim().is_empty() {
            return Err(ConfigError::BlankId);
        }
        if role.is_coordinator() && participants.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        let participants = match role {
            Role::Coordinator => participants,
            Role::Member => Vec::new(),
        };
        Ok(Self {
            id,
            role,
            participants,
        })
    }

    /// Number of participants in the run (coordinator only; zero for
    /// members, which never evaluate quorums).
    pub fn nr_participants(&self) -> usize {
        self.participants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<ParticipantId> {
        ids.iter().map(|id| ParticipantId::from(*id)).collect()
    }

    #[test]
    fn test_coordinator_requires_roster() {
        let err = RunConfig::new(ParticipantId::from("c0"), Role::Coordinator, vec![]);
        assert_eq!(err.unwrap_err(), ConfigError::EmptyRoster);
    }

    #[test]
    fn test_blank_id_rejected() {
        let err = RunConfig::new(ParticipantId::from("  "), Role::Member, vec![]);
        assert_eq!(err.unwrap_err(), ConfigError::BlankId);
    }

    #[test]
    fn test_member_drops_roster() {
        let config = RunConfig::new(
            ParticipantId::from("m1"),
            Role::Member,
            roster(&["c0", "m1"]),
        )
        .unwrap();
        assert!(config.participants.is_empty());
        assert_eq!(config.nr_participants(), 0);
    }

    #[test]
    fn test_coordinator_counts_full_roster() {
        let config = RunConfig::new(
            ParticipantId::from("c0"),
            Role::Coordinator,
            roster(&["c0", "m1", "m2"]),
        )
        .unwrap();
        assert_eq!(config.nr_participants(), 3);
    }
}
