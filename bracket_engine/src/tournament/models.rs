//! Tournament and registration data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{TournamentError, TournamentResult};
use crate::bracket::{SeedingStrategy, round_count};

/// Tournament ID type
pub type TournamentId = i64;

/// Participant (member) ID type
pub type ParticipantId = i64;

/// Smallest tournament that can produce a bracket
pub const MIN_CAPACITY: u32 = 2;

/// Largest tournament accepted at creation time
pub const MAX_CAPACITY: u32 = 1024;

/// Tournament status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Created, not yet accepting sign-ups
    Draft,
    /// Accepting registrations
    Registration,
    /// Bracket generated, matches being played
    Active,
    /// Final match decided
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::Registration => "registration",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Whether a bracket has been generated
    pub fn is_started(&self) -> bool {
        matches!(self, TournamentStatus::Active | TournamentStatus::Completed)
    }

    /// Fail unless new sign-ups are accepted
    pub fn ensure_accepting_registrations(&self) -> TournamentResult<()> {
        match self {
            TournamentStatus::Registration => Ok(()),
            TournamentStatus::Active | TournamentStatus::Completed => {
                Err(TournamentError::RegistrationLocked)
            }
            TournamentStatus::Draft => Err(TournamentError::InvalidState {
                expected: TournamentStatus::Registration,
                actual: *self,
            }),
        }
    }

    /// Fail once the bracket exists
    pub fn ensure_registrations_mutable(&self) -> TournamentResult<()> {
        if self.is_started() {
            Err(TournamentError::RegistrationLocked)
        } else {
            Ok(())
        }
    }

    /// Fail unless a bracket can be generated now
    pub fn ensure_startable(&self) -> TournamentResult<()> {
        match self {
            TournamentStatus::Registration => Ok(()),
            TournamentStatus::Active | TournamentStatus::Completed => {
                Err(TournamentError::AlreadyStarted)
            }
            TournamentStatus::Draft => Err(TournamentError::InvalidState {
                expected: TournamentStatus::Registration,
                actual: *self,
            }),
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TournamentStatus::Draft),
            "registration" => Ok(TournamentStatus::Registration),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(TournamentError::BracketCorrupted(format!(
                "unknown tournament status '{other}'"
            ))),
        }
    }
}

/// Registration status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Withdrawn,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "withdrawn" => Ok(RegistrationStatus::Withdrawn),
            other => Err(TournamentError::BracketCorrupted(format!(
                "unknown registration status '{other}'"
            ))),
        }
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Tournament name
    pub name: String,
    /// Free-form description shown to participants
    #[serde(default)]
    pub description: String,
    /// Maximum number of participants
    pub capacity: u32,
    /// How approved participants are ordered before padding
    #[serde(default)]
    pub seeding: SeedingStrategy,
    /// Approve registrations on sign-up
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
}

fn default_auto_approve() -> bool {
    true
}

impl TournamentConfig {
    /// Create a single-elimination configuration with random seeding and
    /// automatic approval
    pub fn single_elimination(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            capacity,
            seeding: SeedingStrategy::default(),
            auto_approve: true,
        }
    }

    /// Replace the seeding strategy
    pub fn with_seeding(mut self, seeding: SeedingStrategy) -> Self {
        self.seeding = seeding;
        self
    }

    /// Require an explicit approval for each registration
    pub fn with_manual_approval(mut self) -> Self {
        self.auto_approve = false;
        self
    }

    pub fn validate(&self) -> TournamentResult<()> {
        if self.name.trim().is_empty() {
            return Err(TournamentError::InvalidConfig(
                "name must not be empty".to_string(),
            ));
        }

        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.capacity) {
            return Err(TournamentError::InvalidConfig(format!(
                "capacity must be between {MIN_CAPACITY} and {MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }

        Ok(())
    }
}

/// Tournament information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub config: TournamentConfig,
    pub status: TournamentStatus,
    /// Power-of-two bracket size, set when the bracket is generated
    pub bracket_size: Option<u32>,
    pub champion: Option<ParticipantId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Number of rounds in the generated bracket
    pub fn round_count(&self) -> Option<u32> {
        self.bracket_size.map(|size| round_count(size as usize))
    }

    /// Fail with `InvalidState` unless the tournament is in `expected`
    pub fn ensure_status(&self, expected: TournamentStatus) -> TournamentResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TournamentError::InvalidState {
                expected,
                actual: self.status,
            })
        }
    }
}

/// Tournament registration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}
