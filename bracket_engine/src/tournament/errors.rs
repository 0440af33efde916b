//! Tournament and bracket error types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::models::{TournamentId, TournamentStatus};
use crate::bracket::MatchKey;

/// Why a score report was refused without touching the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRejection {
    #[error("match already decided")]
    AlreadyDecided,

    #[error("scores are tied; draws are not allowed")]
    Tied,

    #[error("both slots must hold a participant before a score can be reported")]
    SlotsNotReady,
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchKey),

    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    #[error("Tournament already started")]
    AlreadyStarted,

    #[error("Invalid score report: {0}")]
    InvalidScoreReport(ScoreRejection),

    /// Another report completed the match between our read and our write
    #[error("Match {0} was completed by a concurrent report")]
    MatchConflict(MatchKey),

    #[error("Tournament not in correct state: expected {expected}, got {actual}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Tournament is full")]
    TournamentFull,

    #[error("Participant already registered")]
    AlreadyRegistered,

    #[error("Registration not found for participant {0}")]
    RegistrationNotFound(i64),

    #[error("Registrations are locked once the bracket exists")]
    RegistrationLocked,

    #[error("Too many participants: capacity {capacity}, got {requested}")]
    CapacityExceeded { capacity: u32, requested: usize },

    #[error("Participant {0} appears more than once")]
    DuplicateParticipant(i64),

    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),

    /// A structural invariant of the bracket does not hold
    #[error("Bracket corrupted: {0}")]
    BracketCorrupted(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),
}

impl TournamentError {
    /// Get a client-safe error message
    ///
    /// Storage and invariant failures are collapsed into a generic message so
    /// SQL details and internal state never reach HTTP clients.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_)
            | TournamentError::Migration(_)
            | TournamentError::Serialization(_)
            | TournamentError::BracketCorrupted(_) => "Internal server error".to_string(),
            TournamentError::Timeout(_) => "Request timed out".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the caller can fix the request and try again
    pub fn is_user_correctable(&self) -> bool {
        !matches!(
            self,
            TournamentError::Database(_)
                | TournamentError::Migration(_)
                | TournamentError::Serialization(_)
                | TournamentError::BracketCorrupted(_)
                | TournamentError::Timeout(_)
        )
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;
