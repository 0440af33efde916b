//! Admin commands and operation outcomes.

use serde::{Deserialize, Serialize};

use super::models::{TournamentId, TournamentStatus};
use crate::bracket::{Advancement, Bracket, Match};

/// The closed set of operations exposed to a tournament admin panel.
///
/// JSON form: `{"action": "report_score", "round": 1, "match_number": 3,
/// "score_a": 10, "score_b": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    OpenRegistration,
    CloseRegistration,
    /// Generate the bracket from the approved registrations
    Start,
    ReportScore {
        round: u32,
        match_number: u32,
        score_a: u32,
        score_b: u32,
    },
}

impl AdminAction {
    /// Wire name of the action, as used in the `action` tag
    pub fn name(&self) -> &'static str {
        match self {
            AdminAction::OpenRegistration => "open_registration",
            AdminAction::CloseRegistration => "close_registration",
            AdminAction::Start => "start",
            AdminAction::ReportScore { .. } => "report_score",
        }
    }
}

/// Result of a successful bracket generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketCreated {
    pub tournament_id: TournamentId,
    pub capacity: u32,
    pub round_count: u32,
    pub byes: u32,
    pub bracket: Bracket,
}

/// Result of an accepted score report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCompleted {
    pub completed: Match,
    pub advancement: Advancement,
}

impl MatchCompleted {
    /// Whether this report decided the tournament
    pub fn is_final(&self) -> bool {
        matches!(self.advancement, Advancement::Champion { .. })
    }
}

/// What an [`AdminAction`] produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
    StatusChanged { status: TournamentStatus },
    BracketCreated(BracketCreated),
    MatchCompleted(MatchCompleted),
}
