//! Match lifecycle: `pending -> completed`, with no way back.
//!
//! A match completes either through bye resolution at bracket generation
//! (see [`super::byes`]) or through a score report validated here. Validation
//! is pure; the validated [`MatchResult`] is handed to the repository, which
//! performs the conditional write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Match, MatchKey, MatchStatus};
use crate::tournament::{ParticipantId, ScoreRejection};

/// A validated score report, ready to be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub key: MatchKey,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: ParticipantId,
    pub reported_by: Option<i64>,
}

impl Match {
    /// Validate a score report against the current state of this match.
    ///
    /// # Errors
    ///
    /// * `ScoreRejection::AlreadyDecided` - the match is completed
    /// * `ScoreRejection::SlotsNotReady` - a slot is empty or a bye
    /// * `ScoreRejection::Tied` - `score_a == score_b`
    pub fn check_report(
        &self,
        score_a: u32,
        score_b: u32,
        reported_by: Option<i64>,
    ) -> Result<MatchResult, ScoreRejection> {
        if self.status == MatchStatus::Completed {
            return Err(ScoreRejection::AlreadyDecided);
        }

        let (Some(a), Some(b)) = (self.slot_a.participant(), self.slot_b.participant()) else {
            return Err(ScoreRejection::SlotsNotReady);
        };

        if score_a == score_b {
            return Err(ScoreRejection::Tied);
        }

        Ok(MatchResult {
            key: self.key(),
            score_a,
            score_b,
            winner: if score_a > score_b { a } else { b },
            reported_by,
        })
    }

    /// Apply a validated result. Callers must hold the match as pending.
    pub fn complete(&mut self, result: &MatchResult, at: DateTime<Utc>) {
        self.score_a = result.score_a;
        self.score_b = result.score_b;
        self.winner = Some(result.winner);
        self.reported_by = result.reported_by;
        self.completed_at = Some(at);
        self.status = MatchStatus::Completed;
    }
}
