//! Bracket data models: slots, matches and the derived bracket projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tournament::{ParticipantId, TournamentError, TournamentId};

/// One side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "participant_id", rename_all = "snake_case")]
pub enum Slot {
    /// Waiting for the winner of a previous-round match
    Empty,
    /// Round-1 placeholder with no participant
    Bye,
    Participant(ParticipantId),
}

impl Slot {
    pub fn participant(&self) -> Option<ParticipantId> {
        match self {
            Slot::Participant(id) => Some(*id),
            Slot::Empty | Slot::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// Storage tag for the slot kind
    pub fn kind(&self) -> &'static str {
        match self {
            Slot::Empty => "empty",
            Slot::Bye => "bye",
            Slot::Participant(_) => "participant",
        }
    }

    /// Rebuild a slot from its storage tag and participant column
    pub fn from_parts(kind: &str, participant: Option<ParticipantId>) -> Option<Self> {
        match (kind, participant) {
            ("empty", None) => Some(Slot::Empty),
            ("bye", None) => Some(Slot::Bye),
            ("participant", Some(id)) => Some(Slot::Participant(id)),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Empty => f.write_str("TBD"),
            Slot::Bye => f.write_str("BYE"),
            Slot::Participant(id) => write!(f, "#{id}"),
        }
    }
}

/// Which slot of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Completed => "completed",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "completed" => Ok(MatchStatus::Completed),
            other => Err(TournamentError::BracketCorrupted(format!(
                "unknown match status '{other}'"
            ))),
        }
    }
}

/// Composite match identity: `(tournament, round, match number)`, both
/// numbers 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
}

impl MatchKey {
    pub fn new(tournament_id: TournamentId, round: u32, match_number: u32) -> Self {
        Self {
            tournament_id,
            round,
            match_number,
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tournament {} round {} match {}",
            self.tournament_id, self.round, self.match_number
        )
    }
}

/// A single bracket match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    pub slot_a: Slot,
    pub slot_b: Slot,
    /// Only meaningful once completed by a score report
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Option<ParticipantId>,
    pub status: MatchStatus,
    /// Member who submitted the result, if any
    pub reported_by: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a pending match with the given slots
    pub fn pending(key: MatchKey, slot_a: Slot, slot_b: Slot) -> Self {
        Self {
            tournament_id: key.tournament_id,
            round: key.round,
            match_number: key.match_number,
            slot_a,
            slot_b,
            score_a: 0,
            score_b: 0,
            winner: None,
            status: MatchStatus::Pending,
            reported_by: None,
            completed_at: None,
        }
    }

    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.tournament_id, self.round, self.match_number)
    }

    pub fn slot(&self, side: Side) -> Slot {
        match side {
            Side::A => self.slot_a,
            Side::B => self.slot_b,
        }
    }

    pub(crate) fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Whether this match was decided by a bye rather than a played result
    pub fn is_bye(&self) -> bool {
        self.slot_a.is_bye() || self.slot_b.is_bye()
    }
}

/// One layer of the bracket tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub matches: Vec<Match>,
}

/// Every match of a tournament grouped by round. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    /// Power-of-two bracket size
    pub capacity: u32,
    pub round_count: u32,
    pub rounds: Vec<Round>,
    pub champion: Option<ParticipantId>,
}

impl Bracket {
    /// Group matches by round; the champion is the winner of the single
    /// final-round match, if decided.
    pub fn from_matches(tournament_id: TournamentId, mut matches: Vec<Match>) -> Self {
        matches.sort_by_key(Match::key);

        let mut rounds: Vec<Round> = Vec::new();
        for m in matches {
            match rounds.last_mut() {
                Some(round) if round.number == m.round => round.matches.push(m),
                _ => rounds.push(Round {
                    number: m.round,
                    matches: vec![m],
                }),
            }
        }

        let capacity = rounds
            .first()
            .map(|round| round.matches.len() as u32 * 2)
            .unwrap_or(0);

        let champion = rounds
            .last()
            .filter(|round| round.matches.len() == 1)
            .and_then(|round| round.matches[0].winner);

        Self {
            tournament_id,
            capacity,
            round_count: rounds.len() as u32,
            rounds,
            champion,
        }
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }

    pub fn get(&self, round: u32, match_number: u32) -> Option<&Match> {
        self.round(round)?
            .matches
            .iter()
            .find(|m| m.match_number == match_number)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_parts_roundtrip() {
        for slot in [Slot::Empty, Slot::Bye, Slot::Participant(42)] {
            assert_eq!(Slot::from_parts(slot.kind(), slot.participant()), Some(slot));
        }
        assert_eq!(Slot::from_parts("participant", None), None);
        assert_eq!(Slot::from_parts("bye", Some(3)), None);
        assert_eq!(Slot::from_parts("ghost", None), None);
    }

    #[test]
    fn test_slot_json_shape() {
        let json = serde_json::to_value(Slot::Participant(7)).unwrap();
        assert_eq!(json["kind"], "participant");
        assert_eq!(json["participant_id"], 7);

        let json = serde_json::to_value(Slot::Bye).unwrap();
        assert_eq!(json["kind"], "bye");
    }

    #[test]
    fn test_bracket_from_unsorted_matches() {
        let matches = vec![
            Match::pending(MatchKey::new(1, 2, 1), Slot::Empty, Slot::Empty),
            Match::pending(
                MatchKey::new(1, 1, 2),
                Slot::Participant(3),
                Slot::Participant(4),
            ),
            Match::pending(
                MatchKey::new(1, 1, 1),
                Slot::Participant(1),
                Slot::Participant(2),
            ),
        ];

        let bracket = Bracket::from_matches(1, matches);
        assert_eq!(bracket.capacity, 4);
        assert_eq!(bracket.round_count, 2);
        assert_eq!(bracket.round(1).unwrap().matches[0].match_number, 1);
        assert_eq!(bracket.get(1, 2).unwrap().slot_a, Slot::Participant(3));
        assert_eq!(bracket.champion, None);

        let json = serde_json::to_value(&bracket).unwrap();
        assert_eq!(json["round_count"], 2);
        assert_eq!(json["capacity"], 4);
    }

    #[test]
    fn test_empty_bracket() {
        let bracket = Bracket::from_matches(9, Vec::new());
        assert!(bracket.rounds.is_empty());
        assert_eq!((bracket.capacity, bracket.round_count), (0, 0));
        assert_eq!(bracket.champion, None);
    }
}
