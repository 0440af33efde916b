//! Winner propagation between rounds.
//!
//! Match `m` of round `r` feeds match `ceil(m / 2)` of round `r + 1`: odd
//! match numbers fill slot A, even ones slot B. The winner of the final
//! round is the champion.

use serde::{Deserialize, Serialize};

use super::models::{Match, MatchKey, MatchStatus, Side, Slot};
use crate::tournament::{ParticipantId, TournamentError, TournamentId, TournamentResult};

/// Where a winner goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub round: u32,
    pub match_number: u32,
    pub side: Side,
}

impl Destination {
    pub fn key(&self, tournament_id: TournamentId) -> MatchKey {
        MatchKey::new(tournament_id, self.round, self.match_number)
    }
}

/// What happens to the winner of a completed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advancement {
    /// Written into a slot of the next round
    Advance(Destination),
    /// The final match was decided
    Champion { participant_id: ParticipantId },
}

/// Destination of the winner of `(round, match_number)`.
pub fn destination(round: u32, match_number: u32) -> Destination {
    Destination {
        round: round + 1,
        match_number: match_number.div_ceil(2),
        side: if match_number % 2 == 1 { Side::A } else { Side::B },
    }
}

/// Decide where `winner` of the match at `key` goes in a bracket with
/// `round_count` rounds.
pub fn resolve(
    key: MatchKey,
    winner: ParticipantId,
    round_count: u32,
) -> TournamentResult<Advancement> {
    if key.round == 0 || key.round > round_count || key.match_number == 0 {
        return Err(TournamentError::BracketCorrupted(format!(
            "{key} lies outside a bracket of {round_count} rounds"
        )));
    }

    if key.round == round_count {
        Ok(Advancement::Champion {
            participant_id: winner,
        })
    } else {
        Ok(Advancement::Advance(destination(key.round, key.match_number)))
    }
}

/// Write `winner` into `side` of the destination match.
///
/// The slot must still be empty and the match pending: each later-round slot
/// is written exactly once, by the match that feeds it.
pub fn write_winner(target: &mut Match, side: Side, winner: ParticipantId) -> TournamentResult<()> {
    if target.status != MatchStatus::Pending {
        return Err(TournamentError::BracketCorrupted(format!(
            "destination {} is already completed",
            target.key()
        )));
    }

    let current = target.slot(side);
    if !current.is_empty() {
        return Err(TournamentError::BracketCorrupted(format!(
            "slot {} of {} already holds {current}",
            side.as_str(),
            target.key()
        )));
    }

    *target.slot_mut(side) = Slot::Participant(winner);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        assert_eq!(
            destination(1, 1),
            Destination {
                round: 2,
                match_number: 1,
                side: Side::A
            }
        );
        assert_eq!(
            destination(1, 2),
            Destination {
                round: 2,
                match_number: 1,
                side: Side::B
            }
        );
        assert_eq!(
            destination(1, 3),
            Destination {
                round: 2,
                match_number: 2,
                side: Side::A
            }
        );
        assert_eq!(
            destination(3, 8),
            Destination {
                round: 4,
                match_number: 4,
                side: Side::B
            }
        );
    }

    #[test]
    fn test_final_round_crowns_champion() {
        let advancement = resolve(MatchKey::new(1, 3, 1), 42, 3).unwrap();
        assert_eq!(advancement, Advancement::Champion { participant_id: 42 });

        let advancement = resolve(MatchKey::new(1, 2, 2), 42, 3).unwrap();
        assert_eq!(
            advancement,
            Advancement::Advance(Destination {
                round: 3,
                match_number: 1,
                side: Side::B
            })
        );
    }

    #[test]
    fn test_resolve_outside_bracket() {
        assert!(resolve(MatchKey::new(1, 4, 1), 1, 3).is_err());
        assert!(resolve(MatchKey::new(1, 0, 1), 1, 3).is_err());
        assert!(resolve(MatchKey::new(1, 1, 0), 1, 3).is_err());
    }

    #[test]
    fn test_write_winner_fills_empty_slot_once() {
        let mut target = Match::pending(MatchKey::new(1, 2, 1), Slot::Empty, Slot::Empty);

        write_winner(&mut target, Side::B, 7).unwrap();
        assert_eq!(target.slot_b, Slot::Participant(7));
        assert_eq!(target.slot_a, Slot::Empty);
        assert_eq!(target.status, MatchStatus::Pending);

        let err = write_winner(&mut target, Side::B, 8).unwrap_err();
        assert!(matches!(err, TournamentError::BracketCorrupted(_)));
        assert_eq!(target.slot_b, Slot::Participant(7));
    }

    #[test]
    fn test_advancement_json() {
        let json = serde_json::to_value(Advancement::Champion { participant_id: 3 }).unwrap();
        assert_eq!(json["kind"], "champion");
        assert_eq!(json["participant_id"], 3);

        let json = serde_json::to_value(Advancement::Advance(destination(1, 1))).unwrap();
        assert_eq!(json["kind"], "advance");
        assert_eq!(json["side"], "a");
    }
}
