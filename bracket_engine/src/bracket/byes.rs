//! Round-1 bye resolution.

use super::models::{Match, MatchStatus, Slot};
use crate::tournament::{ParticipantId, TournamentError, TournamentResult};

/// Auto-complete a round-1 match that has a bye on exactly one side.
///
/// Returns the advancing participant, or `None` when both sides are real
/// and the match must be played. Scores stay at 0/0 and are not a result.
pub fn resolve_bye(m: &mut Match) -> TournamentResult<Option<ParticipantId>> {
    if m.round != 1 {
        return Err(TournamentError::BracketCorrupted(format!(
            "bye resolution requested for round {}",
            m.round
        )));
    }

    let winner = match (m.slot_a, m.slot_b) {
        (Slot::Participant(_), Slot::Participant(_)) => return Ok(None),
        (Slot::Participant(id), Slot::Bye) | (Slot::Bye, Slot::Participant(id)) => id,
        (a, b) => {
            return Err(TournamentError::BracketCorrupted(format!(
                "round 1 match {} pairs {a} against {b}",
                m.match_number
            )));
        }
    };

    m.winner = Some(winner);
    m.status = MatchStatus::Completed;

    Ok(Some(winner))
}

/// Resolve every bye in round 1, returning `(match_number, winner)` for each
/// auto-completed match.
pub fn resolve_byes(round_one: &mut [Match]) -> TournamentResult<Vec<(u32, ParticipantId)>> {
    let mut advanced = Vec::new();
    for m in round_one.iter_mut() {
        if let Some(winner) = resolve_bye(m)? {
            advanced.push((m.match_number, winner));
        }
    }

    Ok(advanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::MatchKey;

    fn round_one(match_number: u32, a: Slot, b: Slot) -> Match {
        Match::pending(MatchKey::new(1, 1, match_number), a, b)
    }

    #[test]
    fn test_bye_on_either_side_advances_participant() {
        let mut m = round_one(1, Slot::Participant(10), Slot::Bye);
        assert_eq!(resolve_bye(&mut m).unwrap(), Some(10));
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.winner, Some(10));
        assert_eq!((m.score_a, m.score_b), (0, 0));

        let mut m = round_one(2, Slot::Bye, Slot::Participant(11));
        assert_eq!(resolve_bye(&mut m).unwrap(), Some(11));
    }

    #[test]
    fn test_real_match_stays_pending() {
        let mut m = round_one(1, Slot::Participant(1), Slot::Participant(2));
        assert_eq!(resolve_bye(&mut m).unwrap(), None);
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.winner, None);
    }

    #[test]
    fn test_double_bye_is_invariant_violation() {
        let mut m = round_one(4, Slot::Bye, Slot::Bye);
        assert!(matches!(
            resolve_bye(&mut m),
            Err(TournamentError::BracketCorrupted(_))
        ));
        assert_eq!(m.status, MatchStatus::Pending);
    }

    #[test]
    fn test_only_round_one() {
        let mut m = Match::pending(MatchKey::new(1, 2, 1), Slot::Participant(1), Slot::Bye);
        assert!(resolve_bye(&mut m).is_err());
    }

    #[test]
    fn test_resolve_byes_reports_each_advance() {
        let mut matches = vec![
            round_one(1, Slot::Participant(1), Slot::Bye),
            round_one(2, Slot::Participant(2), Slot::Participant(3)),
            round_one(3, Slot::Participant(4), Slot::Bye),
        ];
        let advanced = resolve_byes(&mut matches).unwrap();
        assert_eq!(advanced, vec![(1, 1), (3, 4)]);
    }
}
