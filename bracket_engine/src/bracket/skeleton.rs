//! Match slot creation for every round of the bracket.

use super::models::{Match, MatchKey, Slot};
use super::seeding::round_count;
use crate::tournament::TournamentId;

/// Round-1 matches from the outside-in pairs, numbered from 1.
pub fn round_one(tournament_id: TournamentId, pairs: &[(Slot, Slot)]) -> Vec<Match> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, &(a, b))| Match::pending(MatchKey::new(tournament_id, 1, i as u32 + 1), a, b))
        .collect()
}

/// Empty, pending matches for rounds `2..=round_count(capacity)`. Round `r`
/// holds `capacity / 2^r` matches.
pub fn later_rounds(tournament_id: TournamentId, capacity: usize) -> Vec<Match> {
    let rounds = round_count(capacity);
    let mut matches = Vec::with_capacity(capacity / 2);

    for round in 2..=rounds {
        let matches_in_round = (capacity >> round) as u32;
        for match_number in 1..=matches_in_round {
            matches.push(Match::pending(
                MatchKey::new(tournament_id, round, match_number),
                Slot::Empty,
                Slot::Empty,
            ));
        }
    }

    matches
}

/// Position of `(round, match_number)` in a round-major match list of a
/// bracket with `capacity` positions.
pub fn match_index(capacity: usize, round: u32, match_number: u32) -> usize {
    let preceding = capacity - (capacity >> (round - 1));
    preceding + match_number as usize - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::MatchStatus;

    #[test]
    fn test_later_rounds_shape() {
        let matches = later_rounds(5, 16);
        // 4 + 2 + 1
        assert_eq!(matches.len(), 7);
        assert_eq!(matches.iter().filter(|m| m.round == 2).count(), 4);
        assert_eq!(matches.iter().filter(|m| m.round == 3).count(), 2);
        assert_eq!(matches.iter().filter(|m| m.round == 4).count(), 1);
        assert!(matches.iter().all(|m| {
            m.slot_a == Slot::Empty
                && m.slot_b == Slot::Empty
                && m.status == MatchStatus::Pending
                && m.tournament_id == 5
        }));
    }

    #[test]
    fn test_two_person_bracket_has_no_later_rounds() {
        assert!(later_rounds(1, 2).is_empty());
    }

    #[test]
    fn test_round_one_numbering() {
        let pairs = vec![
            (Slot::Participant(1), Slot::Bye),
            (Slot::Participant(2), Slot::Participant(3)),
        ];
        let matches = round_one(9, &pairs);
        assert_eq!(matches[0].key(), MatchKey::new(9, 1, 1));
        assert_eq!(matches[1].key(), MatchKey::new(9, 1, 2));
        assert_eq!(matches[1].slot_b, Slot::Participant(3));
    }

    #[test]
    fn test_match_index() {
        let capacity = 8;
        let mut all = round_one(1, &[(Slot::Bye, Slot::Bye); 4]);
        all.extend(later_rounds(1, capacity));

        for (i, m) in all.iter().enumerate() {
            assert_eq!(match_index(capacity, m.round, m.match_number), i);
        }
    }
}
