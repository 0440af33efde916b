//! Full bracket generation, before anything is persisted.

use serde::{Deserialize, Serialize};

use super::advancement::{destination, write_winner};
use super::byes::resolve_byes;
use super::models::{Bracket, Match};
use super::pairing::outside_in_pairs;
use super::seeding::{SeedingStrategy, round_count, seed_participants};
use super::skeleton::{later_rounds, match_index, round_one};
use crate::tournament::{ParticipantId, TournamentId, TournamentResult};

/// Every match of a freshly generated bracket, in round-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPlan {
    pub tournament_id: TournamentId,
    /// Power-of-two bracket size
    pub capacity: u32,
    /// Number of real participants
    pub participants: u32,
    pub matches: Vec<Match>,
}

impl BracketPlan {
    /// Seed, pair, resolve byes and lay out every later round.
    ///
    /// Bye winners are written into their round-2 slots here, so the stored
    /// bracket never holds a completed match whose winner has not advanced.
    pub fn generate(
        tournament_id: TournamentId,
        participants: &[ParticipantId],
        seeding: &SeedingStrategy,
    ) -> TournamentResult<Self> {
        let seeded = seed_participants(participants, seeding)?;
        let capacity = seeded.len();

        let pairs = outside_in_pairs(&seeded)?;
        let mut matches = round_one(tournament_id, &pairs);
        let advanced = resolve_byes(&mut matches)?;
        matches.extend(later_rounds(tournament_id, capacity));

        for (match_number, winner) in advanced {
            let dest = destination(1, match_number);
            let target = &mut matches[match_index(capacity, dest.round, dest.match_number)];
            write_winner(target, dest.side, winner)?;
        }

        Ok(Self {
            tournament_id,
            capacity: capacity as u32,
            participants: participants.len() as u32,
            matches,
        })
    }

    pub fn round_count(&self) -> u32 {
        round_count(self.capacity as usize)
    }

    pub fn bye_count(&self) -> u32 {
        self.capacity - self.participants
    }

    pub fn round_one(&self) -> &[Match] {
        &self.matches[..self.capacity as usize / 2]
    }

    pub fn into_bracket(self) -> Bracket {
        Bracket::from_matches(self.tournament_id, self.matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{MatchStatus, PreserveOrder, Slot};

    const A: ParticipantId = 1;
    const B: ParticipantId = 2;
    const C: ParticipantId = 3;
    const D: ParticipantId = 4;
    const E: ParticipantId = 5;

    #[test]
    fn test_five_participants() {
        let plan = BracketPlan::generate(1, &[A, B, C, D, E], &PreserveOrder.into()).unwrap();

        assert_eq!(plan.capacity, 8);
        assert_eq!(plan.bye_count(), 3);
        assert_eq!(plan.round_count(), 3);
        assert_eq!(plan.matches.len(), 7);

        let r1 = plan.round_one();
        assert_eq!((r1[0].slot_a, r1[0].slot_b), (Slot::Participant(A), Slot::Bye));
        assert_eq!((r1[1].slot_a, r1[1].slot_b), (Slot::Participant(B), Slot::Bye));
        assert_eq!((r1[2].slot_a, r1[2].slot_b), (Slot::Participant(C), Slot::Bye));
        assert_eq!(
            (r1[3].slot_a, r1[3].slot_b),
            (Slot::Participant(D), Slot::Participant(E))
        );

        assert_eq!(r1[0].winner, Some(A));
        assert_eq!(r1[1].winner, Some(B));
        assert_eq!(r1[2].winner, Some(C));
        assert_eq!(r1[3].status, MatchStatus::Pending);

        let bracket = plan.into_bracket();
        let semi_1 = bracket.get(2, 1).unwrap();
        assert_eq!((semi_1.slot_a, semi_1.slot_b), (Slot::Participant(A), Slot::Participant(B)));
        let semi_2 = bracket.get(2, 2).unwrap();
        assert_eq!((semi_2.slot_a, semi_2.slot_b), (Slot::Participant(C), Slot::Empty));
        let final_match = bracket.get(3, 1).unwrap();
        assert_eq!((final_match.slot_a, final_match.slot_b), (Slot::Empty, Slot::Empty));
    }

    #[test]
    fn test_power_of_two_has_no_byes() {
        let plan = BracketPlan::generate(1, &[A, B, C, D], &PreserveOrder.into()).unwrap();
        assert_eq!(plan.bye_count(), 0);
        assert!(plan.matches.iter().all(|m| m.status == MatchStatus::Pending));
        assert!(plan.matches.iter().all(|m| !m.is_bye()));
    }

    #[test]
    fn test_two_participants_single_final() {
        let plan = BracketPlan::generate(1, &[A, B], &PreserveOrder.into()).unwrap();
        assert_eq!(plan.round_count(), 1);
        assert_eq!(plan.matches.len(), 1);
        assert_eq!(plan.matches[0].slot_a, Slot::Participant(A));
        assert_eq!(plan.matches[0].slot_b, Slot::Participant(B));
    }

    #[test]
    fn test_three_participants() {
        let plan = BracketPlan::generate(1, &[A, B, C], &PreserveOrder.into()).unwrap();
        assert_eq!(plan.capacity, 4);

        let bracket = plan.into_bracket();
        assert_eq!(bracket.get(1, 1).unwrap().winner, Some(A));
        assert_eq!(bracket.get(1, 2).unwrap().slot_a, Slot::Participant(B));
        assert_eq!(bracket.get(1, 2).unwrap().slot_b, Slot::Participant(C));
        assert_eq!(bracket.get(2, 1).unwrap().slot_a, Slot::Participant(A));
        assert_eq!(bracket.get(2, 1).unwrap().slot_b, Slot::Empty);
    }
}
