//! Bracket sizing and seeding.
//!
//! The bracket is always a power of two. Real participants are ordered by the
//! tournament's [`SeedingStrategy`] and the remaining positions are filled
//! with byes.

use enum_dispatch::enum_dispatch;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::models::Slot;
use crate::tournament::{ParticipantId, TournamentError, TournamentResult};

/// Fewest participants that make a bracket
pub const MIN_PARTICIPANTS: usize = 2;

/// Smallest power of two that holds `participants` entrants.
pub fn bracket_capacity(participants: usize) -> TournamentResult<usize> {
    if participants < MIN_PARTICIPANTS {
        return Err(TournamentError::InsufficientParticipants {
            needed: MIN_PARTICIPANTS,
            current: participants,
        });
    }

    Ok(participants.next_power_of_two())
}

/// Number of rounds in a bracket of the given power-of-two size
pub fn round_count(capacity: usize) -> u32 {
    capacity.trailing_zeros()
}

/// Orders the real participants before byes are appended.
#[enum_dispatch]
pub trait Seeder {
    fn order(&self, participants: &mut Vec<ParticipantId>);
}

/// Shuffle participants. A fixed `seed` makes the draw reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSeeding {
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Seeder for RandomSeeding {
    fn order(&self, participants: &mut Vec<ParticipantId>) {
        match self.seed {
            Some(seed) => participants.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => participants.shuffle(&mut rand::rng()),
        }
    }
}

/// Keep the caller's order (registration order or an admin seed list).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreserveOrder;

impl Seeder for PreserveOrder {
    fn order(&self, _participants: &mut Vec<ParticipantId>) {}
}

/// Seeding policy chosen per tournament
#[enum_dispatch(Seeder)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingStrategy {
    Random(RandomSeeding),
    PreserveOrder(PreserveOrder),
}

impl Default for SeedingStrategy {
    fn default() -> Self {
        SeedingStrategy::Random(RandomSeeding::default())
    }
}

impl FromStr for SeedingStrategy {
    type Err = TournamentError;

    /// Parse `random`, `random:<seed>` or `preserve_order`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "random" => Ok(RandomSeeding::default().into()),
            "preserve_order" => Ok(PreserveOrder.into()),
            other => match other.strip_prefix("random:").map(str::parse::<u64>) {
                Some(Ok(seed)) => Ok(RandomSeeding { seed: Some(seed) }.into()),
                _ => Err(TournamentError::InvalidConfig(format!(
                    "unknown seeding strategy '{other}'"
                ))),
            },
        }
    }
}

/// Seed the participants and pad to the bracket capacity with byes.
///
/// The returned sequence has a power-of-two length and exactly
/// `capacity - participants.len()` trailing byes.
pub fn seed_participants(
    participants: &[ParticipantId],
    strategy: &SeedingStrategy,
) -> TournamentResult<Vec<Slot>> {
    let capacity = bracket_capacity(participants.len())?;

    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(duplicate) = participants.iter().find(|id| !seen.insert(**id)) {
        return Err(TournamentError::DuplicateParticipant(*duplicate));
    }

    let mut ordered = participants.to_vec();
    strategy.order(&mut ordered);

    let mut seeded: Vec<Slot> = ordered.into_iter().map(Slot::Participant).collect();
    seeded.resize(capacity, Slot::Bye);

    Ok(seeded)
}
