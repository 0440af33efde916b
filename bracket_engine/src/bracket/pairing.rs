//! Outside-in round-1 pairing.

use super::models::Slot;
use crate::tournament::{TournamentError, TournamentResult};

/// Pair `seeded[i]` against `seeded[len - 1 - i]` for each `i` in the first
/// half. Byes sit at the tail of the seeded sequence, so each one meets a
/// real participant from the head instead of another bye.
pub fn outside_in_pairs(seeded: &[Slot]) -> TournamentResult<Vec<(Slot, Slot)>> {
    let capacity = seeded.len();
    if capacity < 2 || !capacity.is_power_of_two() {
        return Err(TournamentError::BracketCorrupted(format!(
            "seeded sequence length {capacity} is not a power of two"
        )));
    }

    Ok((0..capacity / 2)
        .map(|i| (seeded[i], seeded[capacity - 1 - i]))
        .collect())
}
