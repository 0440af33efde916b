//! Single-elimination bracket algorithms.
//!
//! Generation runs once per tournament, leaf-first:
//!
//! 1. [`seeding`]: size the bracket to the next power of two, order the real
//!    participants and pad with byes
//! 2. [`pairing`]: outside-in round-1 pairs
//! 3. [`byes`]: auto-complete round-1 matches that face a bye
//! 4. [`skeleton`]: empty matches for rounds 2 to the final
//!
//! [`plan::BracketPlan`] ties these together. After generation each score
//! report goes through the [`state_machine`] and then [`advancement`].
//!
//! Everything in this module is pure; persistence lives in [`crate::db`].

pub mod advancement;
pub mod byes;
pub mod models;
pub mod pairing;
pub mod plan;
pub mod seeding;
pub mod skeleton;
pub mod state_machine;

pub use advancement::{Advancement, Destination};
pub use models::{Bracket, Match, MatchKey, MatchStatus, Round, Side, Slot};
pub use plan::BracketPlan;
pub use seeding::{
    MIN_PARTICIPANTS, PreserveOrder, RandomSeeding, Seeder, SeedingStrategy, bracket_capacity,
    round_count,
};
pub use state_machine::MatchResult;
