//! # Bracket Engine
//!
//! Single-elimination tournament brackets: sizing to a power of two, bye
//! distribution by outside-in pairing, a `pending -> completed` match state
//! machine and winner advancement up to the champion.
//!
//! ## Core Modules
//!
//! - [`bracket`]: pure bracket algorithms (seeding, pairing, byes, skeleton,
//!   state machine, advancement)
//! - [`tournament`]: tournament lifecycle, registration and the
//!   [`TournamentManager`] entry point
//! - [`db`]: PostgreSQL and in-memory storage behind [`db::BracketRepository`]
//!
//! ## Example
//!
//! ```
//! use bracket_engine::bracket::{BracketPlan, PreserveOrder, Slot};
//!
//! let plan = BracketPlan::generate(1, &[1, 2, 3, 4, 5], &PreserveOrder.into()).unwrap();
//! assert_eq!(plan.capacity, 8);
//! assert_eq!(plan.bye_count(), 3);
//!
//! let bracket = plan.into_bracket();
//! assert_eq!(bracket.get(2, 1).unwrap().slot_a, Slot::Participant(1));
//! ```

/// Bracket algorithms and match model.
pub mod bracket;
pub use bracket::{Bracket, BracketPlan, Match, MatchKey, SeedingStrategy, Slot};

/// PostgreSQL pool, migrations and repositories.
pub mod db;

/// Tournament lifecycle and manager.
pub mod tournament;
pub use tournament::{
    AdminAction, AdminOutcome, TournamentConfig, TournamentError, TournamentId, TournamentManager,
    TournamentResult,
};
