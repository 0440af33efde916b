//! Single-elimination tournaments.
//!
//! This module provides the tournament lifecycle around the pure
//! [`crate::bracket`] algorithms:
//! - Tournament creation and configuration
//! - Participant registration, approval and withdrawal
//! - Bracket generation from the approved participants
//! - Score reporting, winner advancement and champion determination
//! - Admin command dispatch
//!
//! ## Example
//!
//! ```no_run
//! use bracket_engine::tournament::{TournamentConfig, TournamentManager};
//! use bracket_engine::bracket::MatchKey;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::in_memory();
//!
//!     let config = TournamentConfig::single_elimination("Autumn Cup", 8);
//!     let id = manager.create_tournament(config).await?;
//!     manager.open_registration(id).await?;
//!
//!     for member in [101, 102, 103, 104, 105] {
//!         manager.register_participant(id, member).await?;
//!     }
//!
//!     let created = manager.start_tournament(id).await?;
//!     println!("{} rounds, {} byes", created.round_count, created.byes);
//!
//!     let bracket = manager.get_bracket(id).await?;
//!     if let Some(m) = bracket.round(1).and_then(|r| r.matches.iter().find(|m| !m.is_completed())) {
//!         manager
//!             .report_score(MatchKey::new(id, 1, m.match_number), 3, 1, None)
//!             .await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod errors;
pub mod manager;
pub mod models;

pub use actions::{AdminAction, AdminOutcome, BracketCreated, MatchCompleted};
pub use errors::{ScoreRejection, TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    MAX_CAPACITY, MIN_CAPACITY, ParticipantId, Registration, RegistrationStatus, Tournament,
    TournamentConfig, TournamentId, TournamentStatus,
};
