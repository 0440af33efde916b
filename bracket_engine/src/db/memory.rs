//! In-process repository used by tests, benchmarks and `STORAGE=memory`.
//!
//! All state sits behind a single mutex, so every trait method observes and
//! mutates a consistent snapshot. Conditional writes validate first and
//! mutate second, which gives the same all-or-nothing behaviour as the
//! PostgreSQL transactions.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::repository::BracketRepository;
use crate::bracket::{Advancement, BracketPlan, Match, MatchKey, MatchResult, Slot};
use crate::tournament::{
    ParticipantId, Registration, RegistrationStatus, Tournament, TournamentConfig, TournamentError,
    TournamentId, TournamentResult, TournamentStatus,
};

#[derive(Default)]
struct State {
    next_id: TournamentId,
    tournaments: BTreeMap<TournamentId, Tournament>,
    /// Registrations per tournament, in registration order
    registrations: HashMap<TournamentId, Vec<Registration>>,
    matches: BTreeMap<MatchKey, Match>,
}

impl State {
    fn tournament(&self, id: TournamentId) -> TournamentResult<&Tournament> {
        self.tournaments
            .get(&id)
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    fn tournament_mut(&mut self, id: TournamentId) -> TournamentResult<&mut Tournament> {
        self.tournaments
            .get_mut(&id)
            .ok_or(TournamentError::TournamentNotFound(id))
    }
}

/// Mutex-guarded map storage
#[derive(Default)]
pub struct InMemoryBracketRepository {
    state: Mutex<State>,
}

impl InMemoryBracketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave a half-applied write:
        // every mutation happens after its validation.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BracketRepository for InMemoryBracketRepository {
    async fn create_tournament(&self, config: &TournamentConfig) -> TournamentResult<TournamentId> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;

        state.tournaments.insert(
            id,
            Tournament {
                id,
                config: config.clone(),
                status: TournamentStatus::Draft,
                bracket_size: None,
                champion: None,
                created_at: Utc::now(),
                started_at: None,
                finished_at: None,
            },
        );

        Ok(id)
    }

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.lock().tournaments.get(&id).cloned())
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<Tournament>> {
        Ok(self
            .lock()
            .tournaments
            .values()
            .rev()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> TournamentResult<bool> {
        let mut state = self.lock();
        let tournament = state.tournament_mut(id)?;
        if tournament.status != from {
            return Ok(false);
        }
        tournament.status = to;
        Ok(true)
    }

    async fn add_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        status: RegistrationStatus,
        capacity: u32,
    ) -> TournamentResult<Registration> {
        let mut state = self.lock();
        state
            .tournament(tournament_id)?
            .status
            .ensure_accepting_registrations()?;

        let entries = state.registrations.entry(tournament_id).or_default();
        let existing = entries
            .iter()
            .position(|r| r.participant_id == participant_id);

        if existing.is_some_and(|index| entries[index].status != RegistrationStatus::Withdrawn) {
            return Err(TournamentError::AlreadyRegistered);
        }

        let active = entries
            .iter()
            .filter(|r| r.status != RegistrationStatus::Withdrawn)
            .count();
        if active >= capacity as usize {
            return Err(TournamentError::TournamentFull);
        }

        // A reinstated registration moves to the back of the queue
        if let Some(index) = existing {
            entries.remove(index);
        }

        let registration = Registration {
            tournament_id,
            participant_id,
            status,
            registered_at: Utc::now(),
        };
        entries.push(registration.clone());
        Ok(registration)
    }

    async fn update_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        from: &[RegistrationStatus],
        to: RegistrationStatus,
    ) -> TournamentResult<bool> {
        let mut state = self.lock();
        state
            .tournament(tournament_id)?
            .status
            .ensure_registrations_mutable()?;

        let entry = state
            .registrations
            .get_mut(&tournament_id)
            .and_then(|entries| {
                entries
                    .iter_mut()
                    .find(|r| r.participant_id == participant_id && from.contains(&r.status))
            });

        match entry {
            Some(registration) => {
                registration.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_registrations(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Registration>> {
        Ok(self
            .lock()
            .registrations
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn start_bracket(&self, plan: &BracketPlan) -> TournamentResult<()> {
        let mut state = self.lock();
        let tournament = state.tournament_mut(plan.tournament_id)?;
        tournament.status.ensure_startable()?;

        tournament.status = TournamentStatus::Active;
        tournament.bracket_size = Some(plan.capacity);
        tournament.started_at = Some(Utc::now());

        for m in &plan.matches {
            state.matches.insert(m.key(), m.clone());
        }

        Ok(())
    }

    async fn get_match(&self, key: MatchKey) -> TournamentResult<Option<Match>> {
        Ok(self.lock().matches.get(&key).cloned())
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>> {
        let lower = MatchKey::new(tournament_id, 0, 0);
        let upper = MatchKey::new(tournament_id, u32::MAX, u32::MAX);
        Ok(self
            .lock()
            .matches
            .range(lower..=upper)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn apply_result(
        &self,
        result: &MatchResult,
        advancement: &Advancement,
    ) -> TournamentResult<Match> {
        let mut state = self.lock();
        let key = result.key;

        let current = state
            .matches
            .get(&key)
            .ok_or(TournamentError::MatchNotFound(key))?;
        let contestants = (current.slot_a.participant(), current.slot_b.participant());
        if current.is_completed() || contestants.0.is_none() || contestants.1.is_none() {
            return Err(TournamentError::MatchConflict(key));
        }

        match advancement {
            Advancement::Advance(dest) => {
                let dest_key = dest.key(key.tournament_id);
                let target = state.matches.get(&dest_key).ok_or_else(|| {
                    TournamentError::BracketCorrupted(format!("missing destination {dest_key}"))
                })?;
                if target.is_completed() || !target.slot(dest.side).is_empty() {
                    return Err(TournamentError::BracketCorrupted(format!(
                        "slot {} of {dest_key} was already filled",
                        dest.side.as_str()
                    )));
                }
            }
            Advancement::Champion { .. } => {
                state
                    .tournament(key.tournament_id)?
                    .ensure_status(TournamentStatus::Active)?;
            }
        }

        // Validation done, nothing below can fail
        let now = Utc::now();
        match *advancement {
            Advancement::Advance(dest) => {
                if let Some(target) = state.matches.get_mut(&dest.key(key.tournament_id)) {
                    *target.slot_mut(dest.side) = Slot::Participant(result.winner);
                }
            }
            Advancement::Champion { participant_id } => {
                if let Some(tournament) = state.tournaments.get_mut(&key.tournament_id) {
                    tournament.status = TournamentStatus::Completed;
                    tournament.champion = Some(participant_id);
                    tournament.finished_at = Some(now);
                }
            }
        }

        let completed = match state.matches.get_mut(&key) {
            Some(m) => {
                m.complete(result, now);
                m.clone()
            }
            None => return Err(TournamentError::MatchNotFound(key)),
        };

        Ok(completed)
    }
}
