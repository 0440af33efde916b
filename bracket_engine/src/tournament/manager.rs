//! Tournament manager: lifecycle, registration, bracket generation and score
//! reporting on top of a [`BracketRepository`].

use sqlx::PgPool;
use std::sync::Arc;

use super::actions::{AdminAction, AdminOutcome, BracketCreated, MatchCompleted};
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    ParticipantId, Registration, RegistrationStatus, Tournament, TournamentConfig, TournamentId,
    TournamentStatus,
};
use crate::bracket::advancement::resolve as resolve_advancement;
use crate::bracket::{Advancement, Bracket, BracketPlan, MIN_PARTICIPANTS, Match, MatchKey};
use crate::db::{BracketRepository, InMemoryBracketRepository, PgBracketRepository};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    repo: Arc<dyn BracketRepository>,
}

impl TournamentManager {
    /// Create a manager over any repository
    pub fn new(repo: Arc<dyn BracketRepository>) -> Self {
        Self { repo }
    }

    /// Create a manager backed by PostgreSQL
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self::new(Arc::new(PgBracketRepository::new(pool.as_ref().clone())))
    }

    /// Create a manager with process-local storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBracketRepository::new()))
    }

    /// Create a new tournament in `draft`. The name is stored trimmed.
    pub async fn create_tournament(
        &self,
        mut config: TournamentConfig,
    ) -> TournamentResult<TournamentId> {
        config.name = config.name.trim().to_string();
        config.validate()?;
        let id = self.repo.create_tournament(&config).await?;
        log::info!(
            "Created tournament {} '{}' (capacity {})",
            id,
            config.name,
            config.capacity
        );
        Ok(id)
    }

    pub async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.repo
            .get_tournament(id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    pub async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<Tournament>> {
        self.repo.list_tournaments(status).await
    }

    /// `draft -> registration`
    pub async fn open_registration(&self, id: TournamentId) -> TournamentResult<TournamentStatus> {
        self.transition(id, TournamentStatus::Draft, TournamentStatus::Registration)
            .await
    }

    /// `registration -> draft`
    pub async fn close_registration(&self, id: TournamentId) -> TournamentResult<TournamentStatus> {
        self.transition(id, TournamentStatus::Registration, TournamentStatus::Draft)
            .await
    }

    async fn transition(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> TournamentResult<TournamentStatus> {
        if self.repo.transition_status(id, from, to).await? {
            log::info!("Tournament {} moved from {} to {}", id, from, to);
            return Ok(to);
        }

        let tournament = self.get_tournament(id).await?;
        Err(TournamentError::InvalidState {
            expected: from,
            actual: tournament.status,
        })
    }

    /// Register a participant; approved right away when the tournament
    /// auto-approves, pending otherwise.
    pub async fn register_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<Registration> {
        let tournament = self.get_tournament(tournament_id).await?;
        tournament.status.ensure_accepting_registrations()?;

        let status = if tournament.config.auto_approve {
            RegistrationStatus::Approved
        } else {
            RegistrationStatus::Pending
        };

        let registration = self
            .repo
            .add_registration(
                tournament_id,
                participant_id,
                status,
                tournament.config.capacity,
            )
            .await?;

        log::info!(
            "Participant {} registered for tournament {} ({})",
            participant_id,
            tournament_id,
            registration.status
        );
        Ok(registration)
    }

    /// `pending -> approved`
    pub async fn approve_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        let updated = self
            .repo
            .update_registration(
                tournament_id,
                participant_id,
                &[RegistrationStatus::Pending],
                RegistrationStatus::Approved,
            )
            .await?;

        if !updated {
            return Err(TournamentError::RegistrationNotFound(participant_id));
        }
        Ok(())
    }

    /// Withdraw a pending or approved registration before the bracket exists
    pub async fn withdraw_participant(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
    ) -> TournamentResult<()> {
        let updated = self
            .repo
            .update_registration(
                tournament_id,
                participant_id,
                &[RegistrationStatus::Pending, RegistrationStatus::Approved],
                RegistrationStatus::Withdrawn,
            )
            .await?;

        if !updated {
            return Err(TournamentError::RegistrationNotFound(participant_id));
        }

        log::info!(
            "Participant {} withdrew from tournament {}",
            participant_id,
            tournament_id
        );
        Ok(())
    }

    pub async fn list_registrations(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Registration>> {
        self.get_tournament(tournament_id).await?;
        self.repo.list_registrations(tournament_id).await
    }

    /// Approved participants in registration order
    pub async fn approved_participants(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<ParticipantId>> {
        Ok(self
            .list_registrations(tournament_id)
            .await?
            .into_iter()
            .filter(|r| r.status == RegistrationStatus::Approved)
            .map(|r| r.participant_id)
            .collect())
    }

    /// Generate the bracket from the approved registrations
    pub async fn start_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<BracketCreated> {
        let participants = self.approved_participants(tournament_id).await?;
        self.generate_bracket(tournament_id, participants).await
    }

    /// Build and persist the bracket for `participants`, moving the
    /// tournament `registration -> active`.
    ///
    /// Nothing is written unless the whole bracket is valid; a concurrent
    /// start that wins the status transition makes this call fail with
    /// `AlreadyStarted`.
    pub async fn generate_bracket(
        &self,
        tournament_id: TournamentId,
        participants: Vec<ParticipantId>,
    ) -> TournamentResult<BracketCreated> {
        let tournament = self.get_tournament(tournament_id).await?;
        tournament.status.ensure_startable()?;

        if participants.len() < MIN_PARTICIPANTS {
            return Err(TournamentError::InsufficientParticipants {
                needed: MIN_PARTICIPANTS,
                current: participants.len(),
            });
        }

        if participants.len() > tournament.config.capacity as usize {
            return Err(TournamentError::CapacityExceeded {
                capacity: tournament.config.capacity,
                requested: participants.len(),
            });
        }

        let plan = BracketPlan::generate(tournament_id, &participants, &tournament.config.seeding)?;
        self.repo.start_bracket(&plan).await?;

        log::info!(
            "Generated bracket for tournament {}: {} participants, capacity {}, {} byes",
            tournament_id,
            plan.participants,
            plan.capacity,
            plan.bye_count()
        );

        Ok(BracketCreated {
            tournament_id,
            capacity: plan.capacity,
            round_count: plan.round_count(),
            byes: plan.bye_count(),
            bracket: plan.into_bracket(),
        })
    }

    /// Report the score of a match and advance its winner.
    ///
    /// `reporter` is recorded for audit only; callers authorize it.
    ///
    /// # Errors
    ///
    /// * `MatchNotFound` - no such match
    /// * `InvalidScoreReport` - already decided, tied scores or slots not filled
    /// * `MatchConflict` - a concurrent report completed the match first
    pub async fn report_score(
        &self,
        key: MatchKey,
        score_a: u32,
        score_b: u32,
        reporter: Option<i64>,
    ) -> TournamentResult<MatchCompleted> {
        // Tournament first: once it reads as completed, every match does too
        let tournament = self
            .repo
            .get_tournament(key.tournament_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(key))?;
        let current = self
            .repo
            .get_match(key)
            .await?
            .ok_or(TournamentError::MatchNotFound(key))?;

        let result = match current.check_report(score_a, score_b, reporter) {
            Ok(result) => result,
            Err(rejection) => {
                log::warn!("Rejected score report for {}: {}", key, rejection);
                return Err(TournamentError::InvalidScoreReport(rejection));
            }
        };

        tournament.ensure_status(TournamentStatus::Active)?;
        let round_count = tournament.round_count().ok_or_else(|| {
            TournamentError::BracketCorrupted(format!(
                "active tournament {} has no bracket size",
                tournament.id
            ))
        })?;

        let advancement = resolve_advancement(key, result.winner, round_count)?;

        let completed = match self.repo.apply_result(&result, &advancement).await {
            Ok(completed) => completed,
            Err(e @ TournamentError::MatchConflict(_)) => {
                log::warn!("Lost concurrent score report for {}", key);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        log::info!(
            "Match {} completed {}-{}, winner {}",
            key,
            score_a,
            score_b,
            result.winner
        );
        match advancement {
            Advancement::Advance(dest) => log::info!(
                "Participant {} advanced to {} slot {}",
                result.winner,
                dest.key(key.tournament_id),
                dest.side.as_str()
            ),
            Advancement::Champion { participant_id } => log::info!(
                "Tournament {} completed, champion {}",
                key.tournament_id,
                participant_id
            ),
        }

        Ok(MatchCompleted {
            completed,
            advancement,
        })
    }

    /// Rounds of matches for display
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> TournamentResult<Bracket> {
        self.get_tournament(tournament_id).await?;
        let matches = self.repo.list_matches(tournament_id).await?;
        Ok(Bracket::from_matches(tournament_id, matches))
    }

    pub async fn get_match(&self, key: MatchKey) -> TournamentResult<Match> {
        self.repo
            .get_match(key)
            .await?
            .ok_or(TournamentError::MatchNotFound(key))
    }

    /// Apply an admin panel command. `actor` is recorded as the reporter of
    /// score reports.
    pub async fn apply_admin_action(
        &self,
        tournament_id: TournamentId,
        action: AdminAction,
        actor: Option<i64>,
    ) -> TournamentResult<AdminOutcome> {
        match action {
            AdminAction::OpenRegistration => {
                let status = self.open_registration(tournament_id).await?;
                Ok(AdminOutcome::StatusChanged { status })
            }
            AdminAction::CloseRegistration => {
                let status = self.close_registration(tournament_id).await?;
                Ok(AdminOutcome::StatusChanged { status })
            }
            AdminAction::Start => Ok(AdminOutcome::BracketCreated(
                self.start_tournament(tournament_id).await?,
            )),
            AdminAction::ReportScore {
                round,
                match_number,
                score_a,
                score_b,
            } => {
                let key = MatchKey::new(tournament_id, round, match_number);
                Ok(AdminOutcome::MatchCompleted(
                    self.report_score(key, score_a, score_b, actor).await?,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{PreserveOrder, Slot};
    use crate::tournament::ScoreRejection;

    async fn registering(manager: &TournamentManager, capacity: u32) -> TournamentId {
        let config = TournamentConfig::single_elimination("Spring Open", capacity)
            .with_seeding(PreserveOrder.into());
        let id = manager.create_tournament(config).await.unwrap();
        manager.open_registration(id).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config() {
        let manager = TournamentManager::in_memory();
        let err = manager
            .create_tournament(TournamentConfig::single_elimination("", 8))
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_create_stores_trimmed_name() {
        let manager = TournamentManager::in_memory();
        let id = manager
            .create_tournament(TournamentConfig::single_elimination("  Spring Open  ", 8))
            .await
            .unwrap();

        let tournament = manager.get_tournament(id).await.unwrap();
        assert_eq!(tournament.config.name, "Spring Open");
    }

    #[tokio::test]
    async fn test_registration_lifecycle() {
        let manager = TournamentManager::in_memory();
        let id = registering(&manager, 4).await;

        manager.register_participant(id, 11).await.unwrap();
        manager.register_participant(id, 12).await.unwrap();
        manager.withdraw_participant(id, 11).await.unwrap();
        assert_eq!(manager.approved_participants(id).await.unwrap(), vec![12]);

        assert!(matches!(
            manager.withdraw_participant(id, 99).await,
            Err(TournamentError::RegistrationNotFound(99))
        ));

        manager.close_registration(id).await.unwrap();
        assert!(matches!(
            manager.register_participant(id, 13).await,
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_approval() {
        let manager = TournamentManager::in_memory();
        let config = TournamentConfig::single_elimination("Invitational", 4).with_manual_approval();
        let id = manager.create_tournament(config).await.unwrap();
        manager.open_registration(id).await.unwrap();

        let registration = manager.register_participant(id, 5).await.unwrap();
        assert_eq!(registration.status, RegistrationStatus::Pending);
        assert!(manager.approved_participants(id).await.unwrap().is_empty());

        manager.approve_registration(id, 5).await.unwrap();
        assert_eq!(manager.approved_participants(id).await.unwrap(), vec![5]);

        // Approving twice finds no pending registration
        assert!(manager.approve_registration(id, 5).await.is_err());
    }

    #[tokio::test]
    async fn test_open_registration_twice() {
        let manager = TournamentManager::in_memory();
        let id = registering(&manager, 4).await;
        assert!(matches!(
            manager.open_registration(id).await,
            Err(TournamentError::InvalidState {
                expected: TournamentStatus::Draft,
                actual: TournamentStatus::Registration
            })
        ));
    }

    #[tokio::test]
    async fn test_generate_requires_registration_status() {
        let manager = TournamentManager::in_memory();
        let id = manager
            .create_tournament(TournamentConfig::single_elimination("Cup", 4))
            .await
            .unwrap();

        assert!(matches!(
            manager.generate_bracket(id, vec![1, 2]).await,
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_capacity_exceeded() {
        let manager = TournamentManager::in_memory();
        let id = registering(&manager, 2).await;
        assert!(matches!(
            manager.generate_bracket(id, vec![1, 2, 3]).await,
            Err(TournamentError::CapacityExceeded {
                capacity: 2,
                requested: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_report_on_bye_match_rejected() {
        let manager = TournamentManager::in_memory();
        let id = registering(&manager, 4).await;
        manager.generate_bracket(id, vec![1, 2, 3]).await.unwrap();

        let err = manager
            .report_score(MatchKey::new(id, 1, 1), 2, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::InvalidScoreReport(ScoreRejection::AlreadyDecided)
        ));

        // Final is still waiting for its B side
        let err = manager
            .report_score(MatchKey::new(id, 2, 1), 2, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::InvalidScoreReport(ScoreRejection::SlotsNotReady)
        ));
    }

    #[tokio::test]
    async fn test_admin_actions() {
        let manager = TournamentManager::in_memory();
        let config = TournamentConfig::single_elimination("Admin Cup", 4)
            .with_seeding(PreserveOrder.into());
        let id = manager.create_tournament(config).await.unwrap();

        let outcome = manager
            .apply_admin_action(id, AdminAction::OpenRegistration, None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AdminOutcome::StatusChanged {
                status: TournamentStatus::Registration
            }
        );

        manager.register_participant(id, 1).await.unwrap();
        manager.register_participant(id, 2).await.unwrap();

        let AdminOutcome::BracketCreated(created) = manager
            .apply_admin_action(id, AdminAction::Start, None)
            .await
            .unwrap()
        else {
            panic!("expected a bracket");
        };
        assert_eq!(created.capacity, 2);
        assert_eq!(created.round_count, 1);

        let outcome = manager
            .apply_admin_action(
                id,
                AdminAction::ReportScore {
                    round: 1,
                    match_number: 1,
                    score_a: 1,
                    score_b: 4,
                },
                Some(77),
            )
            .await
            .unwrap();
        let AdminOutcome::MatchCompleted(done) = outcome else {
            panic!("expected a completed match");
        };
        assert!(done.is_final());
        assert_eq!(done.completed.reported_by, Some(77));
        assert_eq!(done.completed.slot_b, Slot::Participant(2));

        let tournament = manager.get_tournament(id).await.unwrap();
        assert_eq!(tournament.status, TournamentStatus::Completed);
        assert_eq!(tournament.champion, Some(2));
    }
}
