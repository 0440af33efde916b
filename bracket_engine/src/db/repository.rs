//! Repository trait for tournament, registration and match storage.
//!
//! The trait keeps the manager independent of the store, so the same
//! operations run against PostgreSQL in production and against
//! [`super::memory::InMemoryBracketRepository`] in tests and demos. Both
//! implementations must honour the same atomicity rules: see
//! [`BracketRepository::start_bracket`] and [`BracketRepository::apply_result`].

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};

use super::timeouts::{with_default_timeout, with_transaction_timeout};
use crate::bracket::{Advancement, BracketPlan, Match, MatchKey, MatchResult, Side, Slot};
use crate::tournament::{
    ParticipantId, Registration, RegistrationStatus, Tournament, TournamentConfig, TournamentError,
    TournamentId, TournamentResult, TournamentStatus,
};

#[async_trait]
pub trait BracketRepository: Send + Sync {
    /// Insert a new tournament in `draft`
    async fn create_tournament(&self, config: &TournamentConfig) -> TournamentResult<TournamentId>;

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// List tournaments, newest first
    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<Tournament>>;

    /// Set the status to `to` only if it currently is `from`.
    ///
    /// Returns `false` when the tournament was not in `from`.
    async fn transition_status(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> TournamentResult<bool>;

    /// Register a participant while the tournament is open for registration.
    ///
    /// A withdrawn registration is reinstated with `status`. Fails with
    /// `AlreadyRegistered` for an active registration, `TournamentFull` when
    /// `capacity` non-withdrawn registrations exist, and `InvalidState` if
    /// the tournament left `registration` concurrently.
    async fn add_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        status: RegistrationStatus,
        capacity: u32,
    ) -> TournamentResult<Registration>;

    /// Change a registration from one of `from` to `to`, only while the
    /// tournament is in `draft` or `registration`.
    ///
    /// Returns `false` when no registration in `from` matched.
    async fn update_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        from: &[RegistrationStatus],
        to: RegistrationStatus,
    ) -> TournamentResult<bool>;

    /// Registrations in registration order
    async fn list_registrations(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Registration>>;

    /// Atomically move the tournament `registration -> active`, record the
    /// bracket size and insert every planned match.
    ///
    /// Fails with `AlreadyStarted` without writing anything when the
    /// tournament is no longer in `registration`.
    async fn start_bracket(&self, plan: &BracketPlan) -> TournamentResult<()>;

    async fn get_match(&self, key: MatchKey) -> TournamentResult<Option<Match>>;

    /// Matches of a tournament in round-major order
    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>>;

    /// Atomically complete the match and apply its advancement.
    ///
    /// The completion is conditioned on the match still being pending with
    /// two real participants; a lost race yields `MatchConflict` and nothing
    /// is written. The destination slot must still be empty, and a champion
    /// completes the tournament in the same write.
    async fn apply_result(
        &self,
        result: &MatchResult,
        advancement: &Advancement,
    ) -> TournamentResult<Match>;
}

const TOURNAMENT_COLUMNS: &str =
    "id, config, status, bracket_size, champion_id, created_at, started_at, finished_at";

const MATCH_COLUMNS: &str = "tournament_id, round, match_number, slot_a_kind, participant_a, \
     slot_b_kind, participant_b, score_a, score_b, winner_id, status, reported_by, completed_at";

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    let config: TournamentConfig = serde_json::from_value(row.try_get("config")?)?;

    Ok(Tournament {
        id: row.try_get("id")?,
        config,
        status: row.try_get::<String, _>("status")?.parse()?,
        bracket_size: row
            .try_get::<Option<i32>, _>("bracket_size")?
            .map(|size| size as u32),
        champion: row.try_get("champion_id")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

fn registration_from_row(row: &PgRow) -> TournamentResult<Registration> {
    Ok(Registration {
        tournament_id: row.try_get("tournament_id")?,
        participant_id: row.try_get("participant_id")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        registered_at: row.try_get("registered_at")?,
    })
}

fn slot_from_row(row: &PgRow, kind_column: &str, id_column: &str) -> TournamentResult<Slot> {
    let kind: String = row.try_get(kind_column)?;
    let participant: Option<ParticipantId> = row.try_get(id_column)?;

    Slot::from_parts(&kind, participant).ok_or_else(|| {
        TournamentError::BracketCorrupted(format!(
            "{kind_column} '{kind}' does not match {id_column} {participant:?}"
        ))
    })
}

fn score_from_row(row: &PgRow, column: &str) -> TournamentResult<u32> {
    let score: i64 = row.try_get(column)?;
    u32::try_from(score)
        .map_err(|_| TournamentError::BracketCorrupted(format!("{column} out of range: {score}")))
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    Ok(Match {
        tournament_id: row.try_get("tournament_id")?,
        round: row.try_get::<i32, _>("round")? as u32,
        match_number: row.try_get::<i32, _>("match_number")? as u32,
        slot_a: slot_from_row(row, "slot_a_kind", "participant_a")?,
        slot_b: slot_from_row(row, "slot_b_kind", "participant_b")?,
        score_a: score_from_row(row, "score_a")?,
        score_b: score_from_row(row, "score_b")?,
        winner: row.try_get("winner_id")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        reported_by: row.try_get("reported_by")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Read the tournament status, locking the row until the transaction ends
async fn lock_tournament_status(
    conn: &mut PgConnection,
    id: TournamentId,
) -> TournamentResult<TournamentStatus> {
    let row = sqlx::query("SELECT status FROM tournaments WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => row.try_get::<String, _>("status")?.parse(),
        None => Err(TournamentError::TournamentNotFound(id)),
    }
}

/// Default PostgreSQL implementation of `BracketRepository`
///
/// Every call is bounded by [`super::timeouts`]; multi-statement writes run
/// in a single transaction.
pub struct PgBracketRepository {
    pool: PgPool,
}

impl PgBracketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn add_registration_tx(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        status: RegistrationStatus,
        capacity: u32,
    ) -> TournamentResult<Registration> {
        let mut tx = self.pool.begin().await?;

        lock_tournament_status(&mut *tx, tournament_id)
            .await?
            .ensure_accepting_registrations()?;

        let existing = sqlx::query(
            "SELECT status FROM tournament_registrations
             WHERE tournament_id = $1 AND participant_id = $2",
        )
        .bind(tournament_id)
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            let current: RegistrationStatus = row.try_get::<String, _>("status")?.parse()?;
            if current != RegistrationStatus::Withdrawn {
                return Err(TournamentError::AlreadyRegistered);
            }
        }

        let active: i64 = sqlx::query(
            "SELECT COUNT(*) AS active FROM tournament_registrations
             WHERE tournament_id = $1 AND status <> 'withdrawn'",
        )
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("active")?;

        if active >= i64::from(capacity) {
            return Err(TournamentError::TournamentFull);
        }

        let row = sqlx::query(
            "INSERT INTO tournament_registrations (tournament_id, participant_id, status)
             VALUES ($1, $2, $3)
             ON CONFLICT (tournament_id, participant_id)
             DO UPDATE SET status = EXCLUDED.status, registered_at = NOW()
             RETURNING tournament_id, participant_id, status, registered_at",
        )
        .bind(tournament_id)
        .bind(participant_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let registration = registration_from_row(&row)?;
        tx.commit().await?;
        Ok(registration)
    }

    async fn update_registration_tx(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        from: &[RegistrationStatus],
        to: RegistrationStatus,
    ) -> TournamentResult<bool> {
        let mut tx = self.pool.begin().await?;

        lock_tournament_status(&mut *tx, tournament_id)
            .await?
            .ensure_registrations_mutable()?;

        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let updated = sqlx::query(
            "UPDATE tournament_registrations SET status = $4
             WHERE tournament_id = $1 AND participant_id = $2 AND status = ANY($3)",
        )
        .bind(tournament_id)
        .bind(participant_id)
        .bind(from)
        .bind(to.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated.rows_affected() > 0)
    }

    async fn start_bracket_tx(&self, plan: &BracketPlan) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;

        lock_tournament_status(&mut *tx, plan.tournament_id)
            .await?
            .ensure_startable()?;

        sqlx::query(
            "UPDATE tournaments SET status = 'active', bracket_size = $2, started_at = NOW()
             WHERE id = $1",
        )
        .bind(plan.tournament_id)
        .bind(plan.capacity as i32)
        .execute(&mut *tx)
        .await?;

        let mut insert = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO bracket_matches ({MATCH_COLUMNS}) "
        ));
        insert.push_values(&plan.matches, |mut row, m| {
            row.push_bind(m.tournament_id)
                .push_bind(m.round as i32)
                .push_bind(m.match_number as i32)
                .push_bind(m.slot_a.kind())
                .push_bind(m.slot_a.participant())
                .push_bind(m.slot_b.kind())
                .push_bind(m.slot_b.participant())
                .push_bind(i64::from(m.score_a))
                .push_bind(i64::from(m.score_b))
                .push_bind(m.winner)
                .push_bind(m.status.as_str())
                .push_bind(m.reported_by)
                .push_bind(m.completed_at);
        });
        insert.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_result_tx(
        &self,
        result: &MatchResult,
        advancement: &Advancement,
    ) -> TournamentResult<Match> {
        let key = result.key;
        let mut tx = self.pool.begin().await?;

        // Conditional write: only a pending match with two real participants
        // can be completed. A concurrent reporter that got here first leaves
        // zero matching rows.
        let completed = sqlx::query(&format!(
            "UPDATE bracket_matches
             SET score_a = $4, score_b = $5, winner_id = $6, reported_by = $7,
                 status = 'completed', completed_at = NOW()
             WHERE tournament_id = $1 AND round = $2 AND match_number = $3
               AND status = 'pending'
               AND slot_a_kind = 'participant' AND slot_b_kind = 'participant'
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(key.tournament_id)
        .bind(key.round as i32)
        .bind(key.match_number as i32)
        .bind(i64::from(result.score_a))
        .bind(i64::from(result.score_b))
        .bind(result.winner)
        .bind(result.reported_by)
        .fetch_optional(&mut *tx)
        .await?;

        let completed = match completed {
            Some(row) => match_from_row(&row)?,
            None => {
                let exists = sqlx::query(
                    "SELECT 1 FROM bracket_matches
                     WHERE tournament_id = $1 AND round = $2 AND match_number = $3",
                )
                .bind(key.tournament_id)
                .bind(key.round as i32)
                .bind(key.match_number as i32)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();

                return Err(if exists {
                    TournamentError::MatchConflict(key)
                } else {
                    TournamentError::MatchNotFound(key)
                });
            }
        };

        match *advancement {
            Advancement::Advance(dest) => {
                let sql = match dest.side {
                    Side::A => {
                        "UPDATE bracket_matches SET slot_a_kind = 'participant', participant_a = $4
                         WHERE tournament_id = $1 AND round = $2 AND match_number = $3
                           AND status = 'pending' AND slot_a_kind = 'empty'"
                    }
                    Side::B => {
                        "UPDATE bracket_matches SET slot_b_kind = 'participant', participant_b = $4
                         WHERE tournament_id = $1 AND round = $2 AND match_number = $3
                           AND status = 'pending' AND slot_b_kind = 'empty'"
                    }
                };

                let filled = sqlx::query(sql)
                    .bind(key.tournament_id)
                    .bind(dest.round as i32)
                    .bind(dest.match_number as i32)
                    .bind(result.winner)
                    .execute(&mut *tx)
                    .await?;

                if filled.rows_affected() == 0 {
                    return Err(TournamentError::BracketCorrupted(format!(
                        "slot {} of {} is missing or already filled",
                        dest.side.as_str(),
                        dest.key(key.tournament_id)
                    )));
                }
            }
            Advancement::Champion { participant_id } => {
                let status = lock_tournament_status(&mut *tx, key.tournament_id).await?;
                if status != TournamentStatus::Active {
                    return Err(TournamentError::InvalidState {
                        expected: TournamentStatus::Active,
                        actual: status,
                    });
                }

                sqlx::query(
                    "UPDATE tournaments SET status = 'completed', champion_id = $2, finished_at = NOW()
                     WHERE id = $1",
                )
                .bind(key.tournament_id)
                .bind(participant_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(completed)
    }
}

#[async_trait]
impl BracketRepository for PgBracketRepository {
    async fn create_tournament(&self, config: &TournamentConfig) -> TournamentResult<TournamentId> {
        let config_json = serde_json::to_value(config)?;

        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO tournaments (name, config, capacity, status)
                 VALUES ($1, $2, $3, 'draft')
                 RETURNING id",
            )
            .bind(&config.name)
            .bind(config_json)
            .bind(config.capacity as i32)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row = with_default_timeout(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(
        &self,
        status: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<Tournament>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(status.map(|s| s.as_str()))
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn transition_status(
        &self,
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> TournamentResult<bool> {
        let updated = with_default_timeout(
            sqlx::query("UPDATE tournaments SET status = $3 WHERE id = $1 AND status = $2")
                .bind(id)
                .bind(from.as_str())
                .bind(to.as_str())
                .execute(&self.pool),
        )
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(true);
        }

        match self.get_tournament(id).await? {
            Some(_) => Ok(false),
            None => Err(TournamentError::TournamentNotFound(id)),
        }
    }

    async fn add_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        status: RegistrationStatus,
        capacity: u32,
    ) -> TournamentResult<Registration> {
        with_transaction_timeout(self.add_registration_tx(
            tournament_id,
            participant_id,
            status,
            capacity,
        ))
        .await
    }

    async fn update_registration(
        &self,
        tournament_id: TournamentId,
        participant_id: ParticipantId,
        from: &[RegistrationStatus],
        to: RegistrationStatus,
    ) -> TournamentResult<bool> {
        with_transaction_timeout(self.update_registration_tx(tournament_id, participant_id, from, to))
            .await
    }

    async fn list_registrations(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<Registration>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT tournament_id, participant_id, status, registered_at
                 FROM tournament_registrations
                 WHERE tournament_id = $1
                 ORDER BY registered_at, participant_id",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(registration_from_row).collect()
    }

    async fn start_bracket(&self, plan: &BracketPlan) -> TournamentResult<()> {
        with_transaction_timeout(self.start_bracket_tx(plan)).await
    }

    async fn get_match(&self, key: MatchKey) -> TournamentResult<Option<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM bracket_matches
             WHERE tournament_id = $1 AND round = $2 AND match_number = $3"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(key.tournament_id)
                .bind(key.round as i32)
                .bind(key.match_number as i32)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM bracket_matches
             WHERE tournament_id = $1
             ORDER BY round, match_number"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn apply_result(
        &self,
        result: &MatchResult,
        advancement: &Advancement,
    ) -> TournamentResult<Match> {
        with_transaction_timeout(self.apply_result_tx(result, advancement)).await
    }
}
