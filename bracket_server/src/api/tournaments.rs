//! Tournament API handlers.
//!
//! Thin adapters over [`TournamentManager`]: decode the request, call the
//! manager, map [`TournamentError`] to a status code and a client-safe body.
//!
//! # Examples
//!
//! Create a tournament and report a score:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Spring Open", "capacity": 8, "seeding": "preserve_order"}'
//!
//! curl -X POST http://localhost:6969/api/v1/tournaments/1/matches/1/4/score \
//!   -H "Content-Type: application/json" \
//!   -d '{"score_a": 10, "score_b": 7}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use bracket_engine::{
    bracket::{Bracket, Match, MatchKey, SeedingStrategy},
    tournament::{
        AdminAction, AdminOutcome, BracketCreated, MatchCompleted, ParticipantId, Registration,
        ScoreRejection, Tournament, TournamentConfig, TournamentError, TournamentId,
        TournamentStatus,
    },
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable error kind
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub description: Option<String>,
    pub capacity: u32,
    /// `random`, `random:<seed>` or `preserve_order`
    pub seeding: Option<String>,
    pub auto_approve: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TournamentStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub tournament_id: TournamentId,
    pub status: TournamentStatus,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateBracketRequest {
    /// Explicit entrants; the approved registrations are used when absent
    #[serde(default)]
    pub participants: Option<Vec<ParticipantId>>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score_a: u32,
    pub score_b: u32,
    pub reporter_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    #[serde(flatten)]
    pub action: AdminAction,
    pub actor_id: Option<i64>,
}

/// Map an engine error to an HTTP status and error body.
///
/// | Status | Errors |
/// |--------|--------|
/// | 404 | unknown tournament, match or registration |
/// | 400 | invalid configuration |
/// | 422 | too few/many participants, duplicates, tied scores, empty slots |
/// | 409 | lifecycle conflicts, decided matches, lost report races |
/// | 503 | storage timeout |
/// | 500 | storage and invariant failures |
pub fn error_response(err: TournamentError) -> ApiError {
    let (status, code) = match &err {
        TournamentError::TournamentNotFound(_) => (StatusCode::NOT_FOUND, "tournament_not_found"),
        TournamentError::MatchNotFound(_) => (StatusCode::NOT_FOUND, "match_not_found"),
        TournamentError::RegistrationNotFound(_) => {
            (StatusCode::NOT_FOUND, "registration_not_found")
        }
        TournamentError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, "invalid_config"),
        TournamentError::InsufficientParticipants { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_participants")
        }
        TournamentError::CapacityExceeded { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "capacity_exceeded")
        }
        TournamentError::DuplicateParticipant(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "duplicate_participant")
        }
        TournamentError::InvalidScoreReport(ScoreRejection::AlreadyDecided) => {
            (StatusCode::CONFLICT, "already_decided")
        }
        TournamentError::InvalidScoreReport(ScoreRejection::Tied) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "tied_score")
        }
        TournamentError::InvalidScoreReport(ScoreRejection::SlotsNotReady) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "slots_not_ready")
        }
        TournamentError::AlreadyStarted => (StatusCode::CONFLICT, "already_started"),
        TournamentError::MatchConflict(_) => (StatusCode::CONFLICT, "match_conflict"),
        TournamentError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        TournamentError::TournamentFull => (StatusCode::CONFLICT, "tournament_full"),
        TournamentError::AlreadyRegistered => (StatusCode::CONFLICT, "already_registered"),
        TournamentError::RegistrationLocked => (StatusCode::CONFLICT, "registration_locked"),
        TournamentError::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "timeout"),
        TournamentError::Database(_)
        | TournamentError::Migration(_)
        | TournamentError::Serialization(_)
        | TournamentError::BracketCorrupted(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };

    if !err.is_user_correctable() {
        tracing::error!(error = %err, "Request failed with internal error");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
            code: code.to_string(),
        }),
    )
}

/// Record score report metrics by outcome
fn record_score_report(result: Result<&MatchCompleted, &TournamentError>) {
    match result {
        Ok(done) => {
            metrics::score_reports_total("accepted");
            if done.is_final() {
                metrics::tournaments_completed_total();
            }
        }
        Err(TournamentError::InvalidScoreReport(_)) => metrics::score_reports_total("rejected"),
        Err(TournamentError::MatchConflict(_)) => metrics::score_reports_total("conflict"),
        Err(_) => metrics::score_reports_total("error"),
    }
}

/// List tournaments, optionally filtered by `?status=`.
pub async fn list_tournaments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<Tournament>> {
    state
        .manager
        .list_tournaments(query.status)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Create a tournament in `draft`.
///
/// # Response
///
/// Returns `201 Created` with the stored tournament.
///
/// # Errors
///
/// - `400 Bad Request`: Blank name, capacity out of range or unknown seeding
pub async fn create_tournament(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let seeding = match request.seeding.as_deref() {
        Some(raw) => raw.parse::<SeedingStrategy>().map_err(error_response)?,
        None => state.default_seeding,
    };

    let mut config =
        TournamentConfig::single_elimination(request.name, request.capacity).with_seeding(seeding);
    if let Some(description) = request.description {
        config.description = description;
    }
    if let Some(auto_approve) = request.auto_approve {
        config.auto_approve = auto_approve;
    }

    let id = state
        .manager
        .create_tournament(config)
        .await
        .map_err(error_response)?;
    let tournament = state
        .manager
        .get_tournament(id)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn get_tournament(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Tournament> {
    state
        .manager
        .get_tournament(id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// `draft -> registration`
pub async fn open_registration(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<StatusResponse> {
    let status = state
        .manager
        .open_registration(id)
        .await
        .map_err(error_response)?;
    Ok(Json(StatusResponse {
        tournament_id: id,
        status,
    }))
}

/// `registration -> draft`
pub async fn close_registration(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<StatusResponse> {
    let status = state
        .manager
        .close_registration(id)
        .await
        .map_err(error_response)?;
    Ok(Json(StatusResponse {
        tournament_id: id,
        status,
    }))
}

pub async fn list_registrations(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Vec<Registration>> {
    state
        .manager
        .list_registrations(id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Register a participant.
///
/// # Errors
///
/// - `409 Conflict`: Full, already registered, or bracket already generated
pub async fn register_participant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let registration = state
        .manager
        .register_participant(id, request.participant_id)
        .await
        .map_err(error_response)?;
    metrics::registrations_total();
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn approve_registration(
    State(state): State<AppState>,
    ApiPath((id, participant_id)): ApiPath<(TournamentId, ParticipantId)>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .approve_registration(id, participant_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn withdraw_participant(
    State(state): State<AppState>,
    ApiPath((id, participant_id)): ApiPath<(TournamentId, ParticipantId)>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .withdraw_participant(id, participant_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Generate the bracket and move the tournament to `active`.
///
/// # Request Body
///
/// Optional. `{"participants": [1, 2, 3]}` seeds exactly those entrants;
/// without it the approved registrations are used in registration order.
///
/// # Errors
///
/// - `409 Conflict`: Bracket already generated, or registration never opened
/// - `422 Unprocessable Entity`: Fewer than two entrants, more than capacity,
///   or a duplicated entrant
pub async fn generate_bracket(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
    request: Option<ApiJson<GenerateBracketRequest>>,
) -> Result<(StatusCode, Json<BracketCreated>), ApiError> {
    let participants = request.and_then(|ApiJson(body)| body.participants);

    let created = match participants {
        Some(participants) => state.manager.generate_bracket(id, participants).await,
        None => state.manager.start_tournament(id).await,
    };
    if let Ok(created) = &created {
        metrics::brackets_generated_total(created.byes);
    }

    let created = created.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_bracket(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
) -> ApiResult<Bracket> {
    state
        .manager
        .get_bracket(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_match(
    State(state): State<AppState>,
    ApiPath((id, round, match_number)): ApiPath<(TournamentId, u32, u32)>,
) -> ApiResult<Match> {
    state
        .manager
        .get_match(MatchKey::new(id, round, match_number))
        .await
        .map(Json)
        .map_err(error_response)
}

/// Report a score for a match.
///
/// # Request Body
///
/// ```json
/// { "score_a": 10, "score_b": 7, "reporter_id": 42 }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No such match
/// - `409 Conflict`: Match already decided, or a concurrent report won
/// - `422 Unprocessable Entity`: Tied scores, or an empty slot
pub async fn report_score(
    State(state): State<AppState>,
    ApiPath((id, round, match_number)): ApiPath<(TournamentId, u32, u32)>,
    ApiJson(request): ApiJson<ScoreRequest>,
) -> ApiResult<MatchCompleted> {
    let result = state
        .manager
        .report_score(
            MatchKey::new(id, round, match_number),
            request.score_a,
            request.score_b,
            request.reporter_id,
        )
        .await;
    record_score_report(result.as_ref());

    result.map(Json).map_err(error_response)
}

/// Apply an admin panel command.
///
/// # Request Body
///
/// The action tag plus its fields, and an optional actor:
/// ```json
/// { "action": "report_score", "round": 1, "match_number": 3,
///   "score_a": 10, "score_b": 7, "actor_id": 1 }
/// ```
pub async fn admin_action(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TournamentId>,
    ApiJson(request): ApiJson<AdminRequest>,
) -> ApiResult<AdminOutcome> {
    logging::log_admin_action(id, request.action.name(), request.actor_id);

    let outcome = state
        .manager
        .apply_admin_action(id, request.action, request.actor_id)
        .await;

    match (request.action, outcome.as_ref()) {
        (AdminAction::ReportScore { .. }, Ok(AdminOutcome::MatchCompleted(done))) => {
            record_score_report(Ok(done))
        }
        (AdminAction::ReportScore { .. }, Err(err)) => record_score_report(Err(err)),
        (_, Ok(AdminOutcome::BracketCreated(created))) => {
            metrics::brackets_generated_total(created.byes)
        }
        _ => {}
    }

    outcome.map(Json).map_err(error_response)
}
