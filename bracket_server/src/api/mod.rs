//! HTTP API for the bracket server.
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament lifecycle, registrations, brackets and scores
//! - [`extract`]: Body, path and query extractors with JSON rejections
//! - [`middleware`]: Per-route metrics and access logging
//! - [`request_id`]: Request correlation ids
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health
//! GET  /api/v1/tournaments[?status=]
//! POST /api/v1/tournaments
//! GET  /api/v1/tournaments/{id}
//! POST /api/v1/tournaments/{id}/registration/open
//! POST /api/v1/tournaments/{id}/registration/close
//! GET  /api/v1/tournaments/{id}/registrations
//! POST /api/v1/tournaments/{id}/registrations
//! POST /api/v1/tournaments/{id}/registrations/{participant_id}/approve
//! POST /api/v1/tournaments/{id}/registrations/{participant_id}/withdraw
//! POST /api/v1/tournaments/{id}/bracket
//! GET  /api/v1/tournaments/{id}/bracket
//! GET  /api/v1/tournaments/{id}/matches/{round}/{match_number}
//! POST /api/v1/tournaments/{id}/matches/{round}/{match_number}/score
//! POST /api/v1/tournaments/{id}/admin
//! ```
//!
//! Authentication is left to whatever sits in front of the server.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bracket_server::api::{AppState, create_router};
//! use bracket_engine::tournament::TournamentManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(TournamentManager::in_memory(), None);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod extract;
pub mod middleware;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use bracket_engine::{bracket::SeedingStrategy, db::Database, tournament::TournamentManager};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    /// Present when running on PostgreSQL; used by the health check
    pub database: Option<Database>,
    /// Seeding for create requests that do not name one
    pub default_seeding: SeedingStrategy,
}

impl AppState {
    pub fn new(manager: TournamentManager, database: Option<Database>) -> Self {
        Self {
            manager: Arc::new(manager),
            database,
            default_seeding: SeedingStrategy::default(),
        }
    }

    pub fn with_default_seeding(mut self, seeding: SeedingStrategy) -> Self {
        self.default_seeding = seeding;
        self
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        // route_layer so the middleware sees the matched route template
        .route_layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id::request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/tournaments/{id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{id}/registration/open",
            post(tournaments::open_registration),
        )
        .route(
            "/tournaments/{id}/registration/close",
            post(tournaments::close_registration),
        )
        .route(
            "/tournaments/{id}/registrations",
            get(tournaments::list_registrations).post(tournaments::register_participant),
        )
        .route(
            "/tournaments/{id}/registrations/{participant_id}/approve",
            post(tournaments::approve_registration),
        )
        .route(
            "/tournaments/{id}/registrations/{participant_id}/withdraw",
            post(tournaments::withdraw_participant),
        )
        .route(
            "/tournaments/{id}/bracket",
            get(tournaments::get_bracket).post(tournaments::generate_bracket),
        )
        .route(
            "/tournaments/{id}/matches/{round}/{match_number}",
            get(tournaments::get_match),
        )
        .route(
            "/tournaments/{id}/matches/{round}/{match_number}/score",
            post(tournaments::report_score),
        )
        .route("/tournaments/{id}/admin", post(tournaments::admin_action))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable`
/// otherwise. The in-memory backend is always healthy.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","storage":"postgres","database":true,"timestamp":"2026-01-10T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(database) => ("postgres", database.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
