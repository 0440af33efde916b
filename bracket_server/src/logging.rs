//! Structured logging configuration.
//!
//! The subscriber also receives the engine's `log` records, so bracket
//! generation and score reports show up next to request traces.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use bracket_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log API request/response
///
/// Server errors are logged at `warn`, everything else at `info`.
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
) {
    if status_code >= 500 {
        tracing::warn!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

/// Log an administrative action with its actor
pub fn log_admin_action(tournament_id: i64, action: &str, actor_id: Option<i64>) {
    tracing::info!(
        tournament_id = tournament_id,
        action = action,
        actor_id = actor_id,
        "ADMIN: {}",
        action
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_api_request() {
        // Just ensure it doesn't panic
        log_api_request("req-1", "GET", "/api/v1/tournaments", 200, 45);
        log_api_request("req-2", "POST", "/api/v1/tournaments/{id}/bracket", 500, 120);
    }

    #[test]
    fn test_log_admin_action() {
        log_admin_action(7, "start", Some(1));
        log_admin_action(7, "close_registration", None);
    }
}
