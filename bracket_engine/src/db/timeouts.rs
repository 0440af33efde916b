//! Database query timeout helpers
//!
//! Every PostgreSQL call made by the repository goes through one of these
//! wrappers so a stalled connection surfaces as `TournamentError::Timeout`
//! instead of hanging a request.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::tournament::{TournamentError, TournamentResult};

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for migrations and other long-running operations (30 seconds)
pub const LONG_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a database operation with a timeout
///
/// Works for plain `sqlx` futures as well as for async blocks that already
/// return `TournamentResult`.
///
/// # Example
///
/// ```no_run
/// use bracket_engine::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> bracket_engine::tournament::TournamentResult<()> {
///
/// let row = with_timeout(
///     DEFAULT_QUERY_TIMEOUT,
///     sqlx::query("SELECT status FROM tournaments WHERE id = $1")
///         .bind(1_i64)
///         .fetch_optional(pool),
/// )
/// .await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> TournamentResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TournamentError>,
{
    match timeout(duration, future).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(TournamentError::Timeout(duration)),
    }
}

/// Execute a query with the default timeout (5 seconds)
pub async fn with_default_timeout<F, T, E>(future: F) -> TournamentResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TournamentError>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}

/// Execute a transaction with the transaction timeout (10 seconds)
pub async fn with_transaction_timeout<F, T, E>(future: F) -> TournamentResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<TournamentError>,
{
    with_timeout(DEFAULT_TRANSACTION_TIMEOUT, future).await
}
