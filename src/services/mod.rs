pub mod calendar;
pub mod conflict;
pub mod directory;
pub mod events;
pub mod lifecycle;
pub mod locks;
pub mod reservation;

use std::future::Future;
use std::time::Duration;

use crate::errors::BookingError;

/// Await a record-store call for at most `limit`, folding both the timeout and
/// the store's own failure into [`BookingError`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, BookingError> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!(error = %format!("{e:#}"), "record store call failed");
            Err(BookingError::StoreFailure(format!("{e:#}")))
        }
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "record store call timed out");
            Err(BookingError::Timeout(limit))
        }
    }
}
