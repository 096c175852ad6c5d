//! Per-attempt deadline.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Run one attempt under `limit`. An elapsed deadline is reported as a
/// timeout transport error so it counts against the retry budget.
pub async fn with_timeout<T, F>(limit: Duration, attempt: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::timeout(limit.as_secs())),
    }
}
