//! Bounded retry combinator.

use std::future::Future;
use std::time::Duration;

/// Runs `operation` up to `max_attempts` times, sleeping `backoff` between
/// attempts.
///
/// `operation` receives the 1-based attempt number and owns whatever it
/// acquires; nothing is carried over between attempts. `on_retry` is called
/// with the attempt number and its error before each sleep, so it never
/// fires for the last attempt. A `max_attempts` of zero runs once.
///
/// # Errors
///
/// Returns the error of the last attempt once all attempts have failed.
pub async fn with_retries<T, E, F, Fut, R>(
    max_attempts: u32,
    backoff: Duration,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E),
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                on_retry(attempt, &e);
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
