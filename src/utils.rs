use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Runs an operation up to `max_attempts` times with a fixed delay between
/// attempts, returning the last error once the attempts are exhausted.
pub async fn retry_fixed<F, Fut, T, E>(
    max_attempts: u32,
    delay: Duration,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempt, max_attempts, "Retry succeeded");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts {
                    warn!(
                        max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed, retrying after fixed delay"
                );

                sleep(delay).await;
            }
        }
    }
}
