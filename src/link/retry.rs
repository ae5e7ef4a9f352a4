//! Jittered-backoff retry for flaky handshake steps.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// Call `operation` up to `max_attempts` times.
///
/// After each failure with attempts remaining, sleeps for
/// `delay + uniform(0, delay)`; the jittered value becomes the base delay
/// for the next round, so jitter compounds. Exhausting the budget returns
/// the last failure.
///
/// A budget of zero is fail-fast, never infinite: the operation is invoked
/// exactly once and its error returned without sleeping.
pub async fn retry<T, E, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut remaining = max_attempts.max(1);
    let mut delay = initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(error);
                }
                let jitter = if delay.is_zero() {
                    Duration::ZERO
                } else {
                    Duration::from_nanos(rand::thread_rng().gen_range(0..delay.as_nanos() as u64))
                };
                delay += jitter;
                sleep(delay).await;
            }
        }
    }
}
