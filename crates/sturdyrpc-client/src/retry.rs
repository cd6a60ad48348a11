//! Bounded-time retry scheduler
//!
//! [`retry`] keeps invoking a fallible operation until it produces a final
//! outcome or a wall-clock budget runs out. The budget is checked only after
//! an attempt completes, so at least one attempt always runs and the total
//! time can overshoot the budget by up to one attempt plus one pacing delay.
//! There is no cap on the number of attempts other than the budget.
//!
//! Time is read from `tokio::time`, so tests can run on a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Pacing policy "every `interval`".
///
/// Attempt `n` is targeted at elapsed time `n * interval`; the returned delay
/// is whatever is left until then, or zero when attempts are already running
/// late. Slow attempts therefore run back-to-back with no throttling.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sturdyrpc_client::retry::every;
///
/// let pacing = every(Duration::from_secs(1));
/// assert_eq!(pacing(Duration::from_millis(300), 1), Duration::from_millis(700));
/// assert_eq!(pacing(Duration::from_millis(2500), 2), Duration::ZERO);
/// ```
pub fn every(interval: Duration) -> impl Fn(Duration, u32) -> Duration + Send + Sync + Copy {
    move |elapsed, attempt| {
        interval
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
            .saturating_sub(elapsed)
    }
}

/// Runs `attempt` until `is_final` accepts its outcome or `timeout` has elapsed.
///
/// After each attempt the elapsed time since the first one started is
/// measured. The latest outcome is returned once that time reaches `timeout`
/// or the outcome is final. Otherwise the scheduler sleeps for
/// `pacing(elapsed, next_attempt)` and tries again. Attempts are numbered from
/// 0, so the first pacing call sees attempt number 1.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sturdyrpc_client::retry::{every, retry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let outcome: Result<u32, &str> = retry(
///     Duration::from_secs(5),
///     every(Duration::from_millis(10)),
///     |outcome: &Result<u32, &str>| outcome.is_ok(),
///     || {
///         calls += 1;
///         let n = calls;
///         async move { if n < 3 { Err("not yet") } else { Ok(n) } }
///     },
/// )
/// .await;
/// assert_eq!(outcome, Ok(3));
/// # }
/// ```
pub async fn retry<T, A, Fut, P, F>(timeout: Duration, pacing: P, is_final: F, mut attempt: A) -> T
where
    A: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(Duration, u32) -> Duration,
    F: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut attempt_number: u32 = 0;

    loop {
        let outcome = attempt().await;
        let elapsed = start.elapsed();

        if is_final(&outcome) {
            return outcome;
        }
        if elapsed >= timeout {
            debug!(
                attempts = attempt_number + 1,
                elapsed_ms = elapsed.as_millis() as u64,
                "Retry budget exhausted"
            );
            return outcome;
        }

        attempt_number = attempt_number.saturating_add(1);
        let delay = pacing(elapsed, attempt_number);
        debug!(
            attempt = attempt_number,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
