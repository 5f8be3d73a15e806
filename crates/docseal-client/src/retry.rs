//! Retry with exponential backoff.
//!
//! [`with_retry`] runs an operation up to `max_attempts` times, sleeping
//! `initial_delay`, then twice that, then four times that, between attempts.
//! The last failure is returned unchanged. [`with_retry_if`] additionally
//! stops on failures the caller marks as permanent.
//!
//! [`retry_send`] is the transport-only variant used inside the HTTP
//! clients: it retries `reqwest` send errors and leaves status handling to
//! the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try, and how long to wait before the first retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait before the first retry. Doubles for each subsequent retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Default attempt budget.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Default wait before the first retry.
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

    /// A policy with the given budget.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Effective number of attempts.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The waits between consecutive attempts: `d, 2d, 4d, …`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let initial = self.initial_delay;
        (0..self.attempts() - 1).map(move |n| initial.saturating_mul(2u32.saturating_pow(n)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_INITIAL_DELAY)
    }
}

/// Run `f` until it succeeds or the policy is exhausted.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_if(policy, operation, f, |_| true).await
}

/// Run `f` until it succeeds, fails permanently, or the policy is exhausted.
///
/// A failure for which `should_retry` returns `false` is returned at once.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    f: F,
    should_retry: P,
) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    for (attempt, delay) in (1u32..).zip(policy.delays()) {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    "call failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    // Final attempt, its result is returned as-is.
    f().await
}

/// Send an HTTP request, retrying transport failures only.
pub(crate) async fn retry_send<F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    with_retry(policy, endpoint, f).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn default_policy_is_three_attempts_from_one_second() {
        let p = RetryPolicy::default();
        assert_eq!(p.attempts(), 3);
        assert_eq!(
            p.delays().collect::<Vec<_>>(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn zero_attempts_means_one() {
        let p = RetryPolicy::new(0, Duration::from_millis(5));
        assert_eq!(p.attempts(), 1);
        assert_eq!(p.delays().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_max_attempts_with_doubling_delays() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        let start = Instant::now();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);

        let result: Result<(), String> = with_retry(&policy, "test", || {
            let s = Arc::clone(&s);
            async move {
                s.lock().push(start.elapsed());
                Err("boom".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "boom");
        let offsets: Vec<u64> = seen.lock().iter().map(|d| d.as_millis() as u64).collect();
        // Waits of 100, 200, 400 between the four attempts.
        assert_eq!(offsets, vec![0, 100, 300, 700]);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_the_last_error_unchanged() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), String> =
            with_retry(&RetryPolicy::new(3, Duration::from_millis(10)), "test", || {
                let c = Arc::clone(&c);
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure {n}"))
                }
            })
            .await;
        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_retrying_after_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<u32, String> = with_retry(&RetryPolicy::default(), "test", || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err("transient".into())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), String> = with_retry_if(
            &RetryPolicy::default(),
            "test",
            || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("rejected".to_string())
                }
            },
            |e| e != "rejected",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_send_exhausts_attempts_on_transport_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = retry_send(&RetryPolicy::new(3, Duration::from_millis(1)), "GET /", || {
            c.fetch_add(1, Ordering::SeqCst);
            // Port 1 is closed: connection refused.
            http.get("http://127.0.0.1:1/").send()
        })
        .await;

        assert!(result.is_err(), "request to closed port must fail");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
