use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts of an idempotent request.
///
/// An empty policy means a single attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    #[must_use]
    pub fn from_secs(delays: &[u64]) -> Self {
        Self {
            delays: delays.iter().copied().map(Duration::from_secs).collect(),
        }
    }

    #[must_use]
    pub const fn from_delays(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Total number of attempts, including the first.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Retry an async operation, sleeping for each delay of `policy` in turn.
///
/// # Returns
/// The first successful result, or the error of the last attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts();
    let mut delays = policy.delays.iter();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let Some(delay) = delays.next() else {
                    return Err(e);
                };
                warn!("Request failed (attempt {attempt}/{attempts}): {e}. Retrying after {delay:?}...");
                sleep(*delay).await;
                attempt += 1;
            }
        }
    }
}
