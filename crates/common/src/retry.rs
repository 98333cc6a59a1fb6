use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retry.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff_factor: 1.0,
        }
    }
}

/// Runs `f` until it succeeds or `max_attempts` is used up, sleeping between
/// attempts. A `max_attempts` of zero still makes one attempt.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, label: &str, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts => {
                tracing::warn!(%label, attempt, max_attempts, error = %e, "attempt failed, retrying");
                tokio::time::sleep(delay).await;
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_factor);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
