use std::future::Future;

use tokio::time::{sleep, Duration};

use crate::utils::diagnostics::SharedDiagnostics;

/// Outcome of one attempt, as seen by the retry loop.
pub enum Attempt<T, E> {
    Done(T),
    /// transient failure, try again while budget remains
    Retry(E),
    Fatal(E),
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// retries after the first attempt
    pub retries: u32,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl RetrySettings {
    /// `backoff_factor * 2^(retry-1)` seconds, capped at `max_delay_ms`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = 2f64.powi(retry.saturating_sub(1).min(31) as i32);
        let ms = (self.backoff_factor * exp * 1000.0).min(self.max_delay_ms as f64);
        Duration::from_millis(ms.max(0.0) as u64)
    }

    pub async fn run_with_retry<F, Fut, T, E>(&self, diagnostics: &SharedDiagnostics, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retry(e) if attempt < attempts => {
                    let delay = self.delay_for(attempt);
                    diagnostics.warn(&format!(
                        "attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, attempts, e, delay
                    ));
                    sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Retry(e) => {
                    diagnostics.error(&format!("all {} attempts failed: {}", attempt, e));
                    return Err(e);
                }
            }
        }
    }
}
