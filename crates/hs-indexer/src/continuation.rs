//! Self-continuation across invocation time limits.
//!
//! A single invocation collects at most `max_pages_per_run` pages. When the
//! day's collection is not finished, the pipeline asks a
//! [`ContinuationTrigger`] to start the next invocation and returns without
//! waiting for it.

use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// Schedules the next invocation of the job.
pub trait ContinuationTrigger: Send + Sync {
    /// Arrange for the job to run again after `delay`.
    ///
    /// Must return promptly. Returns whether a continuation was scheduled;
    /// delivery itself is not confirmed.
    fn schedule(&self, delay: Duration) -> bool;
}

/// Calls the job's own HTTP endpoint from a background task.
///
/// Failed deliveries are retried with exponential backoff and logged. The
/// invocation that scheduled the call never learns the outcome; the next
/// scheduled cron run picks up from stored progress if every attempt fails.
#[derive(Debug, Clone)]
pub struct HttpContinuation {
    client: reqwest::Client,
    url: String,
    secret: String,
    attempts: u32,
    backoff: Duration,
}

impl HttpContinuation {
    /// Default number of delivery attempts.
    pub const DEFAULT_ATTEMPTS: u32 = 3;

    /// Default base delay between attempts, doubled after each failure.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

    /// Trigger that POSTs to `url` with `Authorization: Bearer {secret}`.
    pub fn new(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            secret: secret.into(),
            attempts: Self::DEFAULT_ATTEMPTS,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    /// Override the retry policy (builder pattern).
    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(self, delay: Duration) {
        tokio::time::sleep(delay).await;

        let mut backoff = self.backoff;
        for attempt in 1..=self.attempts {
            let result = self
                .client
                .post(&self.url)
                .bearer_auth(&self.secret)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(response) => {
                    info!("Continuation delivered to {} ({}) on attempt {}", self.url, response.status(), attempt);
                    return;
                }
                Err(e) => {
                    warn!("Continuation attempt {}/{} to {} failed: {}", attempt, self.attempts, self.url, e);
                }
            }

            if attempt < self.attempts {
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
        }

        warn!("Continuation to {} abandoned; next scheduled run will resume", self.url);
    }
}

impl ContinuationTrigger for HttpContinuation {
    fn schedule(&self, delay: Duration) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; continuation not scheduled");
            return false;
        };

        runtime.spawn(self.clone().deliver(delay));
        info!("Continuation to {} scheduled in {:?}", self.url, delay);
        true
    }
}

/// Trigger that never schedules anything. Used when no self URL is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTrigger;

impl ContinuationTrigger for DisabledTrigger {
    fn schedule(&self, _delay: Duration) -> bool {
        false
    }
}

/// Records requested continuations without acting on them.
#[derive(Debug, Default)]
pub struct RecordingTrigger {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingTrigger {
    /// Create a new recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of continuations requested so far.
    pub fn calls(&self) -> usize {
        self.delays.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Delays passed to each request, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl ContinuationTrigger for RecordingTrigger {
    fn schedule(&self, delay: Duration) -> bool {
        match self.delays.lock() {
            Ok(mut delays) => {
                delays.push(delay);
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: ContinuationTrigger + ?Sized> ContinuationTrigger for std::sync::Arc<T> {
    fn schedule(&self, delay: Duration) -> bool {
        (**self).schedule(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_trigger() {
        let trigger = RecordingTrigger::new();
        assert!(trigger.schedule(Duration::from_millis(5)));
        assert!(trigger.schedule(Duration::ZERO));
        assert_eq!(trigger.calls(), 2);
        assert_eq!(trigger.delays()[0], Duration::from_millis(5));
    }

    #[test]
    fn test_disabled_trigger() {
        assert!(!DisabledTrigger.schedule(Duration::ZERO));
    }

    #[test]
    fn test_http_trigger_needs_runtime() {
        let trigger = HttpContinuation::new("http://127.0.0.1:9/v1/jobs/holder-snapshot", "s");
        assert!(!trigger.schedule(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_http_trigger_spawns() {
        let trigger = HttpContinuation::new("http://127.0.0.1:9/v1/jobs/holder-snapshot", "s")
            .with_retry(1, Duration::ZERO);
        // Delivery will fail in the background; scheduling itself succeeds.
        assert!(trigger.schedule(Duration::from_secs(3600)));
        assert_eq!(trigger.url(), "http://127.0.0.1:9/v1/jobs/holder-snapshot");
    }
}
