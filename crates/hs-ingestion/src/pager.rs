//! Bounded retry around single page fetches.
//!
//! # Policy
//!
//! Each page request is attempted up to `max_attempts` times with a fixed
//! `retry_delay` between attempts. Two responses are special:
//!
//! - **404**: the API has no "last page" flag and answers 404 once the
//!   cursor runs past the end. `not_found_limit` *consecutive* 404s end the
//!   listing ([`PageOutcome::EndOfData`]) instead of failing.
//! - **Empty page**: a successful page with no items is also end-of-data.
//!
//! Running out of attempts is [`IngestionError::RetriesExhausted`]. Callers
//! must treat that as fatal: skipping a page would leave a gap behind the
//! stored cursor.

use crate::error::IngestionError;
use crate::types::HolderPage;
use crate::{HolderSource, PageParams};
use std::time::Duration;

/// Retry settings for page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per page, including the first.
    pub max_attempts: u32,

    /// Pause between attempts.
    pub retry_delay: Duration,

    /// Consecutive 404s that count as end-of-data.
    pub not_found_limit: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(1),
            not_found_limit: 3,
        }
    }
}

impl RetryPolicy {
    /// Same policy without delays, for tests.
    pub fn immediate() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Result of fetching one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// A non-empty page.
    Page(HolderPage),

    /// The listing is exhausted.
    EndOfData,
}

/// Fetch one page, retrying transient failures.
///
/// # Errors
///
/// Returns [`IngestionError::RetriesExhausted`] if no attempt succeeded and
/// the 404 streak never reached `not_found_limit`.
pub async fn fetch_page_with_retry<S: HolderSource>(
    source: &S,
    params: Option<&PageParams>,
    policy: &RetryPolicy,
) -> Result<PageOutcome, IngestionError> {
    let mut not_found_streak = 0u32;
    let mut last_error = String::new();
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match source.get_holders_page(params).await {
            Ok(page) if page.items.is_empty() => {
                tracing::info!("Empty holders page, treating as end of data");
                return Ok(PageOutcome::EndOfData);
            }
            Ok(page) => return Ok(PageOutcome::Page(page)),
            Err(e) if e.is_not_found() => {
                not_found_streak += 1;
                if not_found_streak >= policy.not_found_limit {
                    tracing::info!(
                        "{} consecutive 404 responses, treating as end of data",
                        not_found_streak
                    );
                    return Ok(PageOutcome::EndOfData);
                }
                tracing::debug!("Holders page 404 ({}/{})", not_found_streak, policy.not_found_limit);
                last_error = e.to_string();
            }
            Err(e) => {
                not_found_streak = 0;
                tracing::warn!("Holders page attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = e.to_string();
            }
        }

        if attempt < attempts && !policy.retry_delay.is_zero() {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    Err(IngestionError::RetriesExhausted {
        attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockSource;

    #[tokio::test]
    async fn test_page_returned_on_first_try() {
        let mock = MockSource::new().with_page(MockSource::generated_page(0, 50, true));
        let outcome = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate())
            .await
            .unwrap();

        match outcome {
            PageOutcome::Page(page) => assert_eq!(page.items.len(), 50),
            PageOutcome::EndOfData => panic!("expected a page"),
        }
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_three_not_found_is_end_of_data() {
        let mock = MockSource::new().with_not_found(3);
        let outcome = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate())
            .await
            .unwrap();
        assert_eq!(outcome, PageOutcome::EndOfData);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_not_found_streak_resets_on_other_error() {
        // 404, 404, error, 404, 404 -> never three in a row, budget of 5 spent
        let mock = MockSource::new()
            .with_not_found(2)
            .with_failure("reset")
            .with_not_found(2)
            .with_page(MockSource::generated_page(0, 1, false));

        let result = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate()).await;
        assert!(matches!(
            result,
            Err(IngestionError::RetriesExhausted { attempts: 5, .. })
        ));
        assert_eq!(mock.remaining(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let mock = MockSource::new()
            .with_failure("timeout")
            .with_failure("502")
            .with_page(MockSource::generated_page(0, 10, false));

        let outcome = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate())
            .await
            .unwrap();
        assert!(matches!(outcome, PageOutcome::Page(_)));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_error() {
        let mut mock = MockSource::new();
        for _ in 0..5 {
            mock = mock.with_failure("down");
        }

        let result = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate()).await;
        match result {
            Err(IngestionError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 5);
                assert!(last_error.contains("down"));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_page_is_end_of_data() {
        let mock = MockSource::new().with_page(MockSource::generated_page(0, 0, false));
        let outcome = fetch_page_with_retry(&mock, None, &RetryPolicy::immediate())
            .await
            .unwrap();
        assert_eq!(outcome, PageOutcome::EndOfData);
    }

    #[tokio::test]
    async fn test_cursor_forwarded() {
        let first = MockSource::generated_page(0, 50, true);
        let cursor = first.next_page_params.clone().unwrap();
        let mock = MockSource::new().with_page(MockSource::generated_page(50, 50, true));

        fetch_page_with_retry(&mock, Some(&cursor), &RetryPolicy::immediate())
            .await
            .unwrap();
        assert_eq!(mock.requests(), vec![Some(cursor)]);
    }
}
