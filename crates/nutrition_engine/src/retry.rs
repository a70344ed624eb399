use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::{Rng, rng};
use serde_json::Value;
use tracing::debug;

use crate::{DailyNutritionSummary, DayFetcher, NutritionError, RecommendationSource};

/// A simple retry policy with exponential backoff and jitter.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Run `f` until it succeeds, `should_retry` rejects the error, or the
    /// retry budget is spent.
    pub async fn retry_async<F, Fut, T, E, R>(&self, mut f: F, should_retry: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // exponential backoff with jitter
        let max_delay = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let max_ms = max_delay.as_millis().max(1) as u64;
        Duration::from_millis(rng().random_range(0..max_ms))
    }
}

/// Decorator that retries transient failures of the wrapped capability.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: DayFetcher> DayFetcher for RetryingFetcher<F> {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DailyNutritionSummary, NutritionError> {
        self.policy
            .retry_async(
                || self.inner.fetch_day(date),
                |e: &NutritionError| {
                    let retry = e.is_retryable();
                    if retry {
                        debug!(%date, error = %e, "retrying day fetch");
                    }
                    retry
                },
            )
            .await
    }
}

#[async_trait]
impl<F: RecommendationSource> RecommendationSource for RetryingFetcher<F> {
    async fn fetch_recommendations(&self) -> Result<Value, NutritionError> {
        self.policy
            .retry_async(
                || self.inner.fetch_recommendations(),
                NutritionError::is_retryable,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retry_succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = fast(3)
            .retry_async(
                move || {
                    let c = c.clone();
                    async move {
                        let prev = c.fetch_add(1, Ordering::SeqCst) + 1;
                        if prev < 3 { Err("fail") } else { Ok(42) }
                    }
                },
                |_| true,
            )
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast(5)
            .retry_async(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(NutritionError::NotFound("gone".into())) }
                },
                NutritionError::is_retryable,
            )
            .await;
        assert!(matches!(result, Err(NutritionError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    struct Flaky {
        calls: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl DayFetcher for Flaky {
        async fn fetch_day(
            &self,
            date: NaiveDate,
        ) -> Result<DailyNutritionSummary, NutritionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(NutritionError::from_status(503, "busy"));
            }
            Ok(serde_json::from_value(serde_json::json!({
                "log_date": date,
                "total_calories_consumed": 1900.0,
            }))?)
        }
    }

    #[tokio::test]
    async fn retrying_fetcher_recovers_from_server_errors() {
        let fetcher = RetryingFetcher::new(
            Flaky {
                calls: AtomicU32::new(0),
                failures: 2,
            },
            fast(2),
        );
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let s = fetcher.fetch_day(date).await.expect("third attempt succeeds");
        assert_eq!(s.total_calories_consumed, 1900.0);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retrying_fetcher_gives_up_after_budget() {
        let fetcher = RetryingFetcher::new(
            Flaky {
                calls: AtomicU32::new(0),
                failures: 10,
            },
            fast(1),
        );
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let err = fetcher.fetch_day(date).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }
}
