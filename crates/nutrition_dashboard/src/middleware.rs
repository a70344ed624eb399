//! Logging and timing around the backend capabilities.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use nutrition_engine::{DailyNutritionSummary, DayFetcher, NutritionError, RecommendationSource};
use serde_json::Value;
use tracing::debug;

/// Wraps a capability, logging every call with its duration and recording a
/// latency histogram per operation.
pub struct LoggingFetcher<C: ?Sized> {
    inner: Arc<C>,
}

impl<C: ?Sized> Clone for LoggingFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C> LoggingFetcher<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<C: ?Sized> LoggingFetcher<C> {
    pub fn from_arc(inner: Arc<C>) -> Self {
        Self { inner }
    }

    async fn with_logging<F, Fut, T>(
        &self,
        operation: F,
        name: &'static str,
    ) -> Result<T, NutritionError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, NutritionError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        metrics::histogram!("nutrition_upstream_duration_seconds", "operation" => name)
            .record(duration.as_secs_f64());
        match &result {
            Ok(_) => debug!("Operation completed: {} in {:?}", name, duration),
            Err(e) => debug!("Operation failed: {} in {:?} - error: {}", name, duration, e),
        }
        result
    }
}

#[async_trait]
impl<C: DayFetcher + ?Sized + 'static> DayFetcher for LoggingFetcher<C> {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DailyNutritionSummary, NutritionError> {
        self.with_logging(
            |client| async move { client.fetch_day(date).await },
            "fetch_day",
        )
        .await
    }
}

#[async_trait]
impl<C: RecommendationSource + ?Sized + 'static> RecommendationSource for LoggingFetcher<C> {
    async fn fetch_recommendations(&self) -> Result<Value, NutritionError> {
        self.with_logging(
            |client| async move { client.fetch_recommendations().await },
            "fetch_recommendations",
        )
        .await
    }
}
