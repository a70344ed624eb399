//! Nutrition analytics engine.
//!
//! Turns independently fetched daily nutrition snapshots into range statistics,
//! classifies per-nutrient progress against goals, and interprets loosely shaped
//! recommendation payloads into a closed set of display states.
//!
//! Data access is injected through the [`DayFetcher`] and
//! [`RecommendationSource`] traits; [`http_client::ReqwestNutritionClient`]
//! implements both against the nutrition backend.

use std::future::Future;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregator;
pub mod config;
pub mod http_client;
pub mod progress;
pub mod recommendation;
pub mod retry;
pub mod utils;

pub use aggregator::{DayBreakdown, RangeAggregator, RangeAverages, RangeStatistics};
pub use config::{ClientConfig, EngineConfig};
pub use progress::{
    GapTrend, NutrientProgress, Progress, ProgressDisplay, ProgressEvaluator, ProgressStatus,
    SummaryProgress,
};
pub use recommendation::{
    Interpretation, InterpretedRecommendation, PlanSections, RecommendationInterpreter,
    RecommendationReport,
};

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NutritionError {
    /// Map a non-success HTTP status and a body snippet to an error variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => Self::NotFound(body),
            401 | 403 => Self::Auth(body),
            400 | 422 => Self::InvalidInput(body),
            _ => Self::Unexpected { status, body },
        }
    }

    /// Transport failures, throttling and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Unexpected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One nutrient's status within a daily summary.
///
/// `gap` is passed through as the backend reports it (`consumed - goal`).
/// Progress is always derived from `goal` and `consumed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NutrientGap {
    pub nutrient_name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub goal: f64,
    #[serde(default)]
    pub consumed: f64,
    #[serde(default)]
    pub gap: f64,
}

/// One date's nutrition snapshot as reported by the backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyNutritionSummary {
    pub log_date: NaiveDate,
    #[serde(default)]
    pub matched_demographic_group: String,
    #[serde(default)]
    pub total_calories_goal: f64,
    #[serde(default)]
    pub total_calories_consumed: f64,
    #[serde(default)]
    pub total_protein_goal: f64,
    #[serde(default)]
    pub total_protein_consumed: f64,
    #[serde(default)]
    pub total_fat_goal: f64,
    #[serde(default)]
    pub total_fat_consumed: f64,
    #[serde(default)]
    pub total_carbs_goal: f64,
    #[serde(default)]
    pub total_carbs_consumed: f64,
    /// Display order is significant and preserved.
    #[serde(default)]
    pub detailed_analysis: Vec<NutrientGap>,
}

/// Capability that produces the summary for a single calendar date.
#[async_trait]
pub trait DayFetcher: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DailyNutritionSummary, NutritionError>;
}

/// Capability that produces the raw recommendation payload.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn fetch_recommendations(&self) -> Result<serde_json::Value, NutritionError>;
}

/// Adapts an async closure `NaiveDate -> Result<DailyNutritionSummary, _>` into a [`DayFetcher`].
pub struct FnDayFetcher<F>(pub F);

#[async_trait]
impl<F, Fut> DayFetcher for FnDayFetcher<F>
where
    F: Fn(NaiveDate) -> Fut + Send + Sync,
    Fut: Future<Output = Result<DailyNutritionSummary, NutritionError>> + Send + 'static,
{
    async fn fetch_day(&self, date: NaiveDate) -> Result<DailyNutritionSummary, NutritionError> {
        (self.0)(date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_deserializes_backend_payload() {
        let payload = json!({
            "log_date": "2025-03-01",
            "matched_demographic_group": "Men 19-30 sedentary",
            "total_calories_goal": 2000.0,
            "total_calories_consumed": 1850.5,
            "total_protein_goal": 54.0,
            "total_protein_consumed": 40.2,
            "total_fat_goal": 0.0,
            "total_fat_consumed": 61.0,
            "total_carbs_goal": 250.0,
            "total_carbs_consumed": 230.0,
            "detailed_analysis": [
                {"nutrient_name": "Iron", "unit": "mg", "goal": 17.0, "consumed": 9.5, "gap": -7.5},
                {
                    "nutrient_name": "Calcium",
                    "unit": "mg",
                    "goal": 1000.0,
                    "consumed": 1200.0,
                    "gap": 200.0
                }
            ]
        });
        let s: DailyNutritionSummary =
            serde_json::from_value(payload).expect("deserialize summary");
        assert_eq!(s.log_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(s.detailed_analysis.len(), 2);
        assert_eq!(s.detailed_analysis[0].nutrient_name, "Iron");
        assert_eq!(s.detailed_analysis[1].gap, 200.0);
    }

    #[test]
    fn summary_missing_numbers_default_to_zero() {
        let payload = json!({"log_date": "2025-03-02"});
        let s: DailyNutritionSummary =
            serde_json::from_value(payload).expect("deserialize summary");
        assert_eq!(s.total_carbs_goal, 0.0);
        assert!(s.detailed_analysis.is_empty());
        assert!(s.matched_demographic_group.is_empty());
    }

    #[test]
    fn summary_without_date_is_rejected() {
        let res: Result<DailyNutritionSummary, _> =
            serde_json::from_value(json!({"total_calories_goal": 2000.0}));
        assert!(res.is_err());
    }

    #[test]
    fn from_status_maps_common_codes() {
        assert!(matches!(
            NutritionError::from_status(404, "x"),
            NutritionError::NotFound(_)
        ));
        assert!(matches!(
            NutritionError::from_status(401, "x"),
            NutritionError::Auth(_)
        ));
        assert!(matches!(
            NutritionError::from_status(422, "x"),
            NutritionError::InvalidInput(_)
        ));
        let e = NutritionError::from_status(503, "down");
        assert!(e.is_retryable());
        assert!(!NutritionError::from_status(404, "x").is_retryable());
    }

    #[tokio::test]
    async fn fn_day_fetcher_forwards_to_closure() {
        let fetcher = FnDayFetcher(|date: NaiveDate| async move {
            Ok::<_, NutritionError>(DailyNutritionSummary {
                log_date: date,
                matched_demographic_group: String::new(),
                total_calories_goal: 2000.0,
                total_calories_consumed: 1500.0,
                total_protein_goal: 0.0,
                total_protein_consumed: 0.0,
                total_fat_goal: 0.0,
                total_fat_consumed: 0.0,
                total_carbs_goal: 0.0,
                total_carbs_consumed: 0.0,
                detailed_analysis: vec![],
            })
        });
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let s = fetcher.fetch_day(date).await.expect("summary");
        assert_eq!(s.log_date, date);
        assert_eq!(s.total_calories_consumed, 1500.0);
    }
}
