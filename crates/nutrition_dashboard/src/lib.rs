//! HTTP host for the nutrition analytics engine.
//!
//! Exposes range analytics, daily progress and interpreted recommendations as
//! JSON, plus `/health` and Prometheus `/metrics`.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use nutrition_engine::{
    DayFetcher, EngineConfig, ProgressEvaluator, RangeAggregator, RecommendationInterpreter,
    RecommendationSource,
};

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

pub use config::ServerConfig;
pub use error::{DashboardError, DashboardResult};
pub use middleware::LoggingFetcher;

pub struct AppState {
    pub days: Arc<dyn DayFetcher>,
    pub recommendations: Arc<dyn RecommendationSource>,
    pub aggregator: RangeAggregator,
    pub evaluator: ProgressEvaluator,
    pub interpreter: RecommendationInterpreter,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        days: Arc<dyn DayFetcher>,
        recommendations: Arc<dyn RecommendationSource>,
        engine: &EngineConfig,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            days,
            recommendations,
            aggregator: RangeAggregator::new(engine),
            evaluator: ProgressEvaluator::new(engine),
            interpreter: RecommendationInterpreter::new(),
            metrics,
        }
    }
}

/// Build the application router. Body limits and timeouts are layered on by
/// the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics_endpoint))
        .route("/analytics", get(routes::analytics))
        .route("/dashboard", get(routes::dashboard))
        .route("/progress", post(routes::progress))
        .route("/recommendations", get(routes::recommendations))
        .route("/recommendations/interpret", post(routes::interpret))
        .with_state(state)
}
