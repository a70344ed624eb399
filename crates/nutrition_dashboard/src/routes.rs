use std::sync::Arc;

use axum::Json;
use axum::debug_handler;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Days, NaiveDate, Utc};
use nutrition_engine::utils::parse_log_date;
use nutrition_engine::{
    Interpretation, ProgressDisplay, RangeStatistics, RecommendationReport, SummaryProgress,
};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::error::{DashboardError, DashboardResult};

/// Longest range a single analytics request may cover.
pub const MAX_RANGE_DAYS: u64 = 366;
const DEFAULT_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub log_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub consumed: f64,
    pub goal: f64,
}

#[debug_handler]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[debug_handler]
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.metrics.render();
    ([("content-type", "text/plain; version=0.0.4")], body)
}

#[debug_handler]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> DashboardResult<Json<RangeStatistics>> {
    let today = Utc::now().date_naive();
    let (start, end) = resolve_range(query.start.as_deref(), query.end.as_deref(), today)?;
    let stats = state
        .aggregator
        .aggregate(start, end, state.days.as_ref())
        .await;
    Ok(Json(stats))
}

#[debug_handler]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> DashboardResult<Json<SummaryProgress>> {
    let date = match query.log_date.as_deref() {
        Some(raw) => parse_date("log_date", raw)?,
        None => Utc::now().date_naive(),
    };
    let summary = state.days.fetch_day(date).await?;
    Ok(Json(state.evaluator.evaluate_summary(&summary)))
}

#[debug_handler]
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProgressRequest>,
) -> DashboardResult<Json<ProgressDisplay>> {
    if !req.consumed.is_finite() || !req.goal.is_finite() {
        return Err(DashboardError::Validation(
            "consumed and goal must be finite numbers".into(),
        ));
    }
    Ok(Json(state.evaluator.evaluate(req.consumed, req.goal).display()))
}

#[debug_handler]
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
) -> DashboardResult<Json<RecommendationReport>> {
    let payload = state.recommendations.fetch_recommendations().await?;
    Ok(Json(state.interpreter.interpret_report(Some(&payload))))
}

#[debug_handler]
pub async fn interpret(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Json<Interpretation> {
    Json(state.interpreter.interpret(Some(&payload)))
}

/// Resolve the requested range against `today`.
///
/// A missing end defaults to today and a missing start to a seven-day window
/// ending at `end`. A reversed range is passed through and aggregates to
/// nothing.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> DashboardResult<(NaiveDate, NaiveDate)> {
    let end = match end {
        Some(raw) => parse_date("end", raw)?,
        None => today,
    };
    let start = match start {
        Some(raw) => parse_date("start", raw)?,
        None => end
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS - 1))
            .unwrap_or(end),
    };
    let span = (end - start).num_days();
    if span >= MAX_RANGE_DAYS as i64 {
        return Err(DashboardError::Validation(format!(
            "range covers {} days, at most {MAX_RANGE_DAYS} allowed",
            span + 1
        )));
    }
    Ok((start, end))
}

fn parse_date(field: &str, raw: &str) -> DashboardResult<NaiveDate> {
    parse_log_date(raw)
        .ok_or_else(|| DashboardError::Validation(format!("invalid {field} date: {raw}")))
}
