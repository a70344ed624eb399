//! Error type for the dashboard host and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nutrition_engine::NutritionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("upstream error: {0}")]
    Api(#[from] NutritionError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(NutritionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Api(NutritionError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Self::Api(NutritionError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Api(NutritionError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
