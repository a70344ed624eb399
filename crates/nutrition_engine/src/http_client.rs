//! HTTP client for the nutrition backend.
//!
//! [`ReqwestNutritionClient`] implements both [`DayFetcher`] and
//! [`RecommendationSource`] with bearer-token authentication.

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::{DailyNutritionSummary, DayFetcher, NutritionError, RecommendationSource};

const BODY_SNIPPET_CHARS: usize = 256;

#[derive(Clone, Debug)]
pub struct ReqwestNutritionClient {
    base_url: String,
    api_token: SecretString,
    client: reqwest::Client,
}

impl ReqwestNutritionClient {
    /// Create a client with reqwest's default settings.
    ///
    /// # Arguments
    /// * `base_url` - Root of the backend API (e.g., "http://localhost:8000")
    /// * `api_token` - Bearer token sent with every request
    pub fn new(base_url: &str, api_token: SecretString) -> Self {
        Self::with_client(base_url, api_token, reqwest::Client::new())
    }

    /// Create a client whose request timeout comes from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, NutritionError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(
            &config.base_url,
            config.api_token.clone(),
            client,
        ))
    }

    fn with_client(base_url: &str, api_token: SecretString, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(self.api_token.expose_secret())
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NutritionError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn error_from_response(&self, resp: reqwest::Response) -> NutritionError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        NutritionError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl DayFetcher for ReqwestNutritionClient {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DailyNutritionSummary, NutritionError> {
        let url = format!("{}/dashboard/", self.base_url);
        let log_date = date.format("%Y-%m-%d").to_string();
        let request = self.get_request(&url).query(&[("log_date", log_date)]);
        self.execute_json(request).await
    }
}

#[async_trait]
impl RecommendationSource for ReqwestNutritionClient {
    async fn fetch_recommendations(&self) -> Result<Value, NutritionError> {
        let url = format!("{}/recommendations/", self.base_url);
        self.execute_json(self.get_request(&url)).await
    }
}
