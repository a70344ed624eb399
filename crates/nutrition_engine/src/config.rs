use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::NutritionError;
use secrecy::SecretString;

/// A day counts as achieved when calories consumed reach this share of the calorie goal.
pub const DEFAULT_ACHIEVEMENT_THRESHOLD: f64 = 0.8;
/// Progress at or above this percentage of the goal is on track.
pub const DEFAULT_ON_TRACK_PERCENT: f64 = 90.0;
/// Progress at or above this percentage (and below on-track) warrants caution.
pub const DEFAULT_CAUTION_PERCENT: f64 = 70.0;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Policy constants used by the aggregation and progress components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub achievement_threshold: f64,
    pub on_track_percent: f64,
    pub caution_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            achievement_threshold: DEFAULT_ACHIEVEMENT_THRESHOLD,
            on_track_percent: DEFAULT_ON_TRACK_PERCENT,
            caution_percent: DEFAULT_CAUTION_PERCENT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, NutritionError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read overrides through `get`; unset keys keep their defaults.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, NutritionError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let cfg = Self {
            achievement_threshold: parse_var(&mut get, "NUTRITION_ACHIEVEMENT_THRESHOLD")?
                .unwrap_or(defaults.achievement_threshold),
            on_track_percent: parse_var(&mut get, "NUTRITION_ON_TRACK_PERCENT")?
                .unwrap_or(defaults.on_track_percent),
            caution_percent: parse_var(&mut get, "NUTRITION_CAUTION_PERCENT")?
                .unwrap_or(defaults.caution_percent),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), NutritionError> {
        if !(self.achievement_threshold.is_finite() && self.achievement_threshold > 0.0) {
            return Err(NutritionError::Config(format!(
                "achievement threshold must be a positive number, got {}",
                self.achievement_threshold
            )));
        }
        if !(self.caution_percent.is_finite() && self.on_track_percent.is_finite()) {
            return Err(NutritionError::Config(
                "status thresholds must be finite".into(),
            ));
        }
        if self.caution_percent > self.on_track_percent {
            return Err(NutritionError::Config(format!(
                "caution percent ({}) exceeds on-track percent ({})",
                self.caution_percent, self.on_track_percent
            )));
        }
        Ok(())
    }
}

/// Connection settings for the nutrition backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: SecretString,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, NutritionError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, NutritionError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = get("NUTRITION_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NutritionError::Config("NUTRITION_API_TOKEN missing".into()))?;
        let base_url = get("NUTRITION_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout_secs =
            parse_var(&mut get, "NUTRITION_API_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_retries =
            parse_var(&mut get, "NUTRITION_API_MAX_RETRIES")?.unwrap_or(DEFAULT_MAX_RETRIES);
        Ok(Self {
            base_url,
            api_token: SecretString::new(token.into()),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }
}

fn parse_var<T, F>(get: &mut F, key: &str) -> Result<Option<T>, NutritionError>
where
    T: FromStr,
    T::Err: Display,
    F: FnMut(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| NutritionError::Config(format!("{key}: {e}"))),
    }
}
