use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Closed set of icons the presentation layer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconKey {
    Sun,
    Cloud,
    CloudRain,
    CloudSnow,
    CloudLightning,
    Wind,
}

impl IconKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconKey::Sun => "Sun",
            IconKey::Cloud => "Cloud",
            IconKey::CloudRain => "CloudRain",
            IconKey::CloudSnow => "CloudSnow",
            IconKey::CloudLightning => "CloudLightning",
            IconKey::Wind => "Wind",
        }
    }
}

impl std::fmt::Display for IconKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one successful fetch.
///
/// Temperatures are already rounded; `wind_speed` is passed through untouched and its unit
/// follows the configured [`crate::Units`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub high: i32,
    pub low: i32,
    /// Upstream condition label, e.g. "Rain".
    pub condition: String,
    /// Percentage as sent upstream.
    pub humidity: f64,
    pub wind_speed: f64,
    pub icon: IconKey,
    pub observed_at: DateTime<Utc>,
}

/// What the presentation layer needs to know about a failed cycle.
///
/// The flags only pick the help text shown under the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub is_missing_key: bool,
    pub is_auth_error: bool,
}

impl From<&FetchError> for ErrorInfo {
    fn from(err: &FetchError) -> Self {
        Self {
            message: err.to_string(),
            is_missing_key: matches!(err, FetchError::MissingKey),
            is_auth_error: matches!(err, FetchError::InvalidKey),
        }
    }
}

impl From<FetchError> for ErrorInfo {
    fn from(err: FetchError) -> Self {
        Self::from(&err)
    }
}

/// The single authoritative status consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    Loading,
    /// Fallback for a widget with nothing to show. Fetch cycles never produce it; a blank
    /// key ends in `Failed` with `is_missing_key` set.
    Misconfigured,
    Failed(ErrorInfo),
    Ready(WeatherSnapshot),
}

impl RenderState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            RenderState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            RenderState::Failed(info) => Some(info),
            _ => None,
        }
    }
}

impl From<Result<WeatherSnapshot, FetchError>> for RenderState {
    fn from(result: Result<WeatherSnapshot, FetchError>) -> Self {
        match result {
            Ok(snapshot) => RenderState::Ready(snapshot),
            Err(err) => RenderState::Failed(err.into()),
        }
    }
}
