//! Error taxonomy and classification of failed fetches.

use serde::Deserialize;
use thiserror::Error;

use crate::config::WidgetConfig;

/// Fallback text when the upstream gives us nothing better.
pub const DATA_NOT_AVAILABLE: &str = "Weather data not available";

/// Used when a successful response cannot be understood.
pub const LOAD_FAILED: &str = "Failed to load weather data";

/// Every way a fetch cycle can fail. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error(
        "No API key provided. Please add a valid OpenWeatherMap API key using the 'api-key' attribute."
    )]
    MissingKey,

    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidKey,

    #[error("City \"{city}\" not found. Please check the city name.")]
    CityNotFound { city: String },

    /// The server was never reached. Holds the transport's description of the cause.
    #[error("Network error. Please check your internet connection.")]
    Network(String),

    #[error("{0}")]
    Upstream(String),
}

/// Error code as sent by OpenWeather, which uses both `"404"` and `401`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl ErrorCode {
    pub fn as_status(&self) -> Option<u16> {
        match self {
            ErrorCode::Number(n) => u16::try_from(*n).ok(),
            ErrorCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// JSON body of a non-success response. Both fields are optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub cod: Option<ErrorCode>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    fn code(&self) -> Option<u16> {
        self.cod.as_ref().and_then(ErrorCode::as_status)
    }

    fn mentions_api_key(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.to_lowercase().contains("api key"))
    }
}

/// Raw failure observed by the fetch pipeline, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Connection-level failure; no response was received.
    Transport(String),
    /// The server answered with a non-success status. `body` is `None` when it was not
    /// valid JSON.
    Rejected {
        status: u16,
        body: Option<ApiErrorBody>,
    },
    /// A success response whose body could not be turned into a snapshot.
    Malformed(String),
}

/// Turn a raw failure into one categorized error. Rules apply in priority order.
pub fn classify(config: &WidgetConfig, failure: &Failure) -> FetchError {
    if !config.has_api_key() {
        return FetchError::MissingKey;
    }

    match failure {
        Failure::Transport(cause) => FetchError::Network(cause.clone()),
        Failure::Rejected { status, body } => {
            let code = body.as_ref().and_then(ApiErrorBody::code);
            let mentions_key = body.as_ref().is_some_and(ApiErrorBody::mentions_api_key);

            if *status == 401 || code == Some(401) || mentions_key {
                FetchError::InvalidKey
            } else if *status == 404 || code == Some(404) {
                FetchError::CityNotFound {
                    city: config.city.clone(),
                }
            } else {
                let message = body
                    .as_ref()
                    .and_then(|b| b.message.as_deref())
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DATA_NOT_AVAILABLE);
                FetchError::Upstream(message.to_string())
            }
        }
        Failure::Malformed(_) => FetchError::Upstream(LOAD_FAILED.to_string()),
    }
}
