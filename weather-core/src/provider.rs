use crate::config::{Units, WidgetConfig};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

pub use openweather::OpenWeatherTransport;

/// Parameters of one current-weather request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub city: String,
    pub units: Units,
    pub api_key: String,
}

impl From<&WidgetConfig> for WeatherRequest {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            city: config.city.clone(),
            units: config.units,
            api_key: config.api_key.clone(),
        }
    }
}

/// Status and body of whatever the server answered, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The server could not be reached, or the response could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One HTTP round trip to the weather endpoint.
///
/// Implementations must not interpret the body; classification happens in
/// [`crate::fetch`].
#[async_trait]
pub trait WeatherTransport: Send + Sync + Debug {
    async fn get_current(&self, request: &WeatherRequest) -> Result<RawResponse, TransportError>;
}
