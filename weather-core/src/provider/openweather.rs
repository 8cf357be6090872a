use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{RawResponse, TransportError, WeatherRequest, WeatherTransport};

pub const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Sign-up page shown next to invalid-key errors.
pub const SIGN_UP_URL: &str = "https://home.openweathermap.org/users/sign_up";

#[derive(Debug, Clone)]
pub struct OpenWeatherTransport {
    url: String,
    http: Client,
}

impl OpenWeatherTransport {
    pub fn new() -> Self {
        Self::with_url(CURRENT_WEATHER_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for OpenWeatherTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherTransport for OpenWeatherTransport {
    async fn get_current(&self, request: &WeatherRequest) -> Result<RawResponse, TransportError> {
        tracing::debug!(url = %self.url, city = %request.city, units = %request.units, "requesting current weather");

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("q", request.city.as_str()),
                ("units", request.units.as_str()),
                ("appid", request.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| TransportError(format!("Failed to send request to OpenWeather: {err}")))?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|err| {
            TransportError(format!("Failed to read OpenWeather response body: {err}"))
        })?;

        tracing::debug!(status, body = %truncate_body(&body), "OpenWeather responded");

        Ok(RawResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWeather {
    pub main: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwWind {
    pub speed: f64,
}

/// Success payload of `/data/2.5/weather`, reduced to the fields the widget shows.
#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrentResponse {
    pub name: String,
    #[serde(default)]
    pub dt: Option<i64>,
    pub main: OwMain,
    #[serde(default)]
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
