//! One fetch cycle: request, classify, normalize.

use chrono::{DateTime, Utc};

use crate::{
    config::WidgetConfig,
    error::{ApiErrorBody, Failure, FetchError, classify},
    icon::map_condition_to_icon,
    model::{RenderState, WeatherSnapshot},
    provider::{
        WeatherRequest, WeatherTransport,
        openweather::{OwCurrentResponse, truncate_body},
    },
};

/// Run one complete cycle and resolve to exactly one terminal [`RenderState`].
pub async fn run_fetch_cycle(transport: &dyn WeatherTransport, config: &WidgetConfig) -> RenderState {
    fetch_snapshot(transport, config).await.into()
}

/// Fetch and normalize current weather. A blank key fails without touching the network.
pub async fn fetch_snapshot(
    transport: &dyn WeatherTransport,
    config: &WidgetConfig,
) -> Result<WeatherSnapshot, FetchError> {
    if !config.has_api_key() {
        tracing::warn!("no API key configured, skipping request");
        return Err(FetchError::MissingKey);
    }

    let request = WeatherRequest::from(config);
    let response = match transport.get_current(&request).await {
        Ok(response) => response,
        Err(err) => return Err(fail(config, Failure::Transport(err.0))),
    };

    if !response.is_success() {
        let body = serde_json::from_str::<ApiErrorBody>(&response.body).ok();
        if body.is_none() {
            tracing::debug!(body = %truncate_body(&response.body), "error body is not JSON");
        }
        return Err(fail(
            config,
            Failure::Rejected {
                status: response.status,
                body,
            },
        ));
    }

    let payload: OwCurrentResponse = serde_json::from_str(&response.body)
        .map_err(|err| fail(config, Failure::Malformed(err.to_string())))?;

    let snapshot = snapshot_from(payload);
    tracing::debug!(city = %snapshot.city, condition = %snapshot.condition, "weather fetched");
    Ok(snapshot)
}

fn fail(config: &WidgetConfig, failure: Failure) -> FetchError {
    let err = classify(config, &failure);
    tracing::warn!(city = %config.city, cause = ?failure, error = %err, "weather fetch failed");
    err
}

fn snapshot_from(payload: OwCurrentResponse) -> WeatherSnapshot {
    let condition = payload
        .weather
        .into_iter()
        .next()
        .map(|w| w.main)
        .unwrap_or_else(|| "Unknown".to_string());

    let observed_at = payload
        .dt
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    WeatherSnapshot {
        city: payload.name,
        temperature: round_half_up(payload.main.temp),
        feels_like: round_half_up(payload.main.feels_like),
        high: round_half_up(payload.main.temp_max),
        low: round_half_up(payload.main.temp_min),
        icon: map_condition_to_icon(&condition),
        condition,
        humidity: payload.main.humidity,
        wind_speed: payload.wind.speed,
        observed_at,
    }
}

/// Nearest integer, with halves going up (-2.5 becomes -2, 2.5 becomes 3).
fn round_half_up(value: f64) -> i32 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}
