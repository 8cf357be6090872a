//! Plain-text rendering of a [`RenderState`].

use std::fmt::Write as _;

use crate::{config::Units, model::RenderState, provider::openweather::SIGN_UP_URL};

pub const LOADING_TEXT: &str = "Loading weather data...";
pub const MISSING_KEY_HINT: &str =
    "Add your API key with: <weather-widget api-key=\"YOUR_API_KEY\"></weather-widget>";

/// Render `state` as the lines a user would see. `units` picks the unit labels.
pub fn render(state: &RenderState, units: Units) -> String {
    let mut out = String::new();

    match state {
        RenderState::Loading => out.push_str(LOADING_TEXT),
        RenderState::Misconfigured => {
            out.push_str("Configuration Error\n");
            out.push_str(
                "The weather widget is not properly configured. Please provide a valid API key.",
            );
        }
        RenderState::Failed(info) => {
            out.push_str("Error\n");
            out.push_str(&info.message);
            if info.is_missing_key {
                let _ = write!(out, "\n{MISSING_KEY_HINT}");
            } else if info.is_auth_error {
                let _ = write!(out, "\nGet a free API key at {SIGN_UP_URL}");
            }
        }
        RenderState::Ready(w) => {
            let _ = writeln!(out, "{}", w.city);
            let _ = writeln!(out, "[{}]", w.icon);
            let _ = writeln!(out, "{}°{}", w.temperature, units.temperature_symbol());
            let _ = writeln!(out, "{}", w.condition);
            let _ = writeln!(out, "Feels like {}°", w.feels_like);
            let _ = writeln!(out, "Wind {} {}", w.wind_speed, units.wind_speed_unit());
            let _ = writeln!(out, "Humidity {}%", w.humidity);
            let _ = write!(out, "High / Low {}° / {}°", w.high, w.low);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FetchError,
        model::{ErrorInfo, IconKey, WeatherSnapshot},
    };
    use chrono::Utc;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "London".into(),
            temperature: 22,
            feels_like: 20,
            high: 24,
            low: 18,
            condition: "Rain".into(),
            humidity: 55.0,
            wind_speed: 3.2,
            icon: IconKey::CloudRain,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn loading_text() {
        assert_eq!(render(&RenderState::Loading, Units::Metric), LOADING_TEXT);
    }

    #[test]
    fn missing_key_shows_attribute_hint() {
        let state = RenderState::Failed(ErrorInfo::from(FetchError::MissingKey));
        let text = render(&state, Units::Metric);

        assert!(text.starts_with("Error\nNo API key provided"));
        assert!(text.contains(MISSING_KEY_HINT));
        assert!(!text.contains(SIGN_UP_URL));
    }

    #[test]
    fn invalid_key_links_sign_up() {
        let state = RenderState::Failed(ErrorInfo::from(FetchError::InvalidKey));
        let text = render(&state, Units::Metric);

        assert!(text.contains(SIGN_UP_URL));
        assert!(!text.contains(MISSING_KEY_HINT));
    }

    #[test]
    fn other_errors_have_no_hint() {
        let state = RenderState::Failed(ErrorInfo::from(FetchError::CityNotFound {
            city: "Atlantis".into(),
        }));
        let text = render(&state, Units::Metric);

        assert_eq!(text, "Error\nCity \"Atlantis\" not found. Please check the city name.");
    }

    #[test]
    fn misconfigured_text() {
        let text = render(&RenderState::Misconfigured, Units::Metric);
        assert!(text.starts_with("Configuration Error"));
    }

    #[test]
    fn ready_uses_unit_labels() {
        let metric = render(&RenderState::Ready(snapshot()), Units::Metric);
        assert!(metric.contains("22°C"));
        assert!(metric.contains("Wind 3.2 m/s"));
        assert!(metric.contains("High / Low 24° / 18°"));
        assert!(metric.contains("Humidity 55%"));
        assert!(metric.contains("[CloudRain]"));

        let fractional = WeatherSnapshot { humidity: 55.5, ..snapshot() };
        assert!(render(&RenderState::Ready(fractional), Units::Metric).contains("Humidity 55.5%"));

        let imperial = render(&RenderState::Ready(snapshot()), Units::Imperial);
        assert!(imperial.contains("22°F"));
        assert!(imperial.contains("Wind 3.2 mph"));
    }
}
