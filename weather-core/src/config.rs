use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::scheduler::REFRESH_INTERVAL;

pub const DEFAULT_CITY: &str = "New York";

/// Unit system requested from the weather API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "C",
            Units::Imperial => "F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow!("Unknown units '{value}'. Supported units: metric, imperial.")),
        }
    }
}

/// Colour scheme. Presentation only; never affects fetching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Theme {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow!("Unknown theme '{value}'. Supported themes: light, dark.")),
        }
    }
}

/// Everything the widget needs for one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub api_key: String,
    pub city: String,
    pub units: Units,
    pub theme: Theme,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            city: DEFAULT_CITY.to_string(),
            units: Units::default(),
            theme: Theme::default(),
        }
    }
}

impl WidgetConfig {
    /// Build a config from raw host attributes.
    ///
    /// Absent or blank values take the defaults. Unrecognised `units`/`theme` values are
    /// logged and replaced by the default as well.
    pub fn from_attributes(
        api_key: Option<&str>,
        city: Option<&str>,
        units: Option<&str>,
        theme: Option<&str>,
    ) -> Self {
        let defaults = Self::default();

        let units = non_blank(units).map_or(defaults.units, |raw| {
            Units::try_from(raw).unwrap_or_else(|err| {
                tracing::warn!(%err, "falling back to default units");
                defaults.units
            })
        });
        let theme = non_blank(theme).map_or(defaults.theme, |raw| {
            Theme::try_from(raw).unwrap_or_else(|err| {
                tracing::warn!(%err, "falling back to default theme");
                defaults.theme
            })
        });

        Self {
            api_key: non_blank(api_key).map_or(defaults.api_key, str::to_string),
            city: non_blank(city).map_or(defaults.city, str::to_string),
            units,
            theme,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// True when switching to `other` requires a new fetch cycle. Theme changes don't.
    pub fn needs_refetch(&self, other: &WidgetConfig) -> bool {
        self.api_key != other.api_key || self.city != other.city || self.units != other.units
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Host defaults stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// city = "Berlin"
/// units = "metric"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub city: Option<String>,
    pub units: Option<String>,
    pub theme: Option<String>,
    pub refresh_interval_secs: u64,
    /// Override for the weather endpoint, mostly for proxies and testing.
    pub base_url: Option<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            city: None,
            units: None,
            theme: None,
            refresh_interval_secs: REFRESH_INTERVAL.as_secs(),
            base_url: None,
        }
    }
}

impl FileConfig {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn widget_config(&self) -> WidgetConfig {
        WidgetConfig::from_attributes(
            self.api_key.as_deref(),
            self.city.as_deref(),
            self.units.as_deref(),
            self.theme.as_deref(),
        )
    }

    /// Refresh cadence; zero means "use the built-in interval".
    pub fn refresh_interval(&self) -> Duration {
        match self.refresh_interval_secs {
            0 => REFRESH_INTERVAL,
            secs => Duration::from_secs(secs),
        }
    }
}
