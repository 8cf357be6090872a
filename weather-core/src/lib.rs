//! Core library for the embeddable weather widget.
//!
//! This crate defines:
//! - Widget configuration and the on-disk host defaults
//! - The OpenWeather transport behind a swappable trait
//! - The fetch-and-classify pipeline producing one render state per cycle
//! - The refresh scheduler and the render state machine that guards against stale results
//!
//! It is used by `weather-widget`, but any host that can supply a [`WidgetConfig`] and
//! draw a [`RenderState`] can embed it.

pub mod config;
pub mod error;
pub mod fetch;
pub mod icon;
pub mod model;
pub mod provider;
pub mod scheduler;
pub mod state;
pub mod view;
pub mod widget;

pub use config::{FileConfig, Theme, Units, WidgetConfig};
pub use error::{ApiErrorBody, ErrorCode, Failure, FetchError, classify};
pub use fetch::{fetch_snapshot, run_fetch_cycle};
pub use icon::map_condition_to_icon;
pub use model::{ErrorInfo, IconKey, RenderState, WeatherSnapshot};
pub use provider::{OpenWeatherTransport, RawResponse, TransportError, WeatherRequest, WeatherTransport};
pub use scheduler::{REFRESH_INTERVAL, RefreshHandle, RefreshScheduler};
pub use state::{CycleObserver, RenderFrame, RenderStateMachine};
pub use widget::Widget;
