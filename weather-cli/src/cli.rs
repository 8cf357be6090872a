use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use weather_widget_core::{
    FileConfig, OpenWeatherTransport, RenderState, Widget, WidgetConfig, run_fetch_cycle, view,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Current weather, refreshed in your terminal")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store default widget settings; prompts for anything not given.
    Configure(WidgetArgs),

    /// Fetch once and print the result.
    Show(WidgetArgs),

    /// Keep the widget mounted and print every state change until Ctrl-C.
    Watch {
        #[command(flatten)]
        widget: WidgetArgs,

        /// Refresh interval in seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
}

/// Widget attributes. Anything omitted comes from the config file, then the defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct WidgetArgs {
    /// OpenWeatherMap API key.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// City name, e.g. "London" or "Paris,FR".
    #[arg(long)]
    pub city: Option<String>,

    /// metric or imperial.
    #[arg(long)]
    pub units: Option<String>,

    /// light or dark.
    #[arg(long)]
    pub theme: Option<String>,
}

impl WidgetArgs {
    fn resolve(&self, file: &FileConfig) -> WidgetConfig {
        WidgetConfig::from_attributes(
            self.api_key.as_deref().or(file.api_key.as_deref()),
            self.city.as_deref().or(file.city.as_deref()),
            self.units.as_deref().or(file.units.as_deref()),
            self.theme.as_deref().or(file.theme.as_deref()),
        )
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let file = FileConfig::load()?;

        match self.command {
            Command::Configure(args) => configure(file, args),
            Command::Show(args) => show(&file, &args).await,
            Command::Watch { widget, interval } => {
                let interval = interval.map_or_else(|| file.refresh_interval(), Duration::from_secs);
                watch(&file, &widget, interval).await
            }
        }
    }
}

fn transport(file: &FileConfig) -> OpenWeatherTransport {
    match &file.base_url {
        Some(url) => OpenWeatherTransport::with_url(url.clone()),
        None => OpenWeatherTransport::new(),
    }
}

fn configure(mut file: FileConfig, args: WidgetArgs) -> Result<()> {
    let api_key = match args.api_key {
        Some(key) => key,
        None => inquire::Password::new("OpenWeatherMap API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    let city = match args.city {
        Some(city) => city,
        None => inquire::Text::new("City:")
            .with_default(file.city.as_deref().unwrap_or(weather_widget_core::config::DEFAULT_CITY))
            .prompt()
            .context("Failed to read city")?,
    };

    file.api_key = Some(api_key);
    file.city = Some(city);
    if args.units.is_some() {
        file.units = args.units;
    }
    if args.theme.is_some() {
        file.theme = args.theme;
    }

    let path = file.save()?;
    tracing::debug!(path = %path.display(), "configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(file: &FileConfig, args: &WidgetArgs) -> Result<()> {
    let config = args.resolve(file);
    let state = run_fetch_cycle(&transport(file), &config).await;
    print_state(&state, &config);
    Ok(())
}

async fn watch(file: &FileConfig, args: &WidgetArgs, interval: Duration) -> Result<()> {
    let config = args.resolve(file);
    let widget = Widget::mount(Arc::new(transport(file)), config.clone(), interval);
    let mut frames = widget.subscribe();
    tracing::info!(city = %config.city, units = %config.units, ?interval, "widget mounted");

    loop {
        {
            let frame = frames.borrow_and_update();
            print_state(&frame.state, widget.config());
        }

        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Ctrl-C received, tearing widget down");
                break;
            }
        }
    }

    widget.teardown();
    Ok(())
}

fn print_state(state: &RenderState, config: &WidgetConfig) {
    println!("{}", view::render(state, config.units));
    if let Some(snapshot) = state.snapshot() {
        println!(
            "Updated {}",
            snapshot.observed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    println!();
}
