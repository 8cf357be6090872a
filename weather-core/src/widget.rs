use std::{sync::Arc, time::Duration};

use tokio::sync::watch;

use crate::{
    config::WidgetConfig,
    model::RenderState,
    provider::WeatherTransport,
    scheduler::{RefreshHandle, RefreshScheduler},
    state::{RenderFrame, RenderStateMachine},
};

/// A mounted widget: one state machine plus the refresh cycle for the current config.
///
/// Reconfiguration tears the old cycle down completely before starting a new one, so a
/// widget never runs two timers.
#[derive(Debug)]
pub struct Widget {
    scheduler: RefreshScheduler,
    machine: Arc<RenderStateMachine>,
    config: WidgetConfig,
    handle: Option<RefreshHandle>,
}

impl Widget {
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        transport: Arc<dyn WeatherTransport>,
        config: WidgetConfig,
        interval: Duration,
    ) -> Self {
        let scheduler = RefreshScheduler::with_interval(transport, interval);
        let machine = Arc::new(RenderStateMachine::new(config.theme));
        let handle = scheduler.start(config.clone(), machine.clone());

        Self {
            scheduler,
            machine,
            config,
            handle: Some(handle),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn current(&self) -> RenderState {
        self.machine.current()
    }

    pub fn frame(&self) -> RenderFrame {
        self.machine.frame()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderFrame> {
        self.machine.subscribe()
    }

    /// Apply a new configuration. Returns true if a new fetch cycle was started.
    pub fn reconfigure(&mut self, config: WidgetConfig) -> bool {
        if config == self.config {
            return false;
        }

        let restart = self.config.needs_refetch(&config);
        self.machine.set_theme(config.theme);

        if restart {
            tracing::info!(city = %config.city, units = %config.units, "reconfiguring widget");
            if let Some(old) = self.handle.take() {
                old.cancel();
            }
            self.handle = Some(self.scheduler.start(config.clone(), self.machine.clone()));
        }

        self.config = config;
        restart
    }

    pub fn teardown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        tracing::debug!("widget torn down");
    }
}
