//! Render state machine.
//!
//! Holds the single current [`RenderState`] and publishes every transition through a
//! `tokio::sync::watch` channel. Each cycle gets a generation number when it starts; a
//! completion is applied only if it belongs to the most recently started cycle, so a slow
//! cycle that was superseded can never overwrite a newer result.

use tokio::sync::watch;

use crate::{config::Theme, model::RenderState};

/// What the presentation layer receives after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Generation of the cycle that owns `state`. 0 before the first cycle.
    pub generation: u64,
    pub state: RenderState,
    pub theme: Theme,
}

/// Receives cycle start/finish notifications from the refresh scheduler.
pub trait CycleObserver: Send + Sync {
    /// A new cycle is starting. Returns the ticket to hand back on completion.
    fn cycle_started(&self) -> u64;

    /// A cycle finished with `state`.
    fn cycle_finished(&self, ticket: u64, state: RenderState);
}

#[derive(Debug)]
pub struct RenderStateMachine {
    tx: watch::Sender<RenderFrame>,
}

impl RenderStateMachine {
    pub fn new(theme: Theme) -> Self {
        let (tx, _rx) = watch::channel(RenderFrame {
            generation: 0,
            state: RenderState::Loading,
            theme,
        });
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderFrame> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> RenderState {
        self.tx.borrow().state.clone()
    }

    pub fn frame(&self) -> RenderFrame {
        self.tx.borrow().clone()
    }

    /// Enter `Loading` for a new cycle, dropping any previous data or error.
    pub fn begin_cycle(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|frame| {
            frame.generation += 1;
            frame.state = RenderState::Loading;
            generation = frame.generation;
        });
        tracing::debug!(generation, "cycle started");
        generation
    }

    /// Apply the outcome of cycle `generation`.
    ///
    /// Returns false, leaving the state untouched, when the cycle has been superseded or
    /// already completed, or when `state` is not terminal.
    pub fn complete_cycle(&self, generation: u64, state: RenderState) -> bool {
        if state.is_loading() {
            return false;
        }

        let applied = self.tx.send_if_modified(|frame| {
            if frame.generation != generation || !frame.state.is_loading() {
                return false;
            }
            frame.state = state;
            true
        });

        if !applied {
            tracing::trace!(generation, "dropping stale cycle result");
        }
        applied
    }

    /// Theme changes only re-emit the current frame.
    pub fn set_theme(&self, theme: Theme) {
        self.tx.send_if_modified(|frame| {
            if frame.theme == theme {
                return false;
            }
            frame.theme = theme;
            true
        });
    }
}

impl CycleObserver for RenderStateMachine {
    fn cycle_started(&self) -> u64 {
        self.begin_cycle()
    }

    fn cycle_finished(&self, ticket: u64, state: RenderState) {
        self.complete_cycle(ticket, state);
    }
}
