use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{config::WidgetConfig, fetch::run_fetch_cycle, provider::WeatherTransport, state::CycleObserver};

/// Default refresh cadence.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Starts periodic fetch cycles against one transport.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    transport: Arc<dyn WeatherTransport>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(transport: Arc<dyn WeatherTransport>) -> Self {
        Self::with_interval(transport, REFRESH_INTERVAL)
    }

    /// A zero interval falls back to [`REFRESH_INTERVAL`].
    pub fn with_interval(transport: Arc<dyn WeatherTransport>, interval: Duration) -> Self {
        let interval = if interval.is_zero() { REFRESH_INTERVAL } else { interval };
        Self {
            transport,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle right away, then one every interval until the handle is cancelled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, config: WidgetConfig, observer: Arc<dyn CycleObserver>) -> RefreshHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let config = Arc::new(config);

        tracing::info!(city = %config.city, units = %config.units, interval = ?self.interval, "refresh scheduler started");

        spawn_cycle(
            self.transport.clone(),
            config.clone(),
            observer.clone(),
            cancel_rx.clone(),
        );

        let task = tokio::spawn(tick_loop(
            self.transport.clone(),
            config,
            observer,
            self.interval,
            cancel_rx,
        ));

        RefreshHandle {
            cancel_tx,
            task: Some(task),
        }
    }
}

async fn tick_loop(
    transport: Arc<dyn WeatherTransport>,
    config: Arc<WidgetConfig>,
    observer: Arc<dyn CycleObserver>,
    period: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_rx.changed() => break,
            _ = ticker.tick() => {
                if !config.has_api_key() {
                    tracing::trace!("no API key, skipping refresh tick");
                    continue;
                }
                spawn_cycle(transport.clone(), config.clone(), observer.clone(), cancel_rx.clone());
            }
        }
    }

    tracing::debug!("refresh loop stopped");
}

/// Each cycle runs in its own task so a slow request never delays the next tick.
fn spawn_cycle(
    transport: Arc<dyn WeatherTransport>,
    config: Arc<WidgetConfig>,
    observer: Arc<dyn CycleObserver>,
    cancel_rx: watch::Receiver<bool>,
) {
    let ticket = observer.cycle_started();

    tokio::spawn(async move {
        let state = run_fetch_cycle(transport.as_ref(), &config).await;

        // Delivering while holding the borrow makes `cancel` wait for it to finish.
        let cancelled = cancel_rx.borrow();
        if *cancelled {
            tracing::trace!(ticket, "handle cancelled, dropping cycle result");
            return;
        }
        observer.cycle_finished(ticket, state);
        drop(cancelled);
    });
}

/// Owns the repeating timer. Cancelling (or dropping) stops all future ticks and
/// discards any result still in flight.
#[derive(Debug)]
pub struct RefreshHandle {
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn is_active(&self) -> bool {
        !*self.cancel_tx.borrow()
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.task.take().is_some() {
            self.cancel_tx.send_replace(true);
            tracing::info!("refresh scheduler cancelled");
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::RenderState,
        provider::{
            RawResponse,
            testing::{CannedTransport, GatedTransport, success_body},
        },
    };
    use std::sync::Mutex;

    /// Counts deliveries.
    #[derive(Debug, Default)]
    struct Counter(std::sync::atomic::AtomicUsize);

    impl CycleObserver for Counter {
        fn cycle_started(&self) -> u64 {
            0
        }

        fn cycle_finished(&self, _ticket: u64, _state: RenderState) {
            std::thread::sleep(Duration::from_micros(50));
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    /// Records every callback instead of tracking generations.
    #[derive(Debug, Default)]
    struct Recorder {
        started: Mutex<u64>,
        finished: Mutex<Vec<(u64, RenderState)>>,
    }

    impl Recorder {
        fn finished(&self) -> Vec<(u64, RenderState)> {
            self.finished.lock().unwrap().clone()
        }
    }

    impl CycleObserver for Recorder {
        fn cycle_started(&self) -> u64 {
            let mut started = self.started.lock().unwrap();
            *started += 1;
            *started
        }

        fn cycle_finished(&self, ticket: u64, state: RenderState) {
            self.finished.lock().unwrap().push((ticket, state));
        }
    }

    fn keyed() -> WidgetConfig {
        WidgetConfig::from_attributes(Some("KEY"), Some("Paris"), None, None)
    }

    fn ok_transport() -> Arc<CannedTransport> {
        Arc::new(CannedTransport::respond(200, &success_body("Paris", "Clear", 12.0)))
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(transport.calls(), 1);
        let finished = recorder.finished();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].1.snapshot().is_some());

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn one_interval_means_one_more_cycle() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(transport.calls(), 2);
        assert_eq!(recorder.finished().len(), 2);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_tick_stops_refresh() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_active());
        handle.cancel();

        tokio::time::sleep(REFRESH_INTERVAL * 3).await;
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        drop(scheduler.start(keyed(), recorder.clone()));
        tokio::time::sleep(REFRESH_INTERVAL * 2).await;

        // The immediate cycle still fetches but its result is dropped.
        assert_eq!(transport.calls(), 1);
        assert!(recorder.finished().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_key_reports_once_then_skips_ticks() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(WidgetConfig::default(), recorder.clone());
        tokio::time::sleep(REFRESH_INTERVAL * 3 + Duration::from_secs(1)).await;

        assert_eq!(transport.calls(), 0);
        let finished = recorder.finished();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].1.error().is_some_and(|e| e.is_missing_key));
        assert_eq!(*recorder.started.lock().unwrap(), 1);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_is_honoured() {
        let transport = ok_transport();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::with_interval(transport.clone(), Duration::from_secs(60));
        assert_eq!(scheduler.interval(), Duration::from_secs(60));

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(Duration::from_secs(60 * 3 + 1)).await;

        assert_eq!(transport.calls(), 4);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_is_dropped_after_cancel() {
        let transport = Arc::new(GatedTransport::default());
        let release = transport.gate();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.calls(), 1);

        handle.cancel();
        release
            .send(RawResponse { status: 200, body: success_body("Paris", "Rain", 3.0) })
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(recorder.finished().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_does_not_hold_back_next_tick() {
        let transport = Arc::new(GatedTransport::default());
        let _stuck = transport.gate();
        let release_second = transport.gate();
        let recorder = Arc::new(Recorder::default());
        let scheduler = RefreshScheduler::new(transport.clone());

        let handle = scheduler.start(keyed(), recorder.clone());
        tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(transport.calls(), 2);

        release_second
            .send(RawResponse { status: 404, body: r#"{"cod":"404"}"#.into() })
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let finished = recorder.finished();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].0, 2);
        assert!(finished[0].1.error().is_some_and(|e| e.message.contains("Paris")));

        handle.cancel();
    }

    #[test]
    fn zero_interval_uses_default() {
        let scheduler = RefreshScheduler::with_interval(ok_transport(), Duration::ZERO);
        assert_eq!(scheduler.interval(), REFRESH_INTERVAL);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn nothing_is_delivered_once_cancel_returns() {
        let transport = ok_transport();
        let scheduler = RefreshScheduler::new(transport);

        for _ in 0..300 {
            let counter = Arc::new(Counter::default());
            let handle = scheduler.start(keyed(), counter.clone());
            tokio::task::yield_now().await;

            handle.cancel();
            let delivered = counter.0.load(std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1)).await;

            assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), delivered);
        }
    }
}
