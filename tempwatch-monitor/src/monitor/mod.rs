mod engine;

pub use engine::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tempwatch_api::models::MonitorEvent;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::errors::{MonitorError, SourceError};
use crate::services::{Clock, ConnectivityProbe, EventSink, ReadingSource};
use crate::settings::Settings;
use crate::store::AlertStore;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Time between two check cycles
    pub interval: Duration,
    /// Upper bound for a single fetch
    pub fetch_timeout: Duration,
    pub policy: AlertPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(10),
            policy: AlertPolicy::default(),
        }
    }
}

impl From<&Settings> for MonitorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            interval: settings.monitor.interval(),
            fetch_timeout: settings.source.fetch_timeout(),
            policy: AlertPolicy::from(&settings.monitor),
        }
    }
}

/// Periodically checks the sensor store and reports to an [`EventSink`].
///
/// Cloning yields another handle to the same monitor.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn ReadingSource>,
    probe: Arc<dyn ConnectivityProbe>,
    sink: Arc<dyn EventSink>,
    store: Arc<AlertStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    fetch_timeout: Duration,
    engine: tokio::sync::Mutex<AlertEngine>,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        store: Arc<AlertStore>,
        source: Arc<dyn ReadingSource>,
        probe: Arc<dyn ConnectivityProbe>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if config.interval < MIN_INTERVAL {
            tracing::warn!(
                "check interval {:?} raised to {:?}",
                config.interval,
                MIN_INTERVAL
            );
        }

        Self {
            inner: Arc::new(Inner {
                source,
                probe,
                sink,
                store,
                clock,
                interval: config.interval.max(MIN_INTERVAL),
                fetch_timeout: config.fetch_timeout,
                engine: tokio::sync::Mutex::new(AlertEngine::new(config.policy)),
                running: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.inner.store
    }

    pub fn status(&self) -> MonitorStatus {
        let task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);

        if task.is_some() {
            MonitorStatus::Running
        } else {
            MonitorStatus::Stopped
        }
    }

    /// Begins checking immediately and then once per interval.
    ///
    /// Starting a running monitor does nothing.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return Ok(());
        }

        let handle = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        self.inner.running.store(true, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        *task = Some(handle.spawn(inner.run()));

        tracing::info!("monitor started, checking every {:?}", self.inner.interval);

        Ok(())
    }

    /// Cancels the check loop. No event is emitted once this returns.
    pub async fn stop(&self) {
        let task = {
            let mut task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
            // Flag and handle change under the same guard as in `start`
            self.inner.running.store(false, Ordering::SeqCst);
            task.take()
        };

        let Some(task) = task else {
            return;
        };

        task.abort();
        if let Err(e) = task.await {
            if e.is_panic() {
                tracing::error!("check loop panicked: {}", e);
            }
        }

        // A cycle started through `check_now` may still hold the state lock
        drop(self.inner.engine.lock().await);

        tracing::info!("monitor stopped");
    }

    /// Runs one check cycle right away. Does nothing while stopped.
    pub async fn check_now(&self) {
        self.inner.check().await;
    }
}

impl Inner {
    async fn run(self: Arc<Self>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.check().await;
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn check(&self) {
        if !self.is_running() {
            return;
        }

        let available = self.probe.is_available().await;

        {
            let engine = self.engine.lock().await;
            if !self.is_running() {
                return;
            }

            let mut events = Vec::new();
            let proceed = engine.on_connectivity(available, &self.store, &mut events);
            self.emit(&events);

            if !proceed {
                return;
            }
        }

        let reading = match time::timeout(self.fetch_timeout, self.source.fetch_latest()).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                tracing::error!("error fetching data: {}", e);
                return;
            }
            Err(_) => {
                tracing::error!("error fetching data: {}", SourceError::Timeout(self.fetch_timeout));
                return;
            }
        };

        let now_ms = self.clock.now_ms();
        let mut engine = self.engine.lock().await;
        if !self.is_running() {
            return;
        }

        let mut events = Vec::new();
        engine.on_reading(reading, now_ms, &self.store, &mut events);
        self.emit(&events);
    }

    fn emit(&self, events: &[MonitorEvent]) {
        for event in events {
            tracing::debug!("emit {:?}", event);
            self.sink.emit(event);
        }
    }
}
