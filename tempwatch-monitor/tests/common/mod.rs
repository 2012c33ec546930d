use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempwatch_api::models::{MonitorEvent, Reading, ThresholdConfig};
use tempwatch_monitor::errors::SourceError;
use tempwatch_monitor::monitor::{Monitor, MonitorConfig};
use tempwatch_monitor::services::{Clock, ConnectivityProbe, EventSink, ReadingSource};
use tempwatch_monitor::store::AlertStore;

pub const INTERVAL: Duration = Duration::from_secs(60);

pub enum Step {
    Reply(Result<Option<Reading>, SourceError>),
    Hang,
}

/// Replays queued replies, then repeats the fallback reading.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    fallback: Mutex<Option<Reading>>,
}

impl ScriptedSource {
    pub fn new(fallback: Option<Reading>) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
        }
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn set_fallback(&self, reading: Option<Reading>) {
        *self.fallback.lock().unwrap() = reading;
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch_latest(&self) -> Result<Option<Reading>, SourceError> {
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(*self.fallback.lock().unwrap()),
        }
    }
}

pub struct SwitchProbe {
    available: AtomicBool,
    calls: AtomicUsize,
}

impl SwitchProbe {
    pub fn set(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for SwitchProbe {
    fn default() -> Self {
        Self {
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for SwitchProbe {
    async fn is_available(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<MonitorEvent>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, expected: &MonitorEvent) -> usize {
        self.0.lock().unwrap().iter().filter(|event| *event == expected).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &MonitorEvent) {
        self.0.lock().unwrap().push(*event);
    }
}

#[derive(Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct MockMonitor {
    pub monitor: Monitor,
    pub source: Arc<ScriptedSource>,
    pub probe: Arc<SwitchProbe>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl MockMonitor {
    pub fn new(fallback: Option<Reading>) -> Self {
        let sink = Arc::new(RecordingSink::default());
        let (monitor, source, probe, clock) = build(fallback, sink.clone());

        Self {
            monitor,
            source,
            probe,
            sink,
            clock,
        }
    }
}

/// Builds a monitor around the scripted fakes and an arbitrary sink.
pub fn build(
    fallback: Option<Reading>,
    sink: Arc<dyn EventSink>,
) -> (Monitor, Arc<ScriptedSource>, Arc<SwitchProbe>, Arc<ManualClock>) {
    let source = Arc::new(ScriptedSource::new(fallback));
    let probe = Arc::new(SwitchProbe::default());
    let clock = Arc::new(ManualClock::default());

    let store = Arc::new(AlertStore::in_memory(
        ThresholdConfig::new(18.0, 25.0).unwrap(),
        clock.clone(),
    ));

    let config = MonitorConfig {
        interval: INTERVAL,
        ..MonitorConfig::default()
    };

    let monitor = Monitor::new(
        config,
        store,
        source.clone(),
        probe.clone(),
        sink,
        clock.clone(),
    );

    (monitor, source, probe, clock)
}

/// Lets the monitor task run whatever is due without reaching the next tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Advances paused time past exactly one more tick.
pub async fn next_cycle() {
    tokio::time::sleep(INTERVAL).await;
}

pub fn fresh(temperature: f32, humidity: f32) -> Option<Reading> {
    Some(Reading::new(temperature, humidity, 0))
}
