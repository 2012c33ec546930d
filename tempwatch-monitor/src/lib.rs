use std::error::Error;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::monitor::{Monitor, MonitorConfig};
use crate::services::{ChannelSink, Clock, EventSink, LogSink, RealtimeDbSource, SystemClock, TcpProbe};
use crate::settings::Settings;
use crate::store::AlertStore;

pub mod errors;
pub mod monitor;
pub mod services;
pub mod settings;
pub mod store;

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let defaults = settings.default_thresholds()?;

    let store = Arc::new(match &settings.store.path {
        Some(path) => AlertStore::open(path, defaults, clock.clone()),
        None => AlertStore::in_memory(defaults, clock.clone()),
    });

    let source = RealtimeDbSource::new(&settings.source)?;
    let probe = TcpProbe::for_url(&settings.source.base_url, settings.probe.timeout())?;
    tracing::info!("watching {}", source.url());

    let sink = ChannelSink::new(64);
    let mut receiver = sink.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => LogSink.emit(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("notification listener lagged, {} events skipped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let monitor = Monitor::new(
        MonitorConfig::from(settings.as_ref()),
        store,
        Arc::new(source),
        Arc::new(probe),
        Arc::new(sink),
        clock,
    );
    monitor.start()?;

    tokio::signal::ctrl_c().await?;
    monitor.stop().await;

    Ok(())
}
