use tempwatch_api::models::MonitorEvent;
use tokio::sync::broadcast;

/// Receiver of monitor events, typically a notification or UI layer.
///
/// Called while the monitor holds its state lock, so implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MonitorEvent);
}

/// Publishes events on a broadcast channel.
#[derive(Clone)]
pub struct ChannelSink {
    sender: broadcast::Sender<MonitorEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &MonitorEvent) {
        if let Err(e) = self.sender.send(*event) {
            tracing::debug!("no subscriber for event: {}", e.0);
        }
    }
}

/// Writes the notification text of every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Alert { .. } => tracing::warn!("{}", event),
            MonitorEvent::TemperatureUpdate { .. } => tracing::debug!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempwatch_api::models::AlertKind;

    use super::*;

    #[tokio::test]
    async fn test_channel_sink_fans_out() {
        let sink = ChannelSink::new(8);
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        let alert = MonitorEvent::Alert {
            temperature: 30.0,
            humidity: 40.0,
            kind: AlertKind::High,
        };
        sink.emit(&alert);
        sink.emit(&MonitorEvent::NetworkLost);

        assert_eq!(first.recv().await.unwrap(), alert);
        assert_eq!(first.recv().await.unwrap(), MonitorEvent::NetworkLost);
        assert_eq!(second.recv().await.unwrap(), alert);
    }

    #[test]
    fn test_channel_sink_without_subscribers() {
        let sink = ChannelSink::new(1);
        sink.emit(&MonitorEvent::StaleData);
        LogSink.emit(&MonitorEvent::StaleData);
    }
}
