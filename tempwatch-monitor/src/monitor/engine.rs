use tempwatch_api::models::{AlertKind, AlertSnapshot, MonitorEvent, Reading, ThresholdConfig};

use crate::settings;
use crate::store::AlertStore;

const MINUTE_MS: i64 = 60 * 1000;

/// Tunables for staleness and alert suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// Readings older than this are stale (milliseconds)
    pub stale_after_ms: i64,
    /// Minimum time between two alerts for similar readings (milliseconds)
    pub cooldown_ms: i64,
    /// Temperature change that bypasses the cooldown (Celsius)
    pub temperature_delta: f32,
    /// Humidity change that bypasses the cooldown (percentage points)
    pub humidity_delta: f32,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            stale_after_ms: 15 * MINUTE_MS,
            cooldown_ms: 30 * MINUTE_MS,
            temperature_delta: 2.0,
            humidity_delta: 5.0,
        }
    }
}

impl From<&settings::Monitor> for AlertPolicy {
    fn from(monitor: &settings::Monitor) -> Self {
        Self {
            stale_after_ms: secs_to_ms(monitor.stale_after_secs),
            cooldown_ms: secs_to_ms(monitor.cooldown_secs),
            temperature_delta: monitor.temperature_delta,
            humidity_delta: monitor.humidity_delta,
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

impl AlertPolicy {
    /// Untimed readings count as stale.
    pub fn is_stale(&self, reading: &Reading, now_ms: i64) -> bool {
        match reading.age_ms(now_ms) {
            Some(age) => age > self.stale_after_ms,
            None => true,
        }
    }

    pub fn should_send_alert(
        &self,
        last: Option<&AlertSnapshot>,
        temperature: f32,
        humidity: f32,
        now_ms: i64,
    ) -> bool {
        let Some(last) = last else {
            return true;
        };

        now_ms.saturating_sub(last.fired_at_ms) > self.cooldown_ms
            || (temperature - last.temperature).abs() > self.temperature_delta
            || (humidity - last.humidity).abs() > self.humidity_delta
    }
}

/// Hysteresis latches, one per threshold direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub below_low: bool,
    pub above_high: bool,
}

impl MonitorState {
    /// Returns the crossing that may raise an alert, updating the latches.
    pub fn evaluate(&mut self, temperature: f32, thresholds: &ThresholdConfig) -> Option<AlertKind> {
        if !self.above_high && temperature > thresholds.upper {
            self.above_high = true;
            self.below_low = false;
            Some(AlertKind::High)
        } else if !self.below_low && temperature < thresholds.lower {
            self.below_low = true;
            self.above_high = false;
            Some(AlertKind::Low)
        } else {
            if thresholds.contains(temperature) {
                self.below_low = false;
                self.above_high = false;
            }
            None
        }
    }
}

/// Decides which events a check cycle produces.
///
/// The engine is synchronous; the async [`Monitor`](super::Monitor) feeds it
/// connectivity and fetch outcomes and delivers the returned events.
#[derive(Debug, Default)]
pub struct AlertEngine {
    policy: AlertPolicy,
    state: MonitorState,
}

impl AlertEngine {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            state: MonitorState::default(),
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Handles the connectivity probe result, returning whether the cycle should fetch.
    pub fn on_connectivity(
        &self,
        available: bool,
        store: &AlertStore,
        events: &mut Vec<MonitorEvent>,
    ) -> bool {
        if !available {
            tracing::debug!("no network available");
            if !store.is_network_lost_notified() {
                events.push(MonitorEvent::NetworkLost);
                store.set_network_lost_notified(true);
            }
            return false;
        }

        if store.is_network_lost_notified() {
            events.push(MonitorEvent::NetworkRestored);
            store.set_network_lost_notified(false);
        }

        true
    }

    /// Handles the latest reading, or its absence.
    pub fn on_reading(
        &mut self,
        reading: Option<Reading>,
        now_ms: i64,
        store: &AlertStore,
        events: &mut Vec<MonitorEvent>,
    ) {
        let Some(reading) = reading else {
            tracing::debug!("sensor store holds no reading");
            events.push(MonitorEvent::no_data());
            self.update_staleness(true, store, events);
            return;
        };

        if reading.timestamp_ms.is_none() {
            tracing::warn!("reading without usable timestamp, treating as stale");
        }
        let stale = self.policy.is_stale(&reading, now_ms);
        self.update_staleness(stale, store, events);

        let Reading {
            temperature,
            humidity,
            ..
        } = reading;
        let thresholds = store.thresholds();

        if let Some(kind) = self.state.evaluate(temperature, &thresholds) {
            let last = store.last_alert();
            if self
                .policy
                .should_send_alert(last.as_ref(), temperature, humidity, now_ms)
            {
                events.push(MonitorEvent::Alert {
                    temperature,
                    humidity,
                    kind,
                });
                store.set_last_alert(temperature, humidity);
            } else {
                tracing::debug!(
                    "{:?} alert at {}°C suppressed by cooldown",
                    kind,
                    temperature
                );
            }
        }

        events.push(MonitorEvent::TemperatureUpdate {
            temperature,
            humidity,
        });
    }

    fn update_staleness(&self, stale: bool, store: &AlertStore, events: &mut Vec<MonitorEvent>) {
        let notified = store.is_data_stale_notified();

        if stale && !notified {
            events.push(MonitorEvent::StaleData);
            store.set_data_stale_notified(true);
        } else if !stale && notified {
            events.push(MonitorEvent::FreshData);
            store.set_data_stale_notified(false);
        }
    }
}
