use core::fmt;

use serde::{Deserialize, Serialize};

use super::AlertKind;

/// Everything the monitor reports to its sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Temperature crossed a threshold
    Alert {
        temperature: f32,
        humidity: f32,
        kind: AlertKind,
    },
    /// Latest values, zeroed when the store holds no reading
    TemperatureUpdate { temperature: f32, humidity: f32 },
    NetworkLost,
    NetworkRestored,
    /// Latest reading is too old or missing
    StaleData,
    FreshData,
}

impl MonitorEvent {
    pub fn no_data() -> Self {
        MonitorEvent::TemperatureUpdate {
            temperature: 0.0,
            humidity: 0.0,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            MonitorEvent::TemperatureUpdate { temperature, humidity }
                if *temperature == 0.0 && *humidity == 0.0
        )
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Alert {
                temperature,
                humidity,
                kind,
            } => {
                let label = if kind.is_low() { "Low" } else { "High" };
                write!(
                    f,
                    "{label} Temperature: {temperature:.1}°C, Humidity: {humidity:.1}%"
                )
            }
            event @ MonitorEvent::TemperatureUpdate { .. } if event.is_no_data() => {
                write!(f, "No data available")
            }
            MonitorEvent::TemperatureUpdate {
                temperature,
                humidity,
            } => write!(f, "Temperature: {temperature:.1}°C, Humidity: {humidity:.1}%"),
            MonitorEvent::NetworkLost => write!(f, "Network connection lost"),
            MonitorEvent::NetworkRestored => write!(f, "Network connection restored"),
            MonitorEvent::StaleData => write!(f, "Sensor data is stale"),
            MonitorEvent::FreshData => write!(f, "Sensor data is fresh again"),
        }
    }
}
