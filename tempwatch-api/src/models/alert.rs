use serde::{Deserialize, Serialize};

/// Direction of a threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Temperature fell below the lower threshold
    Low,
    /// Temperature rose above the upper threshold
    High,
}

impl AlertKind {
    pub fn is_low(&self) -> bool {
        matches!(self, AlertKind::Low)
    }
}

/// Values of the most recently emitted alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    /// Alerted temperature in Celsius
    pub temperature: f32,
    /// Alerted humidity percentage
    pub humidity: f32,
    /// Emission time in epoch milliseconds
    pub fired_at_ms: i64,
}
