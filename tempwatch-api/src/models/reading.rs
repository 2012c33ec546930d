use serde::{Deserialize, Serialize};

/// Latest sample reported by the sensor store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity percentage
    pub humidity: f32,
    /// Collection time in epoch milliseconds, `None` if the raw value was unusable
    pub timestamp_ms: Option<i64>,
}

impl Reading {
    pub fn new(temperature: f32, humidity: f32, timestamp_ms: i64) -> Self {
        Self {
            temperature,
            humidity,
            timestamp_ms: Some(timestamp_ms),
        }
    }

    /// Reading whose timestamp could not be normalized at the source boundary.
    pub fn untimed(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            timestamp_ms: None,
        }
    }

    /// Milliseconds elapsed between collection and `now_ms`.
    ///
    /// Negative when the sensor clock runs ahead of ours.
    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        self.timestamp_ms.map(|ts| now_ms.saturating_sub(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_of_timed_and_untimed_readings() {
        let reading = Reading::new(21.5, 40.0, 1_000);
        assert_eq!(reading.age_ms(61_000), Some(60_000));
        assert_eq!(reading.age_ms(500), Some(-500));

        assert_eq!(Reading::untimed(21.5, 40.0).age_ms(61_000), None);
    }
}
