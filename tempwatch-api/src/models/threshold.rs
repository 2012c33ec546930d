use serde::{Deserialize, Serialize};

/// Smallest allowed distance between the lower and upper threshold (Celsius)
pub const MIN_GAP: f32 = 2.0;
/// Lowest accepted threshold value (Celsius)
pub const MIN_TEMPERATURE: f32 = -50.0;
/// Highest accepted threshold value (Celsius)
pub const MAX_TEMPERATURE: f32 = 100.0;

/// Temperature band outside of which alerts are raised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Lower bound in Celsius
    pub lower: f32,
    /// Upper bound in Celsius
    pub upper: f32,
}

impl ThresholdConfig {
    pub fn new(lower: f32, upper: f32) -> Result<Self, ThresholdError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(ThresholdError::NotFinite);
        }

        let in_range = |value: f32| (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value);
        if !in_range(lower) || !in_range(upper) {
            return Err(ThresholdError::OutOfRange { lower, upper });
        }

        if upper - lower < MIN_GAP {
            return Err(ThresholdError::GapTooSmall { lower, upper });
        }

        Ok(Self { lower, upper })
    }

    pub fn contains(&self, temperature: f32) -> bool {
        (self.lower..=self.upper).contains(&temperature)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            lower: 20.0,
            upper: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdError {
    /// Upper bound is not at least `MIN_GAP` above the lower bound
    GapTooSmall { lower: f32, upper: f32 },
    /// A bound lies outside the supported physical range
    OutOfRange { lower: f32, upper: f32 },
    /// A bound is NaN or infinite
    NotFinite,
}

impl core::fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ThresholdError::GapTooSmall { lower, upper } => write!(
                f,
                "Minimum difference between thresholds must be {MIN_GAP}°C (got {lower}..{upper})"
            ),
            ThresholdError::OutOfRange { lower, upper } => write!(
                f,
                "Temperature thresholds must be between {MIN_TEMPERATURE}°C and {MAX_TEMPERATURE}°C (got {lower}..{upper})"
            ),
            ThresholdError::NotFinite => write!(f, "Temperature thresholds must be finite numbers"),
        }
    }
}

impl std::error::Error for ThresholdError {}
