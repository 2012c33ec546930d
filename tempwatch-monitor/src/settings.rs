use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use tempwatch_api::models::ThresholdConfig;
use tempwatch_api::timestamp::TimestampUnit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub base_url: String,
    pub path: String,
    pub auth_token: Option<String>,
    #[serde(default)]
    pub timestamp_unit: TimestampUnit,
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub interval_secs: u64,
    pub stale_after_secs: u64,
    pub cooldown_secs: u64,
    pub temperature_delta: f32,
    pub humidity_delta: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub lower: f32,
    pub upper: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub source: Source,
    pub probe: Probe,
    pub monitor: Monitor,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub store: Store,
}

impl Settings {
    /// Loads the embedded defaults, overlaid by the file named in `TEMPWATCH_CONFIG`.
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let overlay = match env::var("TEMPWATCH_CONFIG") {
            Ok(path) => Some(fs::read_to_string(path)?),
            Err(_) => None,
        };

        Self::from_sources(overlay.as_deref())
    }

    pub fn from_sources(overlay: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let mut table: toml::Table = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/configs/default.toml"
        )))?;

        if let Some(overlay) = overlay {
            Self::merge(&mut table, toml::from_str(overlay)?);
        }

        let mut settings: Settings = toml::Value::Table(table).try_into()?;

        settings.default_thresholds()?;

        if let Some(path) = &settings.store.path {
            let normalized = Self::normalize_path(path)?
                .to_string_lossy()
                .to_string();

            settings.store.path = Some(normalized);
        }

        Ok(settings)
    }

    pub fn default_thresholds(&self) -> Result<ThresholdConfig, Box<dyn Error>> {
        Ok(ThresholdConfig::new(self.thresholds.lower, self.thresholds.upper)?)
    }

    fn merge(base: &mut toml::Table, overlay: toml::Table) {
        for (key, value) in overlay {
            if let toml::Value::Table(right) = value {
                if let Some(toml::Value::Table(left)) = base.get_mut(&key) {
                    Self::merge(left, right);
                    continue;
                }
                base.insert(key, toml::Value::Table(right));
            } else {
                base.insert(key, value);
            }
        }
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf
        } else {
            env::current_dir()?.join(&path_buf)
        })
    }
}

impl Source {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Probe {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Monitor {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
