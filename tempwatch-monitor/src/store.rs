use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tempwatch_api::models::{AlertSnapshot, ThresholdConfig, ThresholdError};

use crate::errors::StoreError;
use crate::services::Clock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StoredState {
    thresholds: ThresholdConfig,
    last_alert: Option<AlertSnapshot>,
    network_lost_notified: bool,
    data_stale_notified: bool,
}

/// Thresholds, last alert and notification flags shared by the monitor and its host.
///
/// Every mutation is mirrored to the backing file when one is configured.
/// The mirror is written with blocking `std::fs` calls while the state lock is
/// held, so a slow disk delays the caller of every setter.
pub struct AlertStore {
    state: RwLock<StoredState>,
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl AlertStore {
    pub fn in_memory(defaults: ThresholdConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(StoredState {
                thresholds: defaults,
                ..StoredState::default()
            }),
            path: None,
            clock,
        }
    }

    /// Opens the store file, starting from `defaults` when it is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>, defaults: ThresholdConfig, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();

        let state = match Self::load(&path) {
            Ok(Some(mut state)) => {
                let ThresholdConfig { lower, upper } = state.thresholds;
                if let Err(e) = ThresholdConfig::new(lower, upper) {
                    tracing::warn!("stored thresholds rejected, using defaults: {}", e);
                    state.thresholds = defaults;
                }
                tracing::debug!("loaded store from {}", path.display());
                state
            }
            Ok(None) => StoredState {
                thresholds: defaults,
                ..StoredState::default()
            },
            Err(e) => {
                tracing::warn!("failed to load store {}, using defaults: {}", path.display(), e);
                StoredState {
                    thresholds: defaults,
                    ..StoredState::default()
                }
            }
        };

        Self {
            state: RwLock::new(state),
            path: Some(path),
            clock,
        }
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.read(|state| state.thresholds)
    }

    /// Replaces both thresholds, leaving the previous pair untouched on rejection.
    pub fn set_thresholds(&self, lower: f32, upper: f32) -> Result<(), ThresholdError> {
        let thresholds = ThresholdConfig::new(lower, upper)?;
        self.update(|state| state.thresholds = thresholds);

        tracing::info!("thresholds set to {}..{}", lower, upper);

        Ok(())
    }

    pub fn last_alert(&self) -> Option<AlertSnapshot> {
        self.read(|state| state.last_alert)
    }

    pub fn set_last_alert(&self, temperature: f32, humidity: f32) {
        let snapshot = AlertSnapshot {
            temperature,
            humidity,
            fired_at_ms: self.clock.now_ms(),
        };

        self.update(|state| state.last_alert = Some(snapshot));
    }

    pub fn clear_last_alert(&self) {
        self.update(|state| state.last_alert = None);
    }

    pub fn is_network_lost_notified(&self) -> bool {
        self.read(|state| state.network_lost_notified)
    }

    pub fn set_network_lost_notified(&self, notified: bool) {
        self.update(|state| state.network_lost_notified = notified);
    }

    pub fn is_data_stale_notified(&self) -> bool {
        self.read(|state| state.data_stale_notified)
    }

    pub fn set_data_stale_notified(&self, notified: bool) {
        self.update(|state| state.data_stale_notified = notified);
    }

    fn read<T>(&self, f: impl FnOnce(&StoredState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update(&self, f: impl FnOnce(&mut StoredState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);

        if let Some(path) = &self.path {
            // Memory stays authoritative when the mirror cannot be written
            if let Err(e) = Self::persist(path, &state) {
                tracing::warn!("failed to persist store {}: {}", path.display(), e);
            }
        }
    }

    fn load(path: &Path) -> Result<Option<StoredState>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(path: &Path, state: &StoredState) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
