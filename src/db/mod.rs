use crate::error::Result;

#[cfg(target_arch = "wasm32")]
use crate::error::PlayerError;
#[cfg(target_arch = "wasm32")]
use crate::utils::js_error_text;
#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};

const LAST_PLAYED_TRACK_KEY: &str = "lastPlayedTrack";
const LAST_PLAYED_TIME_KEY: &str = "lastPlayedTime";

/// String key-value storage the player persists its position into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Keys the resume position is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub track: String,
    pub time: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            track: LAST_PLAYED_TRACK_KEY.to_string(),
            time: LAST_PLAYED_TIME_KEY.to_string(),
        }
    }
}

/// Last played track and position, for resuming
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PersistedState {
    pub last_played_track: usize,
    pub last_played_time: f64, // seconds
}

impl PersistedState {
    /// Reads the stored position. `None` when no usable track index is stored.
    pub fn load(store: &impl KeyValueStore, keys: &StorageKeys) -> Option<Self> {
        let last_played_track = store
            .get(&keys.track)
            .and_then(|raw| raw.trim().parse::<usize>().ok())?;
        let last_played_time = store
            .get(&keys.time)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|time| time.is_finite() && *time >= 0.0)
            .unwrap_or(0.0);

        Some(Self {
            last_played_track,
            last_played_time,
        })
    }

    /// Writes both values as plain strings, track first.
    pub fn save(&self, store: &mut impl KeyValueStore, keys: &StorageKeys) -> Result<()> {
        store.set(&keys.track, &self.last_played_track.to_string())?;
        store.set(&keys.time, &self.last_played_time.to_string())
    }
}

/// `localStorage`, accessed raw so values stay unquoted.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| PlayerError::Storage {
                key: key.to_string(),
                message: js_error_text(&err),
            })
    }
}
