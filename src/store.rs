//! Persistence of the last selection: timestamped JSON records with a
//! per-key time-to-live, on top of a plain string key-value backend.
//!
//! Two keys are used by the explorer:
//! - [`PROFILE_KEY`]: `{ profile fields..., "savedAt": RFC 3339 }`, valid for
//!   [`PROFILE_TTL_DAYS`] days.
//! - [`SELECTED_CODE_KEY`]: the bare country code, no expiry.
//!
//! Unreadable or undecodable records are evicted and reported as absent.

use crate::error::ExplorerError;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const SELECTED_CODE_KEY: &str = "selected-country-code";
pub const PROFILE_KEY: &str = "selected-country-profile";
pub const PROFILE_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Durable string key-value storage.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map().remove(key);
        Ok(())
    }
}

/// One file per key (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// The directory is created lazily on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let ok = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !ok {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Source of "now" for record timestamps and expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Stored form of a value: its own fields plus `savedAt`.
///
/// `T` must serialize as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Outcome of reading a timestamped record.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh(T),
    /// Older than its TTL; the key has been removed.
    Expired,
    Missing,
    /// Undecodable; the key has been removed.
    Corrupt,
}

impl<T> Lookup<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) => Some(v),
            _ => None,
        }
    }
}

/// Timestamped key-value store with per-key expiry.
pub struct PersistenceStore {
    backend: Box<dyn KeyValueBackend>,
    clock: Arc<dyn Clock>,
    ttls: HashMap<String, Duration>,
}

impl std::fmt::Debug for PersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceStore")
            .field("ttls", &self.ttls)
            .finish_non_exhaustive()
    }
}

impl PersistenceStore {
    /// Store with the explorer's key classes: profiles expire after
    /// [`PROFILE_TTL_DAYS`], everything else never does.
    pub fn new(backend: Box<dyn KeyValueBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            ttls: HashMap::new(),
        }
        .with_ttl(PROFILE_KEY, Duration::days(PROFILE_TTL_DAYS))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), Arc::new(SystemClock))
    }

    pub fn with_ttl(mut self, key: &str, ttl: Duration) -> Self {
        self.ttls.insert(key.to_string(), ttl);
        self
    }

    pub fn ttl_for(&self, key: &str) -> Option<Duration> {
        self.ttls.get(key).copied()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Store `value` stamped with the current time.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let record = PersistedRecord {
            value,
            saved_at: self.clock.now(),
        };
        let json = serde_json::to_string(&record)?;
        self.backend.set(key, &json)
    }

    /// The value under `key` if it is still within its TTL.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).fresh()
    }

    /// Read `key`, evicting it when expired or corrupt.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Missing,
            Err(e) => {
                log::warn!("error reading {key:?} from storage: {e}");
                self.evict(key);
                return Lookup::Corrupt;
            }
        };
        let record: PersistedRecord<T> = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                let err = ExplorerError::StorageCorruption {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                log::warn!("{err}; evicting");
                self.evict(key);
                return Lookup::Corrupt;
            }
        };
        if let Some(ttl) = self.ttl_for(key)
            && self.clock.now() - record.saved_at >= ttl
        {
            log::info!("record {key:?} saved at {} has expired", record.saved_at);
            self.evict(key);
            return Lookup::Expired;
        }
        Lookup::Fresh(record.value)
    }

    /// Delete `key` unconditionally.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }

    /// Store a bare string without timestamp (e.g. the selected code).
    pub fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.backend.set(key, value)
    }

    /// Read a bare string; backend errors read as absent.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("error reading {key:?} from storage: {e}");
                None
            }
        }
    }

    fn evict(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            log::warn!("error evicting {key:?}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CountryProfile;
    use chrono::TimeZone;

    fn profile() -> CountryProfile {
        CountryProfile {
            name: "Germany".into(),
            capital: "Berlin".into(),
            region: "Europe & Central Asia".into(),
            income_level: "High income".into(),
            longitude: "13.4115".into(),
            latitude: "52.5235".into(),
        }
    }

    fn store_at(clock: Arc<ManualClock>) -> PersistenceStore {
        PersistenceStore::new(Box::new(MemoryBackend::new()), clock)
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn save_then_load_within_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = store_at(clock.clone());
        store.save(PROFILE_KEY, &profile()).unwrap();
        clock.advance(Duration::days(6));
        assert_eq!(store.load::<CountryProfile>(PROFILE_KEY), Some(profile()));
    }

    #[test]
    fn expired_record_is_evicted() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = store_at(clock.clone());
        store.save(PROFILE_KEY, &profile()).unwrap();
        clock.advance(Duration::days(7));
        assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Expired);
        assert_eq!(store.get_raw(PROFILE_KEY), None);
    }

    #[test]
    fn persisted_layout_is_flat_with_saved_at() {
        let store = store_at(Arc::new(ManualClock::new(start())));
        store.save(PROFILE_KEY, &profile()).unwrap();
        let raw = store.get_raw(PROFILE_KEY).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["name"], "Germany");
        assert_eq!(v["incomeLevel"], "High income");
        assert_eq!(v["savedAt"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn corrupt_record_is_absent_and_evicted() {
        let store = PersistenceStore::in_memory();
        store.set_raw(PROFILE_KEY, "{not json").unwrap();
        assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Corrupt);
        assert_eq!(store.get_raw(PROFILE_KEY), None);

        store.set_raw(PROFILE_KEY, r#"{"name":"x"}"#).unwrap();
        assert_eq!(store.load::<CountryProfile>(PROFILE_KEY), None);
        assert_eq!(store.get_raw(PROFILE_KEY), None);
    }

    #[test]
    fn keys_without_ttl_never_expire() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = store_at(clock.clone());
        store.save("other", &profile()).unwrap();
        clock.advance(Duration::days(365));
        assert!(store.load::<CountryProfile>("other").is_some());
    }

    #[test]
    fn file_backend_rejects_path_like_keys() {
        let b = FileBackend::new(std::env::temp_dir());
        assert!(matches!(b.set("../x", "v"), Err(StoreError::InvalidKey(_))));
    }
}
