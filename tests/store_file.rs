use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::tempdir;
use wbmap_rs::CountryProfile;
use wbmap_rs::store::{
    FileBackend, KeyValueBackend, Lookup, ManualClock, PROFILE_KEY, SELECTED_CODE_KEY,
};
use wbmap_rs::PersistenceStore;

fn sample() -> CountryProfile {
    CountryProfile {
        name: "Germany".into(),
        capital: "Berlin".into(),
        region: "Europe & Central Asia".into(),
        income_level: "High income".into(),
        longitude: "13.4115".into(),
        latitude: "52.5235".into(),
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    ))
}

#[test]
fn selection_survives_a_new_store_on_same_dir() {
    let dir = tempdir().unwrap();
    let clock = clock();
    {
        let store = PersistenceStore::new(Box::new(FileBackend::new(dir.path())), clock.clone());
        store.save(PROFILE_KEY, &sample()).unwrap();
        store.set_raw(SELECTED_CODE_KEY, "de").unwrap();
    }
    let store = PersistenceStore::new(Box::new(FileBackend::new(dir.path())), clock);
    assert_eq!(store.get_raw(SELECTED_CODE_KEY).as_deref(), Some("de"));
    assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Fresh(sample()));
}

#[test]
fn persisted_profile_is_flat_camel_case_with_saved_at() {
    let dir = tempdir().unwrap();
    let store = PersistenceStore::new(Box::new(FileBackend::new(dir.path())), clock());
    store.save(PROFILE_KEY, &sample()).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(format!("{PROFILE_KEY}.json"))).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["name"], "Germany");
    assert_eq!(v["incomeLevel"], "High income");
    assert!(v["savedAt"].as_str().unwrap().starts_with("2025-01-01T12:00:00"));
}

#[test]
fn expired_profile_file_is_deleted() {
    let dir = tempdir().unwrap();
    let clock = clock();
    let store = PersistenceStore::new(Box::new(FileBackend::new(dir.path())), clock.clone());
    store.save(PROFILE_KEY, &sample()).unwrap();

    clock.advance(Duration::days(6));
    assert!(store.load::<CountryProfile>(PROFILE_KEY).is_some());

    clock.advance(Duration::days(1));
    assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Expired);
    assert!(!dir.path().join(format!("{PROFILE_KEY}.json")).exists());
    assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Missing);
}

#[test]
fn corrupt_profile_file_is_evicted() {
    let dir = tempdir().unwrap();
    let backend = FileBackend::new(dir.path());
    backend.set(PROFILE_KEY, "{ not json").unwrap();
    let store = PersistenceStore::new(Box::new(backend), clock());

    assert_eq!(store.lookup::<CountryProfile>(PROFILE_KEY), Lookup::Corrupt);
    assert_eq!(store.get_raw(PROFILE_KEY), None);
}

#[test]
fn file_backend_rejects_path_like_keys() {
    let dir = tempdir().unwrap();
    let backend = FileBackend::new(dir.path());
    assert!(backend.set("../escape", "x").is_err());
    assert!(backend.set("a/b", "x").is_err());
    assert_eq!(backend.get("never-written").unwrap(), None);
    backend.remove("never-written").unwrap();
}
