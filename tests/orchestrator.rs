mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{FakeSource, QueueSpawner, code, gdp_series, inline_orchestrator, profile};
use wbmap_rs::models::{DateSpec, IndicatorPoint, IndicatorSeries};
use wbmap_rs::orchestrator::{DataOrchestrator, IndicatorSettings, Status};
use wbmap_rs::store::{ManualClock, MemoryBackend, PROFILE_KEY, SELECTED_CODE_KEY};
use wbmap_rs::{CountryProfile, ExplorerError, PersistenceStore};

fn fr_source() -> Arc<FakeSource> {
    Arc::new(
        FakeSource::default()
            .with_profile("fr", "France")
            .with_series("fr", gdp_series("fr")),
    )
}

#[test]
fn success_persists_profile_and_publishes_chronological_chart() {
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(fr_source(), store.clone());

    orch.load_country_data(code("fr"));
    assert!(orch.state().is_loading());
    assert_eq!(orch.pump(), 2);

    let state = orch.state();
    assert_eq!(state.status, Status::Ready);
    assert_eq!(state.code, Some(code("fr")));
    assert_eq!(state.profile, Some(profile("France")));
    let chart = state.chart.as_ref().unwrap();
    let periods: Vec<_> = chart.points.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(periods, ["2021", "2022"]);
    assert!(chart.points.iter().all(|p| p.value.is_some()));

    assert_eq!(
        store.load::<CountryProfile>(PROFILE_KEY),
        Some(profile("France"))
    );
}

#[test]
fn profile_is_requested_before_indicator() {
    let source = fr_source();
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(source.clone(), store);

    orch.load_country_data(code("fr"));
    // the indicator job is only spawned once the profile is applied
    assert_eq!(source.calls(), ["profile:fr"]);
    orch.pump();
    assert_eq!(source.calls(), ["profile:fr", "indicator:fr:NY.GDP.MKTP.CD"]);
}

#[test]
fn indicator_window_covers_ten_years_to_current_year() {
    let source = fr_source();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
    ));
    let store = Arc::new(PersistenceStore::new(Box::new(MemoryBackend::new()), clock));
    let mut orch = inline_orchestrator(source.clone(), store);

    orch.load_country_data(code("fr"));
    orch.pump();
    assert_eq!(
        *source.windows.lock().unwrap(),
        [DateSpec::Range { start: 2016, end: 2025 }]
    );
}

#[test]
fn indicator_failure_keeps_profile_visible() {
    let source = Arc::new(FakeSource::default().with_profile("fr", "France"));
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(source, store);

    orch.load_country_data(code("fr"));
    orch.pump();
    let state = orch.state();
    assert_eq!(state.status, Status::Ready);
    assert_eq!(state.profile, Some(profile("France")));
    assert!(state.chart.is_none());
    assert!(state.error.is_none());
}

#[test]
fn all_null_series_publishes_no_chart() {
    let empty = IndicatorSeries {
        country: code("fr"),
        indicator_id: "NY.GDP.MKTP.CD".into(),
        indicator_name: "GDP (current US$)".into(),
        points: vec![
            IndicatorPoint { period: "2023".into(), value: None },
            IndicatorPoint { period: "2022".into(), value: None },
        ],
    };
    let source = Arc::new(
        FakeSource::default()
            .with_profile("fr", "France")
            .with_series("fr", empty),
    );
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(source, store);

    orch.load_country_data(code("fr"));
    orch.pump();
    assert_eq!(orch.state().status, Status::Ready);
    assert!(orch.state().chart.is_none());
}

#[test]
fn profile_failure_is_retryable_and_retry_replays_persisted_code() {
    let source = Arc::new(FakeSource::default());
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(source.clone(), store.clone());

    store.set_raw(SELECTED_CODE_KEY, "zz").unwrap();
    orch.load_country_data(code("zz"));
    orch.pump();

    let state = orch.state();
    assert_eq!(state.status, Status::Error);
    assert!(state.profile.is_none());
    let err = state.error.clone().unwrap();
    assert!(matches!(err, ExplorerError::ProfileFetchFailed { ref code, .. } if code.as_str() == "zz"));
    assert!(err.is_retryable());
    assert_eq!(store.get_raw(PROFILE_KEY), None);

    let token = orch.retry().unwrap();
    assert_eq!(token, orch.current_token());
    assert_eq!(source.calls(), ["profile:zz", "profile:zz"]);
}

#[test]
fn retry_without_persisted_code_does_nothing() {
    let source = Arc::new(FakeSource::default());
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(source.clone(), store);

    assert_eq!(orch.retry(), None);
    assert!(source.calls().is_empty());
    assert_eq!(orch.state().status, Status::Idle);
}

fn queued(source: Arc<FakeSource>) -> (DataOrchestrator, QueueSpawner) {
    let spawner = QueueSpawner::default();
    let orch = DataOrchestrator::new(
        source,
        Box::new(spawner.clone()),
        Arc::new(PersistenceStore::in_memory()),
        IndicatorSettings::default(),
    );
    (orch, spawner)
}

#[test]
fn late_result_for_previous_selection_is_discarded() {
    let source = Arc::new(
        FakeSource::default()
            .with_profile("us", "United States")
            .with_profile("fr", "France"),
    );
    let (mut orch, spawner) = queued(source);

    orch.load_country_data(code("us"));
    orch.load_country_data(code("fr"));
    assert_eq!(spawner.pending(), 2);

    // France answers first, then the slow US response arrives
    assert!(spawner.run_last());
    assert_eq!(orch.pump(), 1);
    assert!(spawner.run_first());
    assert_eq!(orch.pump(), 0);

    let state = orch.state();
    assert_eq!(state.code, Some(code("fr")));
    assert_eq!(state.profile, Some(profile("France")));
}

#[test]
fn late_indicator_for_previous_selection_is_discarded() {
    let source = Arc::new(
        FakeSource::default()
            .with_profile("fr", "France")
            .with_series("fr", gdp_series("fr"))
            .with_profile("us", "United States"),
    );
    let (mut orch, spawner) = queued(source);

    orch.load_country_data(code("fr"));
    assert!(spawner.run_first());
    assert_eq!(orch.pump(), 1);
    // the France indicator job is now queued
    assert_eq!(spawner.pending(), 1);

    orch.load_country_data(code("us"));
    assert!(spawner.run_first());
    assert_eq!(orch.pump(), 0);

    let state = orch.state();
    assert_eq!(state.code, Some(code("us")));
    assert_eq!(state.status, Status::Loading);
    assert!(state.chart.is_none());
}

#[test]
fn reset_discards_results_in_flight() {
    let (mut orch, spawner) = queued(fr_source());

    orch.load_country_data(code("fr"));
    orch.reset();
    spawner.run_first();
    assert_eq!(orch.pump(), 0);
    assert_eq!(orch.state().status, Status::Idle);
    assert!(orch.state().profile.is_none());
    assert_eq!(orch.in_flight(), 0);
    // no indicator fetch follows a discarded profile
    assert_eq!(spawner.pending(), 0);
}

#[test]
fn listeners_see_each_transition() {
    let seen: Rc<RefCell<Vec<(Status, bool)>>> = Rc::default();
    let store = Arc::new(PersistenceStore::in_memory());
    let mut orch = inline_orchestrator(fr_source(), store);
    let sink = seen.clone();
    orch.subscribe(move |s| sink.borrow_mut().push((s.status, s.chart.is_some())));

    orch.load_country_data(code("fr"));
    orch.pump();
    assert_eq!(
        *seen.borrow(),
        [
            (Status::Loading, false),
            (Status::Ready, false),
            (Status::Ready, true),
        ]
    );
}

#[test]
fn wait_idle_drains_threaded_fetches() {
    use std::time::Duration;
    use wbmap_rs::orchestrator::ThreadSpawner;

    let mut orch = DataOrchestrator::new(
        fr_source(),
        Box::new(ThreadSpawner),
        Arc::new(PersistenceStore::in_memory()),
        IndicatorSettings::default(),
    );
    orch.load_country_data(code("fr"));
    assert!(orch.wait_idle(Duration::from_secs(5)));
    assert_eq!(orch.state().status, Status::Ready);
    assert!(orch.state().chart.is_some());
}
