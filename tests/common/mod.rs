#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use wbmap_rs::orchestrator::{
    CountryDataSource, DataOrchestrator, IndicatorSettings, InlineSpawner, Job, Spawn,
};
use wbmap_rs::models::{CountryCode, CountryProfile, DateSpec, IndicatorPoint, IndicatorSeries};
use wbmap_rs::{CountryDirectory, Explorer, Palette, PersistenceStore, ShapeElement};

pub fn code(s: &str) -> CountryCode {
    CountryCode::parse(s).unwrap()
}

pub fn profile(name: &str) -> CountryProfile {
    CountryProfile {
        name: name.into(),
        capital: "Capital".into(),
        region: "Region".into(),
        income_level: "High income".into(),
        longitude: "1.0".into(),
        latitude: "2.0".into(),
    }
}

/// Newest-first series as the API returns it, with one missing year.
pub fn gdp_series(c: &str) -> IndicatorSeries {
    IndicatorSeries {
        country: code(c),
        indicator_id: "NY.GDP.MKTP.CD".into(),
        indicator_name: "GDP (current US$)".into(),
        points: vec![
            IndicatorPoint { period: "2023".into(), value: None },
            IndicatorPoint { period: "2022".into(), value: Some(3.0e12) },
            IndicatorPoint { period: "2021".into(), value: Some(2.5e12) },
        ],
    }
}

/// In-memory data source: known profiles succeed, everything else fails.
#[derive(Default)]
pub struct FakeSource {
    pub profiles: Mutex<HashMap<String, CountryProfile>>,
    pub series: Mutex<HashMap<String, IndicatorSeries>>,
    pub calls: Mutex<Vec<String>>,
    pub windows: Mutex<Vec<DateSpec>>,
}

impl FakeSource {
    pub fn with_profile(self, c: &str, name: &str) -> Self {
        self.profiles.lock().unwrap().insert(c.into(), profile(name));
        self
    }

    pub fn with_series(self, c: &str, s: IndicatorSeries) -> Self {
        self.series.lock().unwrap().insert(c.into(), s);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CountryDataSource for FakeSource {
    fn fetch_profile(&self, code: &CountryCode) -> anyhow::Result<CountryProfile> {
        self.calls.lock().unwrap().push(format!("profile:{code}"));
        match self.profiles.lock().unwrap().get(code.as_str()) {
            Some(p) => Ok(p.clone()),
            None => bail!("world bank api error: invalid value {code}"),
        }
    }

    fn fetch_indicator(
        &self,
        code: &CountryCode,
        indicator: &str,
        window: DateSpec,
    ) -> anyhow::Result<IndicatorSeries> {
        self.calls.lock().unwrap().push(format!("indicator:{code}:{indicator}"));
        self.windows.lock().unwrap().push(window);
        match self.series.lock().unwrap().get(code.as_str()) {
            Some(s) => Ok(s.clone()),
            None => bail!("request failed with HTTP 502"),
        }
    }
}

/// Holds jobs until the test decides which one finishes first.
#[derive(Clone, Default)]
pub struct QueueSpawner {
    pub jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl QueueSpawner {
    pub fn run_last(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_back();
        job.map(|j| j()).is_some()
    }

    pub fn run_first(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_front();
        job.map(|j| j()).is_some()
    }

    pub fn pending(&self) -> usize {
        self.jobs.borrow().len()
    }
}

impl Spawn for QueueSpawner {
    fn spawn(&self, job: Job) {
        self.jobs.borrow_mut().push_back(job);
    }
}

pub fn inline_orchestrator(
    source: Arc<FakeSource>,
    store: Arc<PersistenceStore>,
) -> DataOrchestrator {
    DataOrchestrator::new(
        source,
        Box::new(InlineSpawner),
        store,
        IndicatorSettings::default(),
    )
}

pub fn shapes(codes: &[&str]) -> Vec<ShapeElement> {
    codes.iter().map(|c| ShapeElement::for_code(code(c))).collect()
}

pub fn explorer(
    codes: &[&str],
    source: Arc<FakeSource>,
    store: Arc<PersistenceStore>,
) -> Explorer<ShapeElement> {
    let orchestrator = inline_orchestrator(source, store.clone());
    Explorer::new(
        shapes(codes),
        CountryDirectory::builtin(),
        store,
        orchestrator,
        Palette::default(),
    )
}
