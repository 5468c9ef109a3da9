//! Fetch sequencing for the selected country.
//!
//! `load_country_data` fetches the profile first and, once it succeeds, the
//! indicator series. Fetches run through a [`Spawn`] implementation and report
//! back over a channel; [`DataOrchestrator::pump`] applies the completions on
//! the caller's thread. Every load takes a new request token and completions
//! carrying an older token are dropped, so a slow answer for a previous
//! selection can never overwrite the current one.

use crate::error::ExplorerError;
use crate::models::{CountryCode, CountryProfile, DateSpec, IndicatorSeries};
use crate::store::{PROFILE_KEY, PersistenceStore, SELECTED_CODE_KEY};
use chrono::Datelike;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// GDP (current US$).
pub const DEFAULT_INDICATOR: &str = "NY.GDP.MKTP.CD";
pub const DEFAULT_INDICATOR_LABEL: &str = "GDP (Current US$)";
pub const DEFAULT_WINDOW_YEARS: u32 = 10;

/// Remote data contract for profiles and indicator series.
pub trait CountryDataSource: Send + Sync {
    fn fetch_profile(&self, code: &CountryCode) -> anyhow::Result<CountryProfile>;

    fn fetch_indicator(
        &self,
        code: &CountryCode,
        indicator: &str,
        window: DateSpec,
    ) -> anyhow::Result<IndicatorSeries>;
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs fetch jobs somewhere off the event context.
pub trait Spawn {
    fn spawn(&self, job: Job);
}

/// One OS thread per job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawn for ThreadSpawner {
    fn spawn(&self, job: Job) {
        std::thread::spawn(job);
    }
}

/// Runs the job before returning. Completions still wait for [`DataOrchestrator::pump`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSpawner;

impl Spawn for InlineSpawner {
    fn spawn(&self, job: Job) {
        job();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything the presentation layer shows about the selected country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataState {
    pub status: Status,
    /// Country the current data belongs to.
    pub code: Option<CountryCode>,
    pub profile: Option<CountryProfile>,
    /// Chronological, null-free series; only set when non-empty.
    pub chart: Option<IndicatorSeries>,
    /// Set together with [`Status::Error`].
    pub error: Option<ExplorerError>,
}

impl DataState {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// Indicator request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub indicator_id: String,
    pub window_years: u32,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            indicator_id: DEFAULT_INDICATOR.to_string(),
            window_years: DEFAULT_WINDOW_YEARS,
        }
    }
}

#[derive(Debug)]
enum Completion {
    Profile {
        token: u64,
        code: CountryCode,
        result: Result<CountryProfile, String>,
    },
    Indicator {
        token: u64,
        code: CountryCode,
        result: Result<IndicatorSeries, String>,
    },
}

type Listener = Box<dyn FnMut(&DataState)>;

pub struct DataOrchestrator {
    source: Arc<dyn CountryDataSource>,
    spawner: Box<dyn Spawn>,
    store: Arc<PersistenceStore>,
    settings: IndicatorSettings,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    token: u64,
    in_flight: usize,
    state: DataState,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for DataOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataOrchestrator")
            .field("settings", &self.settings)
            .field("token", &self.token)
            .field("in_flight", &self.in_flight)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DataOrchestrator {
    pub fn new(
        source: Arc<dyn CountryDataSource>,
        spawner: Box<dyn Spawn>,
        store: Arc<PersistenceStore>,
        settings: IndicatorSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            spawner,
            store,
            settings,
            tx,
            rx,
            token: 0,
            in_flight: 0,
            state: DataState::default(),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &DataState {
        &self.state
    }

    /// Token of the most recent load.
    pub fn current_token(&self) -> u64 {
        self.token
    }

    /// Jobs spawned whose completion has not been pumped yet, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Register a callback run after every completed state transition.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&DataState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Start loading `code`, superseding any load still in progress.
    pub fn load_country_data(&mut self, code: CountryCode) -> u64 {
        self.token += 1;
        let token = self.token;
        self.state = DataState {
            status: Status::Loading,
            code: Some(code.clone()),
            profile: None,
            chart: None,
            error: None,
        };
        self.notify();

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.in_flight += 1;
        self.spawner.spawn(Box::new(move || {
            let result = source.fetch_profile(&code).map_err(|e| format!("{e:#}"));
            let _ = tx.send(Completion::Profile {
                token,
                code,
                result,
            });
        }));
        token
    }

    /// Replay the load for the last *persisted* selection.
    ///
    /// Returns the new token, or `None` when nothing valid is stored.
    pub fn retry(&mut self) -> Option<u64> {
        let raw = self.store.get_raw(SELECTED_CODE_KEY)?;
        match CountryCode::parse(&raw) {
            Ok(code) => {
                log::info!("retrying load for {code}");
                Some(self.load_country_data(code))
            }
            Err(e) => {
                log::warn!("cannot retry: {e}");
                None
            }
        }
    }

    /// Show a cached profile without fetching.
    pub fn restore_cached(&mut self, code: CountryCode, profile: CountryProfile) {
        self.token += 1;
        self.state = DataState {
            status: Status::Ready,
            code: Some(code),
            profile: Some(profile),
            chart: None,
            error: None,
        };
        self.notify();
    }

    /// Forget all data; results still in flight will be discarded.
    pub fn reset(&mut self) {
        self.token += 1;
        self.state = DataState::default();
        self.notify();
    }

    /// Apply every completion that has already arrived. Returns how many
    /// were applied to the current state (stale ones are not counted).
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(c) = self.rx.try_recv() {
            if self.apply(c) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until nothing is in flight or `timeout` elapses.
    /// Returns `true` when idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(c) => {
                    self.apply(c);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                // tx is held by self; unreachable in practice
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn apply(&mut self, completion: Completion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Profile {
                token,
                code,
                result,
            } => {
                if token != self.token {
                    log::debug!("discarding stale profile for {code} (request {token})");
                    return false;
                }
                self.on_profile(token, code, result);
            }
            Completion::Indicator {
                token,
                code,
                result,
            } => {
                if token != self.token {
                    log::debug!("discarding stale indicator data for {code} (request {token})");
                    return false;
                }
                self.on_indicator(code, result);
            }
        }
        true
    }

    fn on_profile(&mut self, token: u64, code: CountryCode, result: Result<CountryProfile, String>) {
        match result {
            Ok(profile) => {
                if let Err(e) = self.store.save(PROFILE_KEY, &profile) {
                    log::error!("error saving profile for {code}: {e}");
                }
                self.state.status = Status::Ready;
                self.state.profile = Some(profile);
                self.state.error = None;
                self.notify();
                self.spawn_indicator(token, code);
            }
            Err(reason) => {
                log::error!("profile fetch for {code} failed: {reason}");
                self.state.status = Status::Error;
                self.state.profile = None;
                self.state.error = Some(ExplorerError::ProfileFetchFailed { code, reason });
                self.notify();
            }
        }
    }

    fn spawn_indicator(&mut self, token: u64, code: CountryCode) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let indicator = self.settings.indicator_id.clone();
        let window = DateSpec::trailing(self.store.now().year(), self.settings.window_years);
        self.in_flight += 1;
        self.spawner.spawn(Box::new(move || {
            let result = source
                .fetch_indicator(&code, &indicator, window)
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(Completion::Indicator {
                token,
                code,
                result,
            });
        }));
    }

    fn on_indicator(&mut self, code: CountryCode, result: Result<IndicatorSeries, String>) {
        match result {
            Ok(series) => match series.into_chronological() {
                Some(series) => {
                    self.state.chart = Some(series);
                    self.notify();
                }
                None => log::debug!("no indicator values for {code}; chart hidden"),
            },
            Err(reason) => {
                let err = ExplorerError::IndicatorFetchFailed { code, reason };
                log::warn!("{err}");
            }
        }
    }

    fn notify(&mut self) {
        for l in &mut self.listeners {
            l(&self.state);
        }
    }
}
