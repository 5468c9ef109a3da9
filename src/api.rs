//! Synchronous client for the **World Bank API (v2)** country and indicator endpoints.
//!
//! - `country/{code}` → one [`CountryProfile`]; missing fields become `"N/A"`.
//! - `country/{code}/indicator/{id}` → one [`IndicatorSeries`], newest first as the
//!   API returns it. Pagination is handled automatically.
//!
//! ### Notes
//! - The API sometimes serializes `per_page` as a **string**; we accept both string/number.
//! - Error payloads (`[{"message": [...]}]`) are surfaced as errors.
//! - Network timeouts use a sane default (30s) and can be adjusted through [`ExplorerConfig`].
//!
//! Typical usage:
//! ```no_run
//! # use wbmap_rs::{Client, models::CountryCode};
//! let client = Client::default();
//! let profile = client.fetch_profile(&CountryCode::parse("de")?)?;
//! println!("{} ({})", profile.name, profile.capital);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::ExplorerConfig;
use crate::models::{
    CountryCode, CountryEntry, CountryProfile, DateSpec, Entry, IndicatorPoint, IndicatorSeries,
    Meta,
};
use crate::orchestrator::CountryDataSource;
use anyhow::{Context, Result, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10)) // connect timeout
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("wbmap_rs/", env!("CARGO_PKG_VERSION"))) // set user agent
            .build()
            .expect("reqwest client build");
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            http,
        }
    }
}

// Allow -, _, . unescaped in codes (common for indicator ids)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(part: &str) -> String {
    percent_encoding::utf8_percent_encode(part.trim(), SAFE).to_string()
}

/// Split a `[Meta, [...]]` response, surfacing API error payloads.
fn split_response(v: &Value) -> Result<(Option<Meta>, Value)> {
    // The API returns an array: [Meta, [Entry, ...]] or a "message" object in position 0 on error.
    let arr = v
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("unexpected response shape: not a top-level array"))?;
    if arr.is_empty() {
        bail!("unexpected response: empty array");
    }
    if arr[0].get("message").is_some() {
        bail!("world bank api error: {}", arr[0]);
    }
    let meta = serde_json::from_value(arr[0].clone()).ok();
    Ok((meta, arr.get(1).cloned().unwrap_or(Value::Null)))
}

/// Decode a `country/{code}` response body.
///
/// An empty (or null) record list yields [`CountryProfile::unknown`].
pub fn parse_profile_response(v: &Value) -> Result<CountryProfile> {
    let (_, records) = split_response(v)?;
    let entries: Vec<CountryEntry> = if records.is_null() {
        vec![]
    } else {
        serde_json::from_value(records).context("parse country records")?
    };
    Ok(entries
        .into_iter()
        .next()
        .map(CountryProfile::from)
        .unwrap_or_else(CountryProfile::unknown))
}

/// Decode one page of an indicator response: total page count and its entries.
pub fn parse_indicator_page(v: &Value) -> Result<(u32, Vec<Entry>)> {
    let (meta, records) = split_response(v)?;
    let pages = meta.map(|m| m.pages).unwrap_or(1);
    let entries = if records.is_null() {
        vec![]
    } else {
        serde_json::from_value(records).context("parse entries")?
    };
    Ok((pages, entries))
}

impl Client {
    /// Client configured from timeouts and base URL in `cfg`.
    pub fn from_config(cfg: &ExplorerConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .redirect(Policy::limited(5))
            .user_agent(concat!("wbmap_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Small retry for transient failures (5xx / network errors).
    fn get_json(&self, u: &str) -> Result<Value> {
        let mut last_err: Option<anyhow::Error> = None;
        for backoff_ms in [100u64, 300, 700] {
            match self.http.get(u).send() {
                Ok(r) if r.status().is_success() => {
                    return r.json().context("decode json");
                }
                Ok(r) if r.status().is_server_error() => { /* retry */ }
                Ok(r) => bail!("request failed with HTTP {}", r.status()),
                Err(e) => last_err = Some(e.into()),
            }
            std::thread::sleep(Duration::from_millis(backoff_ms));
        }
        bail!("network error: {:?}", last_err);
    }

    /// Fetch the profile of one country.
    ///
    /// ### Errors
    /// - Network/HTTP error
    /// - JSON decoding error
    /// - API-level error payload (e.g. an unknown code)
    pub fn fetch_profile(&self, code: &CountryCode) -> Result<CountryProfile> {
        let url = format!("{}/country/{}?format=json", self.base_url, enc(code.as_str()));
        let v = self.get_json(&url).with_context(|| format!("GET {}", url))?;
        parse_profile_response(&v).with_context(|| format!("country {}", code))
    }

    /// Fetch one indicator for one country over `window`.
    pub fn fetch_indicator(
        &self,
        code: &CountryCode,
        indicator: &str,
        window: DateSpec,
    ) -> Result<IndicatorSeries> {
        if indicator.trim().is_empty() {
            bail!("indicator code required");
        }
        let url = format!(
            "{}/country/{}/indicator/{}?format=json&per_page=1000&date={}",
            self.base_url,
            enc(code.as_str()),
            enc(indicator),
            window.to_query_param()
        );

        // Safety cap to avoid pathological jobs
        let max_pages = 100u32;

        let mut page = 1u32;
        let mut entries: Vec<Entry> = Vec::new();
        loop {
            if page > max_pages {
                bail!("page limit exceeded ({})", max_pages);
            }
            let page_url = format!("{}&page={}", url, page);
            let v = self
                .get_json(&page_url)
                .with_context(|| format!("GET {}", page_url))?;
            let (pages, mut batch) = parse_indicator_page(&v)?;
            entries.append(&mut batch);
            if page >= pages {
                break;
            }
            page += 1;
        }

        let indicator_name = entries
            .first()
            .map(|e| e.indicator.value.clone())
            .unwrap_or_else(|| indicator.to_string());
        Ok(IndicatorSeries {
            country: code.clone(),
            indicator_id: indicator.to_string(),
            indicator_name,
            points: entries.into_iter().map(IndicatorPoint::from).collect(),
        })
    }
}

impl CountryDataSource for Client {
    fn fetch_profile(&self, code: &CountryCode) -> Result<CountryProfile> {
        Client::fetch_profile(self, code)
    }

    fn fetch_indicator(
        &self,
        code: &CountryCode,
        indicator: &str,
        window: DateSpec,
    ) -> Result<IndicatorSeries> {
        Client::fetch_indicator(self, code, indicator, window)
    }
}
