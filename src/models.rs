use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for profile fields the API leaves missing or empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Two-letter lowercase country identifier shared by the map asset, the
/// directory and the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid country code {0:?}: expected two ASCII letters")]
pub struct InvalidCountryCode(pub String);

impl CountryCode {
    /// Trim and lowercase `s`; anything but exactly two ASCII letters is rejected.
    pub fn parse(s: &str) -> Result<Self, InvalidCountryCode> {
        let t = s.trim();
        if t.len() == 2 && t.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(t.to_ascii_lowercase()))
        } else {
            Err(InvalidCountryCode(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = InvalidCountryCode;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(c: CountryCode) -> Self {
        c.0
    }
}

/// How to specify dates in API queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSpec {
    /// Single year like 2020
    Year(i32),
    /// Inclusive range like 2000..=2020
    Range { start: i32, end: i32 },
}

impl DateSpec {
    /// Inclusive window of `years` years ending at `end`.
    pub fn trailing(end: i32, years: u32) -> Self {
        let span = years.max(1) as i32 - 1;
        if span == 0 {
            DateSpec::Year(end)
        } else {
            DateSpec::Range {
                start: end - span,
                end,
            }
        }
    }

    pub fn to_query_param(&self) -> String {
        match *self {
            DateSpec::Year(y) => y.to_string(),
            DateSpec::Range { start, end } => format!("{}:{}", start, end),
        }
    }
}

/// Metadata section returned by the API (position 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub page: u32,
    pub pages: u32,
    /// Some responses encode `per_page` as a string, others as a number.
    /// Accept both and normalize to `u32`.
    #[serde(deserialize_with = "de_u32_from_string_or_number")]
    pub per_page: u32,
    pub total: u32,
}

/// Serde helper: parse `u32` from either a JSON number or a string.
fn de_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U32Visitor;

    impl<'de> Visitor<'de> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as u32)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("negative value for u32"));
            }
            Ok(v as u32)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.parse::<u32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeName {
    pub id: String,
    pub value: String,
}

/// `{ "id": ..., "value": ... }` reference where either half may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelRef {
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub value: Option<String>,
}

/// Serde helper: any JSON value; only a string survives, everything else is `None`.
fn de_lenient_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(v.and_then(|v| v.as_str().map(str::to_string)))
}

/// Serde helper: a `{id, value}` object, or `None` for any other shape.
fn de_lenient_label<'de, D>(deserializer: D) -> Result<Option<LabelRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(v.filter(serde_json::Value::is_object)
        .and_then(|v| serde_json::from_value(v).ok()))
}

/// Raw record from the `country/{code}` endpoint (position 1 array).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryEntry {
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub iso2_code: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_label")]
    pub region: Option<LabelRef>,
    #[serde(default, deserialize_with = "de_lenient_label")]
    pub income_level: Option<LabelRef>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub capital_city: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub longitude: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_str")]
    pub latitude: Option<String>,
}

/// Profile snapshot shown for the selected country.
///
/// Serialized with camelCase keys; this is also the persisted layout
/// (plus `savedAt`, added by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryProfile {
    pub name: String,
    pub capital: String,
    pub region: String,
    pub income_level: String,
    pub longitude: String,
    pub latitude: String,
}

impl CountryProfile {
    /// Profile used when the API answers with an empty record list.
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".into(),
            capital: NOT_AVAILABLE.into(),
            region: NOT_AVAILABLE.into(),
            income_level: NOT_AVAILABLE.into(),
            longitude: NOT_AVAILABLE.into(),
            latitude: NOT_AVAILABLE.into(),
        }
    }
}

fn or_na(v: Option<String>) -> String {
    match v {
        Some(s) if !s.trim().is_empty() => s,
        _ => NOT_AVAILABLE.to_string(),
    }
}

impl From<CountryEntry> for CountryProfile {
    fn from(e: CountryEntry) -> Self {
        Self {
            name: or_na(e.name),
            capital: or_na(e.capital_city),
            region: or_na(e.region.and_then(|r| r.value)),
            income_level: or_na(e.income_level.and_then(|r| r.value)),
            longitude: or_na(e.longitude),
            latitude: or_na(e.latitude),
        }
    }
}

/// Raw entry from the indicator endpoint (position 1 array).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub indicator: CodeName,
    pub country: CodeName,
    #[serde(default)]
    pub countryiso3code: String,
    pub date: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, rename = "obs_status")]
    pub obs_status: Option<String>,
    #[serde(default)]
    pub decimal: Option<i32>,
}

/// One `(period, value)` observation; `value` is `None` when the API has no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub period: String,
    pub value: Option<f64>,
}

impl From<Entry> for IndicatorPoint {
    fn from(e: Entry) -> Self {
        Self {
            period: e.date,
            value: e.value,
        }
    }
}

/// Indicator observations for one country, in the order the API returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub country: CountryCode,
    pub indicator_id: String,
    pub indicator_name: String,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Drop null observations and reverse the API's newest-first order.
    /// Returns `None` when no observation survives.
    pub fn into_chronological(mut self) -> Option<Self> {
        self.points.retain(|p| p.value.is_some());
        if self.points.is_empty() {
            return None;
        }
        self.points.reverse();
        Some(self)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
