//! Static country directory: display names and region groupings keyed by
//! two-letter map identifiers.
//!
//! The directory is built once from an immutable table of [`CountryRecord`]s
//! and never mutated afterwards. Unknown codes resolve to an empty name and no
//! region, so they never satisfy an active filter.

use crate::element::Color;
use crate::models::CountryCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Region grouping used by the region filter chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Africa,
    Asia,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Oceania,
    #[serde(rename = "Middle East")]
    MiddleEast,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::Africa,
        Region::Asia,
        Region::Europe,
        Region::NorthAmerica,
        Region::SouthAmerica,
        Region::Oceania,
        Region::MiddleEast,
    ];

    /// Human-readable label, identical to the chip text.
    pub fn label(&self) -> &'static str {
        match self {
            Region::Africa => "Africa",
            Region::Asia => "Asia",
            Region::Europe => "Europe",
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::Oceania => "Oceania",
            Region::MiddleEast => "Middle East",
        }
    }

    /// Accent fill used for matches while this region's filter is active.
    pub fn accent(&self) -> Color {
        match self {
            Region::Africa => Color::rgb(0xFF, 0x6B, 0x6B),
            Region::Asia => Color::rgb(0x4E, 0xCD, 0xC4),
            Region::Europe => Color::rgb(0x45, 0xB7, 0xD1),
            Region::NorthAmerica => Color::rgb(0xFF, 0xA0, 0x7A),
            Region::SouthAmerica => Color::rgb(0x98, 0xD8, 0xC8),
            Region::Oceania => Color::rgb(0xF7, 0xDC, 0x6F),
            Region::MiddleEast => Color::rgb(0xBB, 0x8F, 0xCE),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region {0:?}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    /// Accepts the display label in any case, with or without the space
    /// (`"north america"`, `"NorthAmerica"`, `"north-america"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Region::ALL
            .into_iter()
            .find(|r| r.label().replace(' ', "").eq_ignore_ascii_case(&folded))
            .ok_or_else(|| UnknownRegion(s.trim().to_string()))
    }
}

/// Static metadata for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMetadata {
    pub name: String,
    pub region: Option<Region>,
}

/// One row of the immutable source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryRecord {
    pub code: &'static str,
    pub name: &'static str,
    pub region: Option<Region>,
}

const fn entry(code: &'static str, name: &'static str, region: Option<Region>) -> CountryRecord {
    CountryRecord { code, name, region }
}

/// Read-only lookup from country code to [`CountryMetadata`].
#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    entries: HashMap<CountryCode, CountryMetadata>,
}

impl CountryDirectory {
    /// Build from an injected table. Rows with a malformed code are skipped.
    pub fn from_records(records: &[CountryRecord]) -> Self {
        let mut entries = HashMap::with_capacity(records.len());
        for r in records {
            match CountryCode::parse(r.code) {
                Ok(code) => {
                    entries.insert(
                        code,
                        CountryMetadata {
                            name: r.name.to_string(),
                            region: r.region,
                        },
                    );
                }
                Err(e) => log::warn!("skipping directory row: {e}"),
            }
        }
        Self { entries }
    }

    /// Directory over [`BUILTIN_COUNTRIES`].
    pub fn builtin() -> Self {
        Self::from_records(BUILTIN_COUNTRIES)
    }

    pub fn metadata_for(&self, code: &CountryCode) -> Option<&CountryMetadata> {
        self.entries.get(code)
    }

    /// Display name, or `""` when the code is not in the table.
    pub fn name_of(&self, code: &CountryCode) -> &str {
        self.metadata_for(code).map(|m| m.name.as_str()).unwrap_or("")
    }

    pub fn region_of(&self, code: &CountryCode) -> Option<Region> {
        self.metadata_for(code).and_then(|m| m.region)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Built-in table covering every shape on the bundled world map.
pub const BUILTIN_COUNTRIES: &[CountryRecord] = &[
    // Africa
    entry("ng", "Nigeria", Some(Region::Africa)),
    entry("eg", "Egypt", Some(Region::Africa)),
    entry("za", "South Africa", Some(Region::Africa)),
    entry("ke", "Kenya", Some(Region::Africa)),
    entry("et", "Ethiopia", Some(Region::Africa)),
    entry("gh", "Ghana", Some(Region::Africa)),
    entry("ao", "Angola", Some(Region::Africa)),
    entry("tz", "Tanzania", Some(Region::Africa)),
    entry("ug", "Uganda", Some(Region::Africa)),
    entry("ma", "Morocco", Some(Region::Africa)),
    entry("dz", "Algeria", Some(Region::Africa)),
    entry("sd", "Sudan", Some(Region::Africa)),
    entry("cm", "Cameroon", Some(Region::Africa)),
    entry("ne", "Niger", Some(Region::Africa)),
    entry("bf", "Burkina Faso", Some(Region::Africa)),
    entry("ml", "Mali", Some(Region::Africa)),
    entry("mw", "Malawi", Some(Region::Africa)),
    entry("zm", "Zambia", Some(Region::Africa)),
    entry("sn", "Senegal", Some(Region::Africa)),
    entry("so", "Somalia", Some(Region::Africa)),
    entry("td", "Chad", Some(Region::Africa)),
    entry("gn", "Guinea", Some(Region::Africa)),
    entry("rw", "Rwanda", Some(Region::Africa)),
    entry("bj", "Benin", Some(Region::Africa)),
    entry("tn", "Tunisia", Some(Region::Africa)),
    entry("bi", "Burundi", Some(Region::Africa)),
    entry("ss", "South Sudan", Some(Region::Africa)),
    entry("tg", "Togo", Some(Region::Africa)),
    entry("sl", "Sierra Leone", Some(Region::Africa)),
    entry("ly", "Libya", Some(Region::Africa)),
    entry("lr", "Liberia", Some(Region::Africa)),
    entry("mr", "Mauritania", Some(Region::Africa)),
    entry("cf", "Central African Republic", Some(Region::Africa)),
    entry("er", "Eritrea", Some(Region::Africa)),
    entry("gm", "Gambia", Some(Region::Africa)),
    entry("bw", "Botswana", Some(Region::Africa)),
    entry("na", "Namibia", Some(Region::Africa)),
    entry("ga", "Gabon", Some(Region::Africa)),
    entry("ls", "Lesotho", Some(Region::Africa)),
    entry("gw", "Guinea-Bissau", Some(Region::Africa)),
    entry("gq", "Equatorial Guinea", Some(Region::Africa)),
    entry("mu", "Mauritius", Some(Region::Africa)),
    entry("sz", "Swaziland", Some(Region::Africa)),
    entry("dj", "Djibouti", Some(Region::Africa)),
    entry("km", "Comoros", Some(Region::Africa)),
    entry("cv", "Cape Verde", Some(Region::Africa)),
    entry("st", "Sao Tome and Principe", Some(Region::Africa)),
    entry("sc", "Seychelles", Some(Region::Africa)),
    // Asia
    entry("cn", "China", Some(Region::Asia)),
    entry("in", "India", Some(Region::Asia)),
    entry("jp", "Japan", Some(Region::Asia)),
    entry("af", "Afghanistan", Some(Region::Asia)),
    entry("pk", "Pakistan", Some(Region::Asia)),
    entry("bd", "Bangladesh", Some(Region::Asia)),
    entry("lk", "Sri Lanka", Some(Region::Asia)),
    entry("mm", "Myanmar", Some(Region::Asia)),
    entry("th", "Thailand", Some(Region::Asia)),
    entry("vn", "Vietnam", Some(Region::Asia)),
    entry("ph", "Philippines", Some(Region::Asia)),
    entry("my", "Malaysia", Some(Region::Asia)),
    entry("sg", "Singapore", Some(Region::Asia)),
    entry("id", "Indonesia", Some(Region::Asia)),
    entry("kh", "Cambodia", Some(Region::Asia)),
    entry("la", "Laos", Some(Region::Asia)),
    entry("np", "Nepal", Some(Region::Asia)),
    entry("bt", "Bhutan", Some(Region::Asia)),
    entry("kr", "South Korea", Some(Region::Asia)),
    entry("kp", "North Korea", Some(Region::Asia)),
    entry("mn", "Mongolia", Some(Region::Asia)),
    entry("kz", "Kazakhstan", Some(Region::Asia)),
    entry("uz", "Uzbekistan", Some(Region::Asia)),
    entry("tm", "Turkmenistan", Some(Region::Asia)),
    entry("kg", "Kyrgyzstan", Some(Region::Asia)),
    entry("tj", "Tajikistan", Some(Region::Asia)),
    // Europe
    entry("gb", "United Kingdom", Some(Region::Europe)),
    entry("fr", "France", Some(Region::Europe)),
    entry("de", "Germany", Some(Region::Europe)),
    entry("it", "Italy", Some(Region::Europe)),
    entry("es", "Spain", Some(Region::Europe)),
    entry("ru", "Russia", Some(Region::Europe)),
    entry("pl", "Poland", Some(Region::Europe)),
    entry("ua", "Ukraine", Some(Region::Europe)),
    entry("ro", "Romania", Some(Region::Europe)),
    entry("cz", "Czech Republic", Some(Region::Europe)),
    entry("gr", "Greece", Some(Region::Europe)),
    entry("pt", "Portugal", Some(Region::Europe)),
    entry("hu", "Hungary", Some(Region::Europe)),
    entry("by", "Belarus", Some(Region::Europe)),
    entry("at", "Austria", Some(Region::Europe)),
    entry("rs", "Serbia", Some(Region::Europe)),
    entry("ch", "Switzerland", Some(Region::Europe)),
    entry("bg", "Bulgaria", Some(Region::Europe)),
    entry("dk", "Denmark", Some(Region::Europe)),
    entry("fi", "Finland", Some(Region::Europe)),
    entry("sk", "Slovakia", Some(Region::Europe)),
    entry("no", "Norway", Some(Region::Europe)),
    entry("ie", "Ireland", Some(Region::Europe)),
    entry("hr", "Croatia", Some(Region::Europe)),
    entry("ba", "Bosnia", Some(Region::Europe)),
    entry("lt", "Lithuania", Some(Region::Europe)),
    entry("si", "Slovenia", Some(Region::Europe)),
    entry("lv", "Latvia", Some(Region::Europe)),
    entry("ee", "Estonia", Some(Region::Europe)),
    entry("mk", "Macedonia", Some(Region::Europe)),
    entry("al", "Albania", Some(Region::Europe)),
    entry("md", "Moldova", Some(Region::Europe)),
    entry("me", "Montenegro", Some(Region::Europe)),
    entry("se", "Sweden", Some(Region::Europe)),
    entry("be", "Belgium", Some(Region::Europe)),
    entry("nl", "Netherlands", Some(Region::Europe)),
    entry("lu", "Luxembourg", Some(Region::Europe)),
    entry("is", "Iceland", Some(Region::Europe)),
    // North America
    entry("us", "United States", Some(Region::NorthAmerica)),
    entry("ca", "Canada", Some(Region::NorthAmerica)),
    entry("mx", "Mexico", Some(Region::NorthAmerica)),
    entry("gt", "Guatemala", Some(Region::NorthAmerica)),
    entry("cu", "Cuba", Some(Region::NorthAmerica)),
    entry("ht", "Haiti", Some(Region::NorthAmerica)),
    entry("do", "Dominican Republic", Some(Region::NorthAmerica)),
    entry("hn", "Honduras", Some(Region::NorthAmerica)),
    entry("ni", "Nicaragua", Some(Region::NorthAmerica)),
    entry("sv", "El Salvador", Some(Region::NorthAmerica)),
    entry("cr", "Costa Rica", Some(Region::NorthAmerica)),
    entry("pa", "Panama", Some(Region::NorthAmerica)),
    entry("jm", "Jamaica", Some(Region::NorthAmerica)),
    entry("tt", "Trinidad and Tobago", Some(Region::NorthAmerica)),
    entry("bs", "Bahamas", Some(Region::NorthAmerica)),
    entry("bz", "Belize", Some(Region::NorthAmerica)),
    entry("bb", "Barbados", Some(Region::NorthAmerica)),
    entry("gl", "Greenland", Some(Region::NorthAmerica)),
    // South America
    entry("br", "Brazil", Some(Region::SouthAmerica)),
    entry("ar", "Argentina", Some(Region::SouthAmerica)),
    entry("ve", "Venezuela", Some(Region::SouthAmerica)),
    entry("co", "Colombia", Some(Region::SouthAmerica)),
    entry("ec", "Ecuador", Some(Region::SouthAmerica)),
    entry("pe", "Peru", Some(Region::SouthAmerica)),
    entry("cl", "Chile", Some(Region::SouthAmerica)),
    entry("bo", "Bolivia", Some(Region::SouthAmerica)),
    entry("py", "Paraguay", Some(Region::SouthAmerica)),
    entry("uy", "Uruguay", Some(Region::SouthAmerica)),
    entry("gy", "Guyana", Some(Region::SouthAmerica)),
    entry("sr", "Suriname", Some(Region::SouthAmerica)),
    entry("gf", "French Guiana", Some(Region::SouthAmerica)),
    // Oceania
    entry("au", "Australia", Some(Region::Oceania)),
    entry("nz", "New Zealand", Some(Region::Oceania)),
    entry("pg", "Papua New Guinea", Some(Region::Oceania)),
    entry("fj", "Fiji", Some(Region::Oceania)),
    entry("sb", "Solomon Islands", Some(Region::Oceania)),
    entry("vu", "Vanuatu", Some(Region::Oceania)),
    entry("nc", "New Caledonia", Some(Region::Oceania)),
    entry("pf", "French Polynesia", Some(Region::Oceania)),
    // Middle East
    entry("tr", "Turkey", Some(Region::MiddleEast)),
    entry("ir", "Iran", Some(Region::MiddleEast)),
    entry("iq", "Iraq", Some(Region::MiddleEast)),
    entry("sa", "Saudi Arabia", Some(Region::MiddleEast)),
    entry("ye", "Yemen", Some(Region::MiddleEast)),
    entry("sy", "Syria", Some(Region::MiddleEast)),
    entry("jo", "Jordan", Some(Region::MiddleEast)),
    entry("ae", "United Arab Emirates", Some(Region::MiddleEast)),
    entry("il", "Israel", Some(Region::MiddleEast)),
    entry("lb", "Lebanon", Some(Region::MiddleEast)),
    entry("om", "Oman", Some(Region::MiddleEast)),
    entry("kw", "Kuwait", Some(Region::MiddleEast)),
    entry("qa", "Qatar", Some(Region::MiddleEast)),
    entry("bh", "Bahrain", Some(Region::MiddleEast)),
    entry("ps", "Palestine", Some(Region::MiddleEast)),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    #[test]
    fn builtin_has_names_and_regions() {
        let dir = CountryDirectory::builtin();
        assert_eq!(dir.name_of(&code("ng")), "Nigeria");
        assert_eq!(dir.region_of(&code("ng")), Some(Region::Africa));
        assert_eq!(dir.region_of(&code("tr")), Some(Region::MiddleEast));
        assert_eq!(dir.name_of(&code("dj")), "Djibouti");
        assert!(dir.len() > 160);
    }

    #[test]
    fn unknown_code_resolves_to_empty() {
        let dir = CountryDirectory::builtin();
        assert!(dir.metadata_for(&code("zz")).is_none());
        assert_eq!(dir.name_of(&code("zz")), "");
        assert_eq!(dir.region_of(&code("zz")), None);
    }

    #[test]
    fn region_parses_labels_loosely() {
        assert_eq!("Africa".parse::<Region>().unwrap(), Region::Africa);
        assert_eq!("north america".parse::<Region>().unwrap(), Region::NorthAmerica);
        assert_eq!("Middle-East".parse::<Region>().unwrap(), Region::MiddleEast);
        assert!("Atlantis".parse::<Region>().is_err());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = CountryDirectory::from_records(&[
            entry("xx1", "Broken", None),
            entry("fr", "France", Some(Region::Europe)),
        ]);
        assert_eq!(dir.len(), 1);
    }
}
