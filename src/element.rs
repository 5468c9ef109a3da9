//! Visual element capability and the colors applied to it.
//!
//! Filtering and selection never touch concrete UI nodes; they only drive the
//! [`VisualElement`] interface. [`ShapeElement`] is the in-memory
//! implementation used by the CLI and the tests.

use crate::models::CountryCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #rgb or #rrggbb")]
pub struct InvalidColor(pub String);

impl FromStr for Color {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| err());
        match hex.len() {
            // #ddd expands to #dddddd
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
                Ok(Color::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Opacity of elements that do not match the active filter.
pub const DIMMED_OPACITY: f32 = 0.15;
/// Opacity of every visible element.
pub const FULL_OPACITY: f32 = 1.0;

/// Fill colors for the four interaction states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub default: Color,
    pub hover: Color,
    pub selected: Color,
    /// Match color while only a text query is active.
    pub highlight: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            default: Color::rgb(0xdd, 0xdd, 0xdd),
            hover: Color::rgb(0x4C, 0xAF, 0x50),
            selected: Color::rgb(0x21, 0x96, 0xF3),
            highlight: Color::rgb(0xFF, 0xD7, 0x00),
        }
    }
}

/// Capability the engine needs from a rendered map shape.
pub trait VisualElement {
    /// Country identifier carried by the shape, if any.
    fn identifier(&self) -> Option<CountryCode>;
    fn set_fill_color(&mut self, color: Color);
    fn set_opacity(&mut self, opacity: f32);
    fn set_interactive(&mut self, interactive: bool);
}

/// In-memory shape recording the last style applied to it.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeElement {
    id: Option<CountryCode>,
    pub fill: Color,
    pub opacity: f32,
    pub interactive: bool,
}

impl ShapeElement {
    pub fn new(id: Option<CountryCode>, fill: Color) -> Self {
        Self {
            id,
            fill,
            opacity: FULL_OPACITY,
            interactive: true,
        }
    }

    /// Shape for `code` painted in the default palette color.
    pub fn for_code(code: CountryCode) -> Self {
        Self::new(Some(code), Palette::default().default)
    }
}

impl VisualElement for ShapeElement {
    fn identifier(&self) -> Option<CountryCode> {
        self.id.clone()
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }
}
