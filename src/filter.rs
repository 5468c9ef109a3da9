//! Filter engine: per-element visual state from the search query, the region
//! chip and the current selection.
//!
//! [`compute_outcomes`] is pure; [`apply_outcomes`] pushes the result onto the
//! elements. Running both twice with the same inputs leaves every element in
//! the same state.

use crate::directory::{CountryDirectory, Region, UnknownRegion};
use crate::element::{Color, DIMMED_OPACITY, FULL_OPACITY, Palette, VisualElement};
use crate::models::CountryCode;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};

/// Current search text and region chip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    query: String,
    region: Option<Region>,
}

impl FilterState {
    pub fn new(query: &str, region: Option<Region>) -> Self {
        let mut f = Self::default();
        f.set_query(query);
        f.region = region;
        f
    }

    /// Stored lowercased; matching is case-insensitive.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_lowercase();
    }

    pub fn set_region(&mut self, region: Option<Region>) {
        self.region = region;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// No query and no region: everything is visible.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.region.is_none()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.region = None;
    }

    /// Parse a region chip label. `""`, `"all"` and `"All Regions"` mean no region filter.
    pub fn parse_region(label: &str) -> Result<Option<Region>, UnknownRegion> {
        let t = label.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") || t.eq_ignore_ascii_case("all regions") {
            return Ok(None);
        }
        t.parse().map(Some)
    }

    /// Whether `code` passes both the query and the region filter.
    pub fn matches(&self, code: Option<&CountryCode>, directory: &CountryDirectory) -> bool {
        let (name, region) = match code {
            Some(c) => (directory.name_of(c), directory.region_of(c)),
            None => ("", None),
        };
        let matches_query = self.query.is_empty()
            || name.to_lowercase().contains(&self.query)
            || code.is_some_and(|c| c.as_str().contains(&self.query));
        let matches_region = match self.region {
            None => true,
            Some(r) => region == Some(r),
        };
        matches_query && matches_region
    }

    /// Fill for matching, unselected elements.
    fn match_color(&self, palette: &Palette) -> Color {
        match self.region {
            Some(r) => r.accent(),
            None => palette.highlight,
        }
    }
}

/// What a single element should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualOutcome {
    /// Default fill, fully visible.
    Default,
    /// Matches an active filter.
    Highlighted(Color),
    /// Fails an active filter: faded and not clickable.
    Dimmed,
    /// The current selection; never dimmed, always keeps the selection color.
    Selected,
}

/// Concrete style for a [`VisualOutcome`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStyle {
    pub fill: Color,
    pub opacity: f32,
    pub interactive: bool,
}

impl VisualOutcome {
    pub fn style(&self, palette: &Palette) -> ElementStyle {
        let (fill, opacity, interactive) = match *self {
            VisualOutcome::Default => (palette.default, FULL_OPACITY, true),
            VisualOutcome::Highlighted(c) => (c, FULL_OPACITY, true),
            VisualOutcome::Dimmed => (palette.default, DIMMED_OPACITY, false),
            VisualOutcome::Selected => (palette.selected, FULL_OPACITY, true),
        };
        ElementStyle {
            fill,
            opacity,
            interactive,
        }
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(self, VisualOutcome::Dimmed)
    }
}

/// Result of one filter pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOutcome {
    /// One entry per element, same order as the input.
    pub outcomes: Vec<VisualOutcome>,
    /// Elements passing the filter (the selection included).
    pub matches: usize,
}

/// Compute the visual outcome of every element.
pub fn compute_outcomes<E: VisualElement>(
    elements: &[E],
    filter: &FilterState,
    directory: &CountryDirectory,
    selection: &Selection,
    palette: &Palette,
) -> FilterOutcome {
    if filter.is_empty() {
        let outcomes = (0..elements.len())
            .map(|i| {
                if selection.is_element(i) {
                    VisualOutcome::Selected
                } else {
                    VisualOutcome::Default
                }
            })
            .collect();
        return FilterOutcome {
            outcomes,
            matches: elements.len(),
        };
    }

    let highlight = filter.match_color(palette);
    let mut matches = 0;
    let outcomes = elements
        .iter()
        .enumerate()
        .map(|(i, el)| {
            let code = el.identifier();
            let is_match = filter.matches(code.as_ref(), directory);
            if is_match {
                matches += 1;
            }
            match (selection.is_element(i), is_match) {
                (true, _) => VisualOutcome::Selected,
                (false, true) => VisualOutcome::Highlighted(highlight),
                (false, false) => VisualOutcome::Dimmed,
            }
        })
        .collect();

    log::debug!(
        "filters: search={:?}, region={:?} - {} matches",
        filter.query(),
        filter.region().map(|r| r.label()).unwrap_or(""),
        matches
    );
    FilterOutcome { outcomes, matches }
}

/// Push computed outcomes onto the elements.
pub fn apply_outcomes<E: VisualElement>(
    elements: &mut [E],
    outcomes: &[VisualOutcome],
    palette: &Palette,
) {
    for (el, outcome) in elements.iter_mut().zip(outcomes) {
        let style = outcome.style(palette);
        el.set_fill_color(style.fill);
        el.set_opacity(style.opacity);
        el.set_interactive(style.interactive);
    }
}
