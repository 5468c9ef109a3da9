//! Map asset loading.
//!
//! The map is an externally supplied SVG document. Only the `id` attribute of
//! each shape is read; path geometry is never parsed.

use crate::element::{Palette, ShapeElement};
use crate::error::ExplorerError;
use crate::models::CountryCode;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;
use std::path::Path;

/// Elements that can carry a country shape.
const SHAPE_TAGS: [&[u8]; 3] = [b"path", b"polygon", b"g"];

/// Identified shapes of a loaded map, in document order.
#[derive(Debug, Clone, Default)]
pub struct MapAsset {
    pub shapes: Vec<ShapeElement>,
}

fn asset_error(e: impl std::fmt::Display) -> ExplorerError {
    ExplorerError::AssetLoadFailure(format!("malformed SVG: {e}"))
}

/// Country code in the `id` attribute of a shape element, if any.
fn shape_code(e: &BytesStart<'_>) -> Result<Option<CountryCode>, ExplorerError> {
    if !SHAPE_TAGS.contains(&e.local_name().as_ref()) {
        return Ok(None);
    }
    let Some(attr) = e.try_get_attribute("id").map_err(asset_error)? else {
        return Ok(None);
    };
    let id = attr.unescape_value().map_err(asset_error)?;
    Ok(CountryCode::parse(&id).ok())
}

impl MapAsset {
    /// Collect every rendered shape whose `id` is a two-letter country code.
    ///
    /// Comments, CDATA and anything under `<defs>` are not rendered and are
    /// skipped. Duplicate ids keep their first occurrence.
    pub fn from_svg(svg: &str, palette: &Palette) -> Result<Self, ExplorerError> {
        let mut reader = Reader::from_str(svg);
        let mut saw_svg = false;
        let mut defs_depth = 0usize;
        let mut seen = HashSet::new();
        let mut shapes = Vec::new();
        loop {
            let event = reader.read_event().map_err(asset_error)?;
            let (start, is_empty) = match &event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(e) => {
                    if e.local_name().as_ref() == b"defs" {
                        defs_depth = defs_depth.saturating_sub(1);
                    }
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };
            match start.local_name().as_ref() {
                b"svg" => saw_svg = true,
                b"defs" if !is_empty => defs_depth += 1,
                _ => {}
            }
            if defs_depth > 0 {
                continue;
            }
            if let Some(code) = shape_code(start)?
                && seen.insert(code.clone())
            {
                shapes.push(ShapeElement::new(Some(code), palette.default));
            }
        }
        if !saw_svg {
            return Err(ExplorerError::AssetLoadFailure(
                "document is not an SVG image".into(),
            ));
        }
        log::info!("found {} country shapes", shapes.len());
        Ok(Self { shapes })
    }

    /// Read and parse an SVG file. Any failure is an [`ExplorerError::AssetLoadFailure`].
    pub fn load<P: AsRef<Path>>(path: P, palette: &Palette) -> Result<Self, ExplorerError> {
        let path = path.as_ref();
        let svg = std::fs::read_to_string(path).map_err(|e| {
            log::error!("error loading map {}: {e}", path.display());
            ExplorerError::AssetLoadFailure(format!("{}: {e}", path.display()))
        })?;
        Self::from_svg(&svg, palette)
    }

    /// Synthetic map with one shape per code, for callers without an SVG.
    pub fn from_codes<I>(codes: I, palette: &Palette) -> Self
    where
        I: IntoIterator<Item = CountryCode>,
    {
        Self {
            shapes: codes
                .into_iter()
                .map(|c| ShapeElement::new(Some(c), palette.default))
                .collect(),
        }
    }
}
