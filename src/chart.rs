//! Chart data for the indicator trend and a text-free SVG sparkline.
//!
//! The full chart widget lives outside this crate; it receives [`ChartData`]
//! and formats its y-axis with [`compact_tick`].

use crate::models::IndicatorSeries;
use anyhow::{Result, anyhow};
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Line color of the trend (indigo, rgb(99, 102, 241)).
const TREND: RGBColor = RGBColor(99, 102, 241);

/// Labels and values ready for a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub label: String,
}

impl ChartData {
    /// Points with a value, in series order. `None` if none remain.
    pub fn from_series(series: &IndicatorSeries, label: &str) -> Option<Self> {
        let (labels, values): (Vec<String>, Vec<f64>) = series
            .points
            .iter()
            .filter_map(|p| p.value.map(|v| (p.period.clone(), v)))
            .unzip();
        if labels.is_empty() {
            return None;
        }
        Some(Self {
            labels,
            values,
            label: label.to_string(),
        })
    }

    pub fn latest(&self) -> Option<(&str, f64)> {
        self.labels
            .last()
            .zip(self.values.last())
            .map(|(l, v)| (l.as_str(), *v))
    }
}

/// Axis tick text: `1.5B`, `-2.0M`, `3.4K`, plain below a thousand in magnitude.
pub fn compact_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1.0e9 {
        format!("{:.1}B", value / 1.0e9)
    } else if magnitude >= 1.0e6 {
        format!("{:.1}M", value / 1.0e6)
    } else if magnitude >= 1.0e3 {
        format!("{:.1}K", value / 1.0e3)
    } else {
        // Format up to 4 decimals, then trim trailing zeros and trailing dot.
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Whole-number value with thousands separators (`30,000`).
pub fn format_whole(value: f64, locale: &Locale) -> String {
    if !value.is_finite() {
        return "NA".to_string();
    }
    let n = value.round() as i64;
    n.to_formatted_string(locale)
}

/// Render `data` as an area sparkline without axes or text.
pub fn render_sparkline_svg<P: AsRef<Path>>(
    data: &ChartData,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if data.values.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let (mut min_val, mut max_val) = (
        data.values.iter().cloned().fold(f64::INFINITY, f64::min),
        data.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    if (max_val - min_val).abs() < f64::EPSILON {
        min_val -= 1.0;
        max_val += 1.0;
    }
    let last_x = (data.values.len() as i32 - 1).max(1);

    let root = SVGBackend::new(out_path.as_ref(), (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(4)
        .build_cartesian_2d(0..last_x, min_val..max_val)?;

    let pts: Vec<(i32, f64)> = data
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as i32, *v))
        .collect();
    chart.draw_series(
        AreaSeries::new(pts.clone(), min_val, TREND.mix(0.1)).border_style(TREND.stroke_width(2)),
    )?;
    chart.draw_series(LineSeries::new(pts, TREND.stroke_width(2)))?;
    root.present()?;
    Ok(())
}
