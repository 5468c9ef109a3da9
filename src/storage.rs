use crate::models::IndicatorSeries;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Neutralize cells a spreadsheet would evaluate as a formula.
fn safe_cell(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

/// Save a series as CSV with header, one row per observation.
pub fn save_csv<P: AsRef<Path>>(series: &IndicatorSeries, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("country", "indicator_id", "indicator_name", "period", "value"))?;
    for p in &series.points {
        wtr.serialize((
            series.country.as_str(),
            safe_cell(&series.indicator_id),
            safe_cell(&series.indicator_name),
            safe_cell(&p.period),
            p.value,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save a series as pretty JSON.
pub fn save_json<P: AsRef<Path>>(series: &IndicatorSeries, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(series)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
