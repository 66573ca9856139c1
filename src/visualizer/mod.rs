pub mod charts;
pub mod svg;

use crate::config::AppConfig;
use crate::model::{PipelineError, RenderError};
use crate::storage::FlatFileStorage;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub const TREND_CHART: &str = "1_trend_with_events.svg";
pub const CORRELATION_CHART: &str = "2_correlation_change.svg";
pub const BOLLINGER_CHART: &str = "3_bollinger_bands.svg";

/// Renders every chart from the persisted tables. A missing merged table is fatal;
/// a missing or empty impact table only skips the correlation chart.
pub fn render_all(
    storage: &FlatFileStorage,
    config: &AppConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    let table = storage.load_merged()?;
    let impact = storage.load_impact()?;
    let mut written = Vec::new();

    info!(" > Drawing: Market Trend with Events...");
    let svg = charts::trend_with_events(&table, &config.events, &config.chart)?;
    written.push(write_chart(storage, TREND_CHART, &svg)?);

    match impact.as_deref() {
        Some(results) if !results.is_empty() => {
            info!(" > Drawing: Correlation Change...");
            if let Some(svg) = charts::correlation_change(results) {
                written.push(write_chart(storage, CORRELATION_CHART, &svg)?);
            }
        }
        _ => warn!("No event impact results, skipping the correlation chart"),
    }

    info!(" > Drawing: Bollinger Bands...");
    let chart = &config.chart;
    let svg = charts::bollinger_bands(&table, chart.bollinger_window, chart.bollinger_k)?;
    written.push(write_chart(storage, BOLLINGER_CHART, &svg)?);

    info!("Charts saved to {}", storage.charts_dir().display());
    Ok(written)
}

fn write_chart(storage: &FlatFileStorage, name: &str, svg: &str) -> Result<PathBuf, RenderError> {
    let path = storage.charts_dir().join(name);
    fs::write(&path, svg)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MergedRow, MergedTable};
    use chrono::{Days, NaiveDate};

    fn seeded_storage(dir: &std::path::Path) -> FlatFileStorage {
        let storage = FlatFileStorage::new(dir).unwrap();
        let start = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        let rows = (0..40)
            .map(|i| MergedRow {
                date: start + Days::new(i),
                krw: 1320.0 + (i % 4) as f64,
                jpy: 146.0 + (i % 3) as f64,
                krw_ret: None,
                jpy_ret: None,
                krw_ma20: None,
                krw_ma60: None,
            })
            .collect();
        storage.save_merged(&MergedTable::new(rows)).unwrap();
        storage
    }

    #[test]
    fn absent_impact_table_skips_one_chart() {
        let dir = tempfile::tempdir().unwrap();
        let storage = seeded_storage(dir.path());
        let written = render_all(&storage, &AppConfig::default()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(storage.charts_dir().join(TREND_CHART).exists());
        assert!(!storage.charts_dir().join(CORRELATION_CHART).exists());
        assert!(storage.charts_dir().join(BOLLINGER_CHART).exists());
    }

    #[test]
    fn empty_impact_table_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let storage = seeded_storage(dir.path());
        storage.save_impact(&[]).unwrap();
        let written = render_all(&storage, &AppConfig::default()).unwrap();
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn missing_merged_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FlatFileStorage::new(dir.path()).unwrap();
        assert!(render_all(&storage, &AppConfig::default()).is_err());
    }
}
