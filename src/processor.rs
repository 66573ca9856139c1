use crate::analyzer::stats::{pct_change, rolling_mean};
use crate::config::{MergeConfig, Tickers};
use crate::model::{MergedRow, MergedTable, PipelineError, PriceSeries, ProcessError};
use crate::parser::{Parser, PriceTableParser};
use crate::storage::FlatFileStorage;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

/// Outer-joins the two series on date, forward-fills gaps, drops rows still missing a price
/// and derives returns and moving averages.
pub fn merge_series(
    krw: &PriceSeries,
    jpy: &PriceSeries,
    cfg: &MergeConfig,
) -> Result<MergedTable, ProcessError> {
    let mut joined: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for p in &krw.points {
        joined.entry(p.date).or_default().0 = Some(p.close);
    }
    for p in &jpy.points {
        joined.entry(p.date).or_default().1 = Some(p.close);
    }

    let mut last_krw = None;
    let mut last_jpy = None;
    let mut dates = Vec::with_capacity(joined.len());
    let mut krw_prices = Vec::with_capacity(joined.len());
    let mut jpy_prices = Vec::with_capacity(joined.len());
    for (date, (k, j)) in joined {
        last_krw = k.or(last_krw);
        last_jpy = j.or(last_jpy);
        // leading rows before both series start stay empty after forward-fill
        if let (Some(k), Some(j)) = (last_krw, last_jpy) {
            dates.push(date);
            krw_prices.push(k);
            jpy_prices.push(j);
        }
    }

    if dates.is_empty() {
        return Err(ProcessError::EmptyMerge);
    }

    let krw_ret = pct_change(&krw_prices);
    let jpy_ret = pct_change(&jpy_prices);
    let ma_short = rolling_mean(&krw_prices, cfg.short_ma);
    let ma_long = rolling_mean(&krw_prices, cfg.long_ma);

    let rows = (0..dates.len())
        .map(|i| MergedRow {
            date: dates[i],
            krw: krw_prices[i],
            jpy: jpy_prices[i],
            krw_ret: krw_ret[i],
            jpy_ret: jpy_ret[i],
            krw_ma20: ma_short[i],
            krw_ma60: ma_long[i],
        })
        .collect();

    Ok(MergedTable::new(rows))
}

/// Loads both raw tables, merges them and persists the merged table.
pub fn load_and_merge(
    storage: &FlatFileStorage,
    tickers: &Tickers,
    cfg: &MergeConfig,
) -> Result<MergedTable, PipelineError> {
    info!("Merging raw tables...");
    let parser = PriceTableParser::new();

    let krw = parser.parse(&tickers.krw.name, &storage.load_raw_text(&tickers.krw.name)?);
    let jpy = parser.parse(&tickers.jpy.name, &storage.load_raw_text(&tickers.jpy.name)?);
    for series in [&krw, &jpy] {
        if series.is_empty() {
            return Err(ProcessError::EmptySeries(series.name.clone()).into());
        }
    }

    let table = merge_series(&krw, &jpy, cfg)?;
    let path = storage.save_merged(&table)?;

    info!("Merged table saved: {}", path.display());
    if let (Some(min), Some(max)) = (table.min_date(), table.max_date()) {
        info!(" > Period: {} ~ {}", min, max);
    }
    info!(" > Rows: {}", table.len());

    Ok(table)
}
