use crate::analyzer::stats::{annualized_volatility, pearson_correlation, round_to};
use crate::config::AnalysisConfig;
use crate::model::{
    AnalysisError, EventCategory, EventImpactReport, EventOutcome, ImpactResult, MarketEvent,
    MergedRow, MergedTable, SkipReason,
};
use crate::utils::{format_optional, parse_date};
use chrono::Days;
use tracing::{error, info, warn};

const DECIMALS: i32 = 4;

/// Measures pre/post correlation and volatility around every configured event.
/// Events are handled one at a time; a skipped or failed event never stops the batch.
pub fn analyze_event_impact(
    table: &MergedTable,
    events: &[EventCategory],
    cfg: &AnalysisConfig,
) -> Result<EventImpactReport, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    info!(
        "Event impact analysis ({} days before/after each event)",
        cfg.window_days
    );

    let mut report = EventImpactReport::default();
    for category in events {
        for date_str in &category.dates {
            let outcome = analyze_one(table, &category.event_type, date_str, cfg);
            match &outcome {
                EventOutcome::Analyzed(r) => info!(
                    "{} {}: corr {} -> {}, vol {} -> {}",
                    r.event_type,
                    r.date,
                    format_optional(r.pre_corr),
                    format_optional(r.post_corr),
                    format_optional(r.pre_vol),
                    format_optional(r.post_vol)
                ),
                EventOutcome::Skipped { date, reason, .. } => warn!("[Skip] {}: {}", date, reason),
                EventOutcome::Failed { date, detail, .. } => error!("[Error] {}: {}", date, detail),
            }
            report.outcomes.push(outcome);
        }
    }

    Ok(report)
}

fn analyze_one(
    table: &MergedTable,
    event_type: &str,
    date_str: &str,
    cfg: &AnalysisConfig,
) -> EventOutcome {
    let Some(date) = parse_date(date_str) else {
        return EventOutcome::Failed {
            event_type: event_type.to_string(),
            date: date_str.to_string(),
            detail: format!("cannot parse event date {:?}", date_str),
        };
    };
    let event = MarketEvent {
        event_type: event_type.to_string(),
        date,
    };

    match measure(table, &event, cfg) {
        Ok(Ok(result)) => EventOutcome::Analyzed(result),
        Ok(Err(reason)) => EventOutcome::Skipped {
            event_type: event.event_type,
            date: date_str.to_string(),
            reason,
        },
        Err(e) => EventOutcome::Failed {
            event_type: event.event_type,
            date: date_str.to_string(),
            detail: e.to_string(),
        },
    }
}

/// Outer `Err` is a computation failure, inner `Err` a reasoned skip.
fn measure(
    table: &MergedTable,
    event: &MarketEvent,
    cfg: &AnalysisConfig,
) -> Result<Result<ImpactResult, SkipReason>, AnalysisError> {
    let (min, max) = match (table.min_date(), table.max_date()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(AnalysisError::EmptyTable),
    };
    if event.date < min || event.date > max {
        return Ok(Err(SkipReason::OutOfRange { min, max }));
    }

    // calendar-day windows, both sides include the event date
    let span = Days::new(u64::from(cfg.window_days));
    let pre_start = event
        .date
        .checked_sub_days(span)
        .ok_or(AnalysisError::WindowOverflow(event.date))?;
    let post_end = event
        .date
        .checked_add_days(span)
        .ok_or(AnalysisError::WindowOverflow(event.date))?;

    let pre = table.slice_dates(pre_start, event.date);
    let post = table.slice_dates(event.date, post_end);

    if pre.len() < cfg.min_samples || post.len() < cfg.min_samples {
        return Ok(Err(SkipReason::InsufficientData {
            pre_rows: pre.len(),
            post_rows: post.len(),
            required: cfg.min_samples,
        }));
    }

    let pre_corr = price_correlation(pre).map(|c| round_to(c, DECIMALS));
    let post_corr = price_correlation(post).map(|c| round_to(c, DECIMALS));
    let pre_vol = return_volatility(pre, cfg.annualization_days).map(|v| round_to(v, DECIMALS));
    let post_vol = return_volatility(post, cfg.annualization_days).map(|v| round_to(v, DECIMALS));

    Ok(Ok(ImpactResult {
        event_type: event.event_type.clone(),
        date: event.date,
        pre_corr,
        post_corr,
        corr_change: delta(pre_corr, post_corr),
        pre_vol,
        post_vol,
        vol_change: delta(pre_vol, post_vol),
    }))
}

fn price_correlation(rows: &[MergedRow]) -> Option<f64> {
    let krw: Vec<f64> = rows.iter().map(|r| r.krw).collect();
    let jpy: Vec<f64> = rows.iter().map(|r| r.jpy).collect();
    pearson_correlation(&krw, &jpy)
}

fn return_volatility(rows: &[MergedRow], periods_per_year: f64) -> Option<f64> {
    let returns: Vec<f64> = rows.iter().filter_map(|r| r.krw_ret).collect();
    annualized_volatility(&returns, periods_per_year)
}

fn delta(pre: Option<f64>, post: Option<f64>) -> Option<f64> {
    Some(round_to(post? - pre?, DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::stats::pct_change;
    use approx::assert_relative_eq;
    use chrono::{Datelike, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Consecutive calendar days with the given prices.
    fn table_from(krw: &[f64], jpy: &[f64]) -> MergedTable {
        let krw_ret = pct_change(krw);
        let jpy_ret = pct_change(jpy);
        let rows = (0..krw.len())
            .map(|i| MergedRow {
                date: start() + Days::new(i as u64),
                krw: krw[i],
                jpy: jpy[i],
                krw_ret: krw_ret[i],
                jpy_ret: jpy_ret[i],
                krw_ma20: None,
                krw_ma60: None,
            })
            .collect();
        MergedTable::new(rows)
    }

    fn linear_table(days: usize) -> MergedTable {
        let krw: Vec<f64> = (0..days).map(|i| 1300.0 + i as f64 * 2.0 + (i % 3) as f64).collect();
        let jpy: Vec<f64> = krw.iter().map(|k| k - 1150.0).collect();
        table_from(&krw, &jpy)
    }

    fn events(event_type: &str, dates: &[&str]) -> Vec<EventCategory> {
        vec![EventCategory {
            event_type: event_type.into(),
            dates: dates.iter().map(|d| d.to_string()).collect(),
        }]
    }

    #[test]
    fn perfectly_correlated_event_has_no_correlation_change() {
        let table = linear_table(40);
        let event_date = table.rows[20].date.to_string();
        let events = events("RATE_CHECK", &[event_date.as_str()]);
        let report = analyze_event_impact(&table, &events, &AnalysisConfig::default()).unwrap();
        let results = report.results();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.pre_corr, Some(1.0));
        assert_eq!(r.post_corr, Some(1.0));
        assert_eq!(r.corr_change, Some(0.0));
        let (pre_vol, post_vol) = (r.pre_vol.unwrap(), r.post_vol.unwrap());
        assert_relative_eq!(r.vol_change.unwrap(), post_vol - pre_vol, epsilon = 1e-9);
    }

    #[test]
    fn event_before_table_start_is_skipped_quietly() {
        let table = linear_table(40);
        let day_before = (start() - Days::new(1)).to_string();
        let events = events("NPS_MEETING", &[day_before.as_str()]);
        let report = analyze_event_impact(&table, &events, &AnalysisConfig::default()).unwrap();
        assert!(report.results().is_empty());
        assert!(matches!(
            &report.outcomes[0],
            EventOutcome::Skipped { reason: SkipReason::OutOfRange { .. }, .. }
        ));
    }

    #[test]
    fn event_after_table_end_is_skipped() {
        let table = linear_table(40);
        let events = events("NPS_MEETING", &["2030-01-01"]);
        let report = analyze_event_impact(&table, &events, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn thin_pre_window_is_insufficient() {
        let table = linear_table(40);
        let third_row = table.rows[2].date.to_string();
        let events = events("RATE_CHECK", &[third_row.as_str()]);
        let report = analyze_event_impact(&table, &events, &AnalysisConfig::default()).unwrap();
        assert!(report.results().is_empty());
        assert_eq!(
            report.outcomes[0],
            EventOutcome::Skipped {
                event_type: "RATE_CHECK".into(),
                date: third_row,
                reason: SkipReason::InsufficientData {
                    pre_rows: 3,
                    post_rows: 15,
                    required: 5,
                },
            }
        );
    }

    #[test]
    fn minimum_sample_threshold_is_configurable() {
        let table = linear_table(40);
        let third_row = table.rows[2].date.to_string();
        let cfg = AnalysisConfig {
            min_samples: 3,
            ..AnalysisConfig::default()
        };
        let events = events("RATE_CHECK", &[third_row.as_str()]);
        let report = analyze_event_impact(&table, &events, &cfg).unwrap();
        assert_eq!(report.results().len(), 1);
    }

    #[test]
    fn no_events_is_an_empty_report() {
        let table = linear_table(40);
        let report = analyze_event_impact(&table, &[], &AnalysisConfig::default()).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.results().is_empty());
    }

    #[test]
    fn bad_date_fails_only_that_event() {
        let table = linear_table(40);
        let good = table.rows[20].date.to_string();
        let report = analyze_event_impact(
            &table,
            &events("RATE_CHECK", &["2024-02-31", good.as_str()]),
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].date.to_string(), good);
    }

    #[test]
    fn flat_jpy_window_gives_undefined_correlation() {
        let krw: Vec<f64> = (0..30).map(|i| 1300.0 + i as f64).collect();
        let jpy = vec![140.0; 30];
        let table = table_from(&krw, &jpy);
        let date = table.rows[15].date.to_string();
        let events = events("RATE_CHECK", &[date.as_str()]);
        let report = analyze_event_impact(&table, &events, &AnalysisConfig::default()).unwrap();
        let r = &report.results()[0];
        assert_eq!(r.pre_corr, None);
        assert_eq!(r.post_corr, None);
        assert_eq!(r.corr_change, None);
        assert!(r.pre_vol.is_some());
    }

    #[test]
    fn windows_are_calendar_days_not_rows() {
        // weekdays only: 14 calendar days around a Monday hold 11 trading rows, not 15
        let mut krw = Vec::new();
        let mut dates = Vec::new();
        let mut date = start();
        while dates.len() < 40 {
            if date.weekday().number_from_monday() <= 5 {
                dates.push(date);
                krw.push(1300.0 + dates.len() as f64 * 1.5 + (dates.len() % 4) as f64);
            }
            date = date + Days::new(1);
        }
        let krw_ret = pct_change(&krw);
        let rows = dates
            .iter()
            .zip(&krw)
            .zip(krw_ret)
            .map(|((date, k), ret)| MergedRow {
                date: *date,
                krw: *k,
                jpy: k / 9.0,
                krw_ret: ret,
                jpy_ret: ret,
                krw_ma20: None,
                krw_ma60: None,
            })
            .collect();
        let table = MergedTable::new(rows);
        let monday = table.rows[20].date;
        assert_eq!(monday.weekday(), chrono::Weekday::Mon);
        let events = events("RATE_CHECK", &[monday.to_string().as_str()]);

        let strict = AnalysisConfig {
            min_samples: 12,
            ..AnalysisConfig::default()
        };
        let report = analyze_event_impact(&table, &events, &strict).unwrap();
        assert!(matches!(
            &report.outcomes[0],
            EventOutcome::Skipped {
                reason: SkipReason::InsufficientData {
                    pre_rows: 11,
                    post_rows: 11,
                    required: 12,
                },
                ..
            }
        ));

        let enough = AnalysisConfig {
            min_samples: 11,
            ..AnalysisConfig::default()
        };
        let report = analyze_event_impact(&table, &events, &enough).unwrap();
        assert_eq!(report.results().len(), 1);
    }

    #[test]
    fn empty_table_is_an_error() {
        let result = analyze_event_impact(&MergedTable::default(), &[], &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::EmptyTable)));
    }
}
