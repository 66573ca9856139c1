use crate::analyzer::stats::{rolling_mean, rolling_std_dev};
use crate::config::ChartConfig;
use crate::model::{EventCategory, ImpactResult, MergedTable, RenderError};
use crate::utils::parse_date;
use crate::visualizer::svg::{
    escape, extent, label, legend, line, polyline, rect, scale_y, svg_footer, svg_header,
    time_axis, x_positions, y_axis, HEIGHT, PADDING, WIDTH,
};

const KRW_COLOR: &str = "navy";
const PRE_COLOR: &str = "#6788ee";
const POST_COLOR: &str = "#e26952";

/// USD/KRW close with a dashed marker at every event inside the covered range.
pub fn trend_with_events(
    table: &MergedTable,
    events: &[EventCategory],
    chart: &ChartConfig,
) -> Result<String, RenderError> {
    let (Some(first), Some(last)) = (table.min_date(), table.max_date()) else {
        return Err(RenderError::NoData("merged table is empty"));
    };
    let prices = table.krw_prices();
    let (min_v, max_v) = extent(&prices).ok_or(RenderError::NoData("no finite prices"))?;
    let xs = x_positions(prices.len());
    let dates = table.dates();

    let mut svg = svg_header("Impact of Policy Events on USD/KRW Exchange Rate");
    svg.push_str(&y_axis(min_v, max_v, 0));

    let points: Vec<(f64, Option<f64>)> = xs
        .iter()
        .zip(&prices)
        .map(|(x, p)| (*x, Some(scale_y(*p, min_v, max_v))))
        .collect();
    svg.push_str(&polyline(&points, KRW_COLOR, 1.5, false));

    for category in events {
        let color = chart.color_for(&category.event_type);
        for date in category.dates.iter().filter_map(|d| parse_date(d)) {
            if date < first || date > last {
                continue;
            }
            // nearest row on or after the event date
            let idx = dates.partition_point(|d| *d < date).min(xs.len() - 1);
            let x = xs[idx];
            svg.push_str(&line(x, PADDING, x, HEIGHT - PADDING, color, true));
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" transform="rotate(90 {x:.2} {y:.2})" fill="{color}" font-weight="bold" font-size="9">{text}</text>"#,
                x = x + 3.0,
                y = PADDING + 4.0,
                color = color,
                text = escape(&category.event_type)
            ));
        }
    }

    svg.push_str(&time_axis(&dates, &xs));
    svg.push_str(&legend(&[("USD/KRW", KRW_COLOR)]));
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Grouped pre/post correlation bars per event on a fixed [-1, 1] scale.
/// `None` when there is nothing to draw.
pub fn correlation_change(results: &[ImpactResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let (min_v, max_v) = (-1.0, 1.0);
    let slot = (WIDTH - 2.0 * PADDING) / results.len() as f64;
    let bar_w = slot * 0.35;

    let mut svg = svg_header("Changes in KRW-JPY Correlation (Pre vs Post Event)");
    svg.push_str(&y_axis(min_v, max_v, 1));

    let zero_y = scale_y(0.0, min_v, max_v);
    for (i, result) in results.iter().enumerate() {
        let center = PADDING + slot * (i as f64 + 0.5);
        for (value, x, color) in [
            (result.pre_corr, center - bar_w, PRE_COLOR),
            (result.post_corr, center, POST_COLOR),
        ] {
            let Some(value) = value else { continue };
            let y = scale_y(value.clamp(min_v, max_v), min_v, max_v);
            svg.push_str(&rect(x, y.min(zero_y), bar_w, (y - zero_y).abs(), color));
        }
        svg.push_str(&label(center, HEIGHT - PADDING + 16.0, &result.date.to_string(), "middle"));
        svg.push_str(&label(center, HEIGHT - PADDING + 30.0, &result.event_type, "middle"));
    }

    svg.push_str(&line(PADDING, zero_y, WIDTH - PADDING, zero_y, "#000", false));
    svg.push_str(&legend(&[("Pre_Corr", PRE_COLOR), ("Post_Corr", POST_COLOR)]));
    svg.push_str(svg_footer());
    Some(svg)
}

/// Close with a `window`-day moving average band of ±`k` rolling sample deviations.
pub fn bollinger_bands(table: &MergedTable, window: usize, k: f64) -> Result<String, RenderError> {
    if table.is_empty() {
        return Err(RenderError::NoData("merged table is empty"));
    }
    let prices = table.krw_prices();
    let ma = rolling_mean(&prices, window);
    let sd = rolling_std_dev(&prices, window);
    let upper: Vec<Option<f64>> =
        ma.iter().zip(&sd).map(|(m, s)| Some((*m)? + k * (*s)?)).collect();
    let lower: Vec<Option<f64>> =
        ma.iter().zip(&sd).map(|(m, s)| Some((*m)? - k * (*s)?)).collect();

    let all: Vec<f64> = prices
        .iter()
        .copied()
        .chain(upper.iter().flatten().copied())
        .chain(lower.iter().flatten().copied())
        .collect();
    let (min_v, max_v) = extent(&all).ok_or(RenderError::NoData("no finite prices"))?;
    let xs = x_positions(prices.len());
    let scaled = |series: &[Option<f64>]| -> Vec<(f64, Option<f64>)> {
        xs.iter()
            .zip(series)
            .map(|(x, v)| (*x, v.map(|v| scale_y(v, min_v, max_v))))
            .collect()
    };

    let mut svg = svg_header(&format!("Bollinger Bands ({} Days) - Volatility Check", window));
    svg.push_str(&y_axis(min_v, max_v, 0));

    // shaded band between upper and lower where both are defined
    let band: Vec<(f64, f64, f64)> = xs
        .iter()
        .zip(upper.iter().zip(&lower))
        .filter_map(|(x, (u, l))| {
            Some((*x, scale_y((*u)?, min_v, max_v), scale_y((*l)?, min_v, max_v)))
        })
        .collect();
    if !band.is_empty() {
        let outline = band
            .iter()
            .map(|(x, u, _)| format!("{x:.2},{u:.2}"))
            .chain(band.iter().rev().map(|(x, _, l)| format!("{x:.2},{l:.2}")))
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(r#"<polygon fill="gray" fill-opacity="0.1" points="{outline}" />"#));
    }

    svg.push_str(&polyline(&scaled(&upper), "red", 1.0, true));
    svg.push_str(&polyline(&scaled(&lower), "red", 1.0, true));
    let close: Vec<Option<f64>> = prices.iter().map(|p| Some(*p)).collect();
    svg.push_str(&polyline(&scaled(&close), KRW_COLOR, 1.5, false));

    svg.push_str(&time_axis(&table.dates(), &xs));
    svg.push_str(&legend(&[("Upper Band", "red"), ("Lower Band", "red"), ("USD/KRW", KRW_COLOR)]));
    svg.push_str(svg_footer());
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MergedRow;
    use chrono::{Days, NaiveDate};

    fn table(days: usize) -> MergedTable {
        let start = NaiveDate::from_ymd_opt(2023, 9, 20).unwrap();
        MergedTable::new(
            (0..days)
                .map(|i| MergedRow {
                    date: start + Days::new(i as u64),
                    krw: 1300.0 + (i % 7) as f64 * 3.0,
                    jpy: 148.0 + (i % 5) as f64,
                    krw_ret: None,
                    jpy_ret: None,
                    krw_ma20: None,
                    krw_ma60: None,
                })
                .collect(),
        )
    }

    #[test]
    fn trend_marks_only_events_in_range() {
        let events = vec![EventCategory {
            event_type: "RATE_CHECK".into(),
            dates: vec!["2023-10-04".into(), "2024-04-16".into(), "garbage".into()],
        }];
        let svg = trend_with_events(&table(30), &events, &ChartConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches(">RATE_CHECK</text>").count(), 1);
        assert!(svg.contains(r#"stroke="red""#));
    }

    #[test]
    fn correlation_chart_skips_empty_results() {
        assert!(correlation_change(&[]).is_none());
    }

    #[test]
    fn correlation_chart_draws_defined_bars() {
        let result = ImpactResult {
            event_type: "NPS_MEETING".into(),
            date: NaiveDate::from_ymd_opt(2023, 4, 13).unwrap(),
            pre_corr: Some(0.62),
            post_corr: None,
            corr_change: None,
            pre_vol: Some(0.05),
            post_vol: Some(0.07),
            vol_change: Some(0.02),
        };
        let svg = correlation_change(&[result]).unwrap();
        assert_eq!(svg.matches(&format!(r#"fill="{}""#, PRE_COLOR)).count(), 2); // bar + legend
        assert_eq!(svg.matches(&format!(r#"fill="{}""#, POST_COLOR)).count(), 1); // legend only
        assert!(svg.contains("2023-04-13"));
    }

    #[test]
    fn bollinger_band_starts_after_window() {
        let svg = bollinger_bands(&table(45), 20, 2.0).unwrap();
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("Bollinger Bands (20 Days)"));
        assert!(bollinger_bands(&MergedTable::default(), 20, 2.0).is_err());
    }

    #[test]
    fn bollinger_with_short_history_has_no_band() {
        let svg = bollinger_bands(&table(10), 20, 2.0).unwrap();
        assert!(!svg.contains("<polygon"));
    }
}
