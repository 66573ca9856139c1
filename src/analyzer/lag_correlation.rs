use crate::analyzer::stats::pearson_correlation;
use crate::model::{LagAnalysis, LagCorrelation, MergedTable};
use crate::utils::format_optional;
use tracing::{info, warn};

/// Cross-correlation of KRW returns against JPY returns shifted `0..=max_lag` rows back.
/// A positive lag tests whether JPY moves lead KRW moves by that many trading days.
pub fn analyze_lag_correlation(table: &MergedTable, max_lag: usize) -> LagAnalysis {
    info!("Lag correlation analysis (lag 0 ~ {})", max_lag);

    let required = max_lag.saturating_add(2);
    if table.len() < required {
        warn!(
            "[Skip] lag analysis needs {} rows, table has {}",
            required,
            table.len()
        );
        return LagAnalysis::InsufficientData {
            rows: table.len(),
            required,
        };
    }

    let profile: Vec<LagCorrelation> = (0..=max_lag)
        .map(|lag| {
            let correlation = lagged_correlation(table, lag);
            info!("Lag {}: {}", lag, format_optional(correlation));
            LagCorrelation { lag, correlation }
        })
        .collect();

    LagAnalysis::Profile(profile)
}

fn lagged_correlation(table: &MergedTable, lag: usize) -> Option<f64> {
    let rows = &table.rows;
    let (krw, jpy): (Vec<f64>, Vec<f64>) = (lag..rows.len())
        .filter_map(|i| Some((rows[i].krw_ret?, rows[i - lag].jpy_ret?)))
        .unzip();
    pearson_correlation(&krw, &jpy)
}
