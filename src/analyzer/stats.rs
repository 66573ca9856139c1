/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage change from the previous element; the first element has none.
pub fn pct_change(data: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(data.len());
    if data.is_empty() {
        return out;
    }
    out.push(None);
    for w in data.windows(2) {
        let change = (w[1] - w[0]) / w[0];
        out.push(change.is_finite().then_some(change));
    }
    out
}

/// Trailing mean over `window` elements, computed with a sliding sum.
/// The first `window - 1` positions are undefined.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if window == 0 {
        return out;
    }
    let mut sum = 0.0;
    for (i, value) in data.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= data[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Trailing sample standard deviation (n - 1) over `window` elements.
/// Undefined for windows below 2.
/// Squared deviations are summed around the window's mean, so flat stretches after
/// volatile ones come out as exactly zero rather than cancellation noise.
pub fn rolling_std_dev(data: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; data.len()];
    }
    let n = window as f64;
    rolling_mean(data, window)
        .into_iter()
        .enumerate()
        .map(|(i, mean)| {
            let mean = mean?;
            let squares: f64 = data[i + 1 - window..=i].iter().map(|v| (v - mean).powi(2)).sum();
            Some((squares / (n - 1.0)).sqrt())
        })
        .collect()
}

/// Sample standard deviation; `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Sample standard deviation of daily returns scaled by `sqrt(periods_per_year)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    sample_std_dev(returns).map(|sd| sd * periods_per_year.sqrt())
}

/// Calculates the Pearson correlation coefficient between two slices.
/// Returns None if slices have different lengths, fewer than two points,
/// or either side has zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let numerator: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| (xi - mean_x) * (yi - mean_y)).sum();
    let denominator_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let denominator_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    let denominator = (denominator_x * denominator_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some((numerator / denominator).clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rolling_mean_defined_from_window_minus_one() {
        let data: Vec<f64> = (1..=6).map(f64::from).collect();
        let ma = rolling_mean(&data, 3);
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        for i in 2..data.len() {
            let expected = data[i - 2..=i].iter().sum::<f64>() / 3.0;
            assert_relative_eq!(ma[i].unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn rolling_mean_longer_than_data_is_all_undefined() {
        assert!(rolling_mean(&[1.0, 2.0], 60).iter().all(Option::is_none));
    }

    #[test]
    fn rolling_std_matches_direct_computation() {
        let data = [1300.0, 1310.5, 1295.25, 1320.0, 1318.75, 1301.0];
        let rolling = rolling_std_dev(&data, 4);
        assert!(rolling[..3].iter().all(Option::is_none));
        for i in 3..data.len() {
            let direct = sample_std_dev(&data[i - 3..=i]).unwrap();
            assert_relative_eq!(rolling[i].unwrap(), direct, epsilon = 1e-6);
        }
    }

    #[test]
    fn rolling_std_of_flat_tail_after_noisy_history_is_zero() {
        let mut data: Vec<f64> = (0..500)
            .map(|i| 1200.0 + (i as f64 * 0.37).sin() * 85.0 + (i % 7) as f64 * 3.1)
            .collect();
        data.extend(std::iter::repeat_n(1312.37, 20));
        let rolling = rolling_std_dev(&data, 20);
        assert!(rolling[data.len() - 1].unwrap() < 1e-9);
    }

    #[test]
    fn pct_change_first_is_undefined() {
        let changes = pct_change(&[100.0, 105.0, 99.75]);
        assert_eq!(changes[0], None);
        assert_relative_eq!(changes[1].unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(changes[2].unwrap(), -0.05, epsilon = 1e-12);
    }

    #[test]
    fn correlation_of_linear_relation_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 20.0, 30.0, 40.0];
        assert_relative_eq!(pearson_correlation(&x, &y).unwrap(), 1.0, epsilon = 1e-12);
        let inv: Vec<f64> = y.iter().map(|v| -v).collect();
        assert_relative_eq!(pearson_correlation(&x, &inv).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn correlation_undefined_for_flat_or_tiny_input() {
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        assert_eq!(pearson_correlation(&[1.0], &[2.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[2.0]), None);
    }

    #[test]
    fn volatility_uses_sample_std_and_sqrt_252() {
        let returns = [0.01, -0.01, 0.02, 0.0];
        let sd = sample_std_dev(&returns).unwrap();
        // mean 0.005, squared deviations sum 0.00050, / 3
        assert_relative_eq!(sd, (0.0005f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            annualized_volatility(&returns, 252.0).unwrap(),
            sd * 252f64.sqrt(),
            epsilon = 1e-12
        );
        assert_eq!(annualized_volatility(&[0.01], 252.0), None);
    }

    #[test]
    fn round_to_four_places() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-0.98766, 4), -0.9877);
    }
}
