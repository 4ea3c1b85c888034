/// Symmetric mean absolute percentage error in percent.
///
/// Pairs where both values are zero contribute nothing. Only the common prefix of the
/// two slices is compared; an empty comparison yields `NaN`.
///
/// ```
/// use ehyd::model::metrics::smape;
///
/// assert_eq!(smape(&[100.0, 0.0], &[100.0, 0.0]), 0.0);
/// assert!((smape(&[100.0], &[110.0]) - 9.5238).abs() < 1e-3);
/// ```
pub fn smape(actual: &[f64], forecast: &[f64]) -> f64 {
    let n = actual.len().min(forecast.len());
    if n == 0 {
        return f64::NAN;
    }
    let total: f64 = actual
        .iter()
        .zip(forecast)
        .map(|(a, f)| {
            let denominator = a.abs() + f.abs();
            if denominator == 0.0 {
                0.0
            } else {
                2.0 * (a - f).abs() / denominator
            }
        })
        .sum();
    100.0 * total / n as f64
}

pub fn mae(actual: &[f64], forecast: &[f64]) -> f64 {
    let n = actual.len().min(forecast.len());
    if n == 0 {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(forecast)
        .map(|(a, f)| (a - f).abs())
        .sum::<f64>()
        / n as f64
}

pub fn rmse(actual: &[f64], forecast: &[f64]) -> f64 {
    let n = actual.len().min(forecast.len());
    if n == 0 {
        return f64::NAN;
    }
    (actual
        .iter()
        .zip(forecast)
        .map(|(a, f)| (a - f).powi(2))
        .sum::<f64>()
        / n as f64)
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn smape_values() {
        assert_relative_eq!(smape(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        // 2 * 1 / 3 per pair
        assert_relative_eq!(smape(&[1.0, 1.0], &[2.0, 2.0]), 200.0 / 3.0, epsilon = 1e-12);
        // opposite signs hit the 200% ceiling
        assert_relative_eq!(smape(&[1.0], &[-1.0]), 200.0);
        assert_relative_eq!(smape(&[0.0, 4.0], &[0.0, 4.0]), 0.0);
        assert!(smape(&[], &[]).is_nan());
    }

    #[test]
    fn mae_and_rmse() {
        assert_relative_eq!(mae(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]), 1.0);
        assert_relative_eq!(rmse(&[0.0, 0.0], &[3.0, 4.0]), (12.5f64).sqrt());
    }
}
