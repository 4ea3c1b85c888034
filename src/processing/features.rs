//! Lagged and rolling-window features of a monthly series.

/// `values` shifted forward by `k` months; the first `k` entries are `NaN`.
pub fn lag(values: &[f64], k: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| if t >= k { values[t - k] } else { f64::NAN })
        .collect()
}

/// Trailing mean over `window` values ending at each position.
///
/// `NaN` until a full window is available and wherever the window holds a `NaN`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    (0..values.len())
        .map(|t| {
            if t + 1 < window {
                return f64::NAN;
            }
            values[t + 1 - window..=t].iter().sum::<f64>() / window as f64
        })
        .collect()
}

/// The two derived features every augmented column gets.
#[derive(Debug, Clone, PartialEq)]
pub struct LagFeatures {
    pub window: usize,
    pub lag_1: Vec<f64>,
    pub rolling_mean_lag_1: Vec<f64>,
}

impl LagFeatures {
    pub fn lag_name(base: &str) -> String {
        format!("{base}_lag_1")
    }

    pub fn rolling_name(base: &str, window: usize) -> String {
        format!("{base}_rolling_mean_{window}_lag_1")
    }
}

/// `lag_1` and the mean of the `window` values ending at the lagged position.
///
/// ```
/// use ehyd::processing::features::add_lag_and_rolling_mean;
///
/// let features = add_lag_and_rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
/// assert!(features.lag_1[0].is_nan());
/// assert_eq!(features.lag_1[3], 3.0);
/// assert_eq!(features.rolling_mean_lag_1[3], 2.5);
/// ```
pub fn add_lag_and_rolling_mean(values: &[f64], window: usize) -> LagFeatures {
    let lag_1 = lag(values, 1);
    let rolling_mean_lag_1 = rolling_mean(&lag_1, window);
    LagFeatures {
        window,
        lag_1,
        rolling_mean_lag_1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_window_of_lagged_values() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let features = add_lag_and_rolling_mean(&values, 6);
        assert!(features.rolling_mean_lag_1[..6].iter().all(|v| v.is_nan()));
        // mean of 1..=6
        assert_eq!(features.rolling_mean_lag_1[6], 3.5);
        // mean of 4..=9
        assert_eq!(features.rolling_mean_lag_1[9], 6.5);
    }

    #[test]
    fn gaps_propagate() {
        let rolling = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0], 2);
        assert!(rolling[1].is_nan());
        assert!(rolling[2].is_nan());
        assert_eq!(rolling[3], 3.5);
    }

    #[test]
    fn names() {
        assert_eq!(LagFeatures::lag_name("rain_1"), "rain_1_lag_1");
        assert_eq!(
            LagFeatures::rolling_name("gw_level", 6),
            "gw_level_rolling_mean_6_lag_1"
        );
    }
}
