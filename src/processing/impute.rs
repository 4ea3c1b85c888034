//! Filling gaps inside the observed range of a monthly series.

use crate::model::error::ModelError;
use crate::model::grid::{grid_search, SarimaGrid};
use crate::types::series::MonthlySeries;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How interior gaps of a monthly series are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImputationStrategy {
    /// Mean of the observed values sharing the gap's calendar month.
    #[default]
    MonthOfYearMean,
    /// In-sample one-step predictions of the lowest-AIC SARIMA, seeded with
    /// month-of-year means.
    Sarima,
    /// Leave gaps untouched.
    None,
}

/// Replaces every `NaN` strictly inside the observed range with the mean of the
/// observed values of the same calendar month, or the overall mean when that
/// calendar month was never observed. Returns the number of filled values.
pub fn impute_month_of_year_mean(series: &mut MonthlySeries) -> usize {
    let Some((first, last)) = series.observed_range() else {
        return 0;
    };

    let mut sums = [0.0; 12];
    let mut counts = [0usize; 12];
    for (month, value) in series.iter() {
        if value.is_finite() {
            let slot = month.month() as usize - 1;
            sums[slot] += value;
            counts[slot] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    let overall = sums.iter().sum::<f64>() / total as f64;

    let months: Vec<usize> = (first..=last)
        .map(|i| series.month_at(i).month() as usize - 1)
        .collect();
    let mut filled = 0;
    for (value, slot) in series.values_mut()[first..=last].iter_mut().zip(months) {
        if value.is_nan() {
            *value = if counts[slot] > 0 {
                sums[slot] / counts[slot] as f64
            } else {
                overall
            };
            filled += 1;
        }
    }
    filled
}

/// Fills interior gaps with in-sample predictions of the best model of `grid`.
///
/// Gaps are first seeded with month-of-year means so the model can be fitted; a gap
/// inside the model's warm-up keeps its seed value.
pub fn impute_sarima(series: &mut MonthlySeries, grid: &SarimaGrid) -> Result<usize, ModelError> {
    let Some((first, last)) = series.observed_range() else {
        return Ok(0);
    };
    let gaps: Vec<usize> = (first..=last)
        .filter(|&i| series.values()[i].is_nan())
        .collect();
    if gaps.is_empty() {
        return Ok(0);
    }

    let mut seeded = series.clone();
    impute_month_of_year_mean(&mut seeded);
    let observed = &seeded.values()[first..=last];
    let result = grid_search(observed, &[], grid)?;
    let fitted = result.best.fitted();
    debug!(
        "Station {}: imputing {} gaps with {}",
        series.station(),
        gaps.len(),
        result.best.order()
    );

    let values = series.values_mut();
    for i in &gaps {
        let prediction = fitted[i - first];
        values[*i] = if prediction.is_finite() {
            prediction
        } else {
            seeded.values()[*i]
        };
    }
    Ok(gaps.len())
}

/// Applies `strategy`; a failed SARIMA imputation falls back to month-of-year means.
pub fn impute(series: &mut MonthlySeries, strategy: ImputationStrategy, grid: &SarimaGrid) -> usize {
    match strategy {
        ImputationStrategy::MonthOfYearMean => impute_month_of_year_mean(series),
        ImputationStrategy::Sarima => match impute_sarima(series, grid) {
            Ok(filled) => filled,
            Err(e) => {
                warn!(
                    "SARIMA imputation failed for station {} ({}), using month-of-year means",
                    series.station(),
                    e
                );
                impute_month_of_year_mean(series)
            }
        },
        ImputationStrategy::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sarima::SarimaOrder;
    use crate::types::month::Month;

    #[test]
    fn month_of_year_mean_fills_interior_only() {
        let nan = f64::NAN;
        // Nov 1999 .. Mar 2001
        let mut series = MonthlySeries::new(
            5,
            Month::new(11, 1999),
            vec![
                nan, 1.0, // Nov, Dec 1999
                10.0, nan, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, // 2000
                20.0, 22.0, nan, // Jan..Mar 2001
            ],
        );
        let filled = impute_month_of_year_mean(&mut series);
        assert_eq!(filled, 1);
        // Feb gap: Feb observed once in 2001 with 22.0
        assert_eq!(series.get(Month::new(2, 2000)), 22.0);
        // Leading and trailing gaps stay.
        assert!(series.values()[0].is_nan());
        assert!(series.get(Month::new(3, 2001)).is_nan());
    }

    #[test]
    fn unobserved_calendar_month_uses_overall_mean() {
        let mut series = MonthlySeries::new(1, Month::new(1, 2000), vec![2.0, f64::NAN, 4.0]);
        impute_month_of_year_mean(&mut series);
        assert_eq!(series.values(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn sarima_imputation_follows_season() {
        let pattern = [0.0, 2.0, 5.0, 9.0, 12.0, 14.0, 13.0, 10.0, 6.0, 3.0, 1.0, 0.5];
        let mut values: Vec<f64> = (0..60).map(|i| pattern[i % 12] + 20.0).collect();
        values[40] = f64::NAN;
        values[41] = f64::NAN;
        let mut series = MonthlySeries::new(2, Month::new(1, 2010), values);

        let grid = SarimaGrid::single(SarimaOrder::seasonal(0, 0, 0, 0, 1, 0, 12));
        let filled = impute_sarima(&mut series, &grid).unwrap();
        assert_eq!(filled, 2);
        assert!((series.values()[40] - (pattern[4] + 20.0)).abs() < 1e-9);
        assert!((series.values()[41] - (pattern[5] + 20.0)).abs() < 1e-9);
        assert_eq!(series.nan_count(), 0);
    }

    #[test]
    fn failed_sarima_falls_back() {
        let mut series = MonthlySeries::new(1, Month::new(1, 2000), vec![2.0, f64::NAN, 4.0]);
        let grid = SarimaGrid::single(SarimaOrder::seasonal(1, 1, 1, 1, 1, 1, 12));
        assert_eq!(impute(&mut series, ImputationStrategy::Sarima, &grid), 1);
        assert_eq!(series.values()[1], 3.0);
    }
}
