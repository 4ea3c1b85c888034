//! Per-station hold-out evaluation and out-of-sample forecasting.

use crate::frames::augmented::AugmentedStationFrame;
use crate::model::error::ModelError;
use crate::model::grid::{grid_search, CandidateResult, SarimaGrid};
use crate::model::metrics::{mae, rmse, smape};
use crate::model::sarima::{Sarima, SarimaForecast, SarimaOrder};
use crate::types::month::Month;
use crate::types::station::StationId;
use chrono::NaiveDate;
use log::{debug, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Result of forecasting one groundwater station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationForecast {
    pub station: StationId,
    /// Best-AIC order on the training part.
    pub order: SarimaOrder,
    pub aic: f64,
    /// Exogenous regressors that entered the model, after constant columns were dropped.
    pub features: Vec<String>,
    /// The held-out months.
    pub test_months: Vec<Month>,
    pub actual: Vec<f64>,
    pub predicted: SarimaForecast,
    pub smape: f64,
    /// Months after the last observation.
    pub future_months: Vec<Month>,
    /// Forecast past the last observation, `None` when the refit on the full history failed.
    pub future: Option<SarimaForecast>,
    pub candidates: Vec<CandidateResult>,
}

impl StationForecast {
    pub fn mae(&self) -> f64 {
        mae(&self.actual, &self.predicted.mean)
    }

    pub fn rmse(&self) -> f64 {
        rmse(&self.actual, &self.predicted.mean)
    }

    /// Human readable multi-line summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let fitted = self.candidates.iter().filter(|c| c.aic.is_some()).count();
        let _ = writeln!(out, "Station {}: {} (AIC {:.2})", self.station, self.order, self.aic);
        let _ = writeln!(
            out,
            "  candidates fitted: {}/{}",
            fitted,
            self.candidates.len()
        );
        if self.features.is_empty() {
            let _ = writeln!(out, "  no exogenous features");
        } else {
            let _ = writeln!(out, "  features: {}", self.features.join(", "));
        }
        if let (Some(first), Some(last)) = (self.test_months.first(), self.test_months.last()) {
            let _ = writeln!(
                out,
                "  hold-out {}..{}: SMAPE {:.3}%, MAE {:.4}, RMSE {:.4}",
                first,
                last,
                self.smape,
                self.mae(),
                self.rmse()
            );
        }
        match (&self.future, self.future_months.last()) {
            (Some(future), Some(last)) => {
                let _ = writeln!(
                    out,
                    "  forecast to {}: {:.3} [{:.3}, {:.3}]",
                    last,
                    future.mean.last().copied().unwrap_or(f64::NAN),
                    future.lower.last().copied().unwrap_or(f64::NAN),
                    future.upper.last().copied().unwrap_or(f64::NAN)
                );
            }
            _ => {
                let _ = writeln!(out, "  no out-of-sample forecast");
            }
        }
        out
    }

    /// Hold-out rows followed by the out-of-sample rows.
    ///
    /// Columns: `date`, `set` (`test` or `future`), `actual` (NaN for future rows),
    /// `forecast`, `lower`, `upper`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let future = self.future.as_ref();
        let future_len = future.map_or(0, |f| f.horizon());
        let months = self
            .test_months
            .iter()
            .chain(self.future_months.iter().take(future_len));

        let dates: Vec<NaiveDate> = months
            .map(|m| {
                m.first_day().ok_or_else(|| {
                    PolarsError::ComputeError(format!("month {} has no first day", m).into())
                })
            })
            .collect::<PolarsResult<_>>()?;
        let set: Vec<&str> = std::iter::repeat("test")
            .take(self.test_months.len())
            .chain(std::iter::repeat("future").take(future_len))
            .collect();

        let pick = |held_out: &[f64], out_of_sample: Option<&Vec<f64>>| -> Vec<f64> {
            held_out
                .iter()
                .chain(out_of_sample.into_iter().flatten())
                .copied()
                .collect()
        };
        let actual: Vec<f64> = self
            .actual
            .iter()
            .copied()
            .chain(std::iter::repeat(f64::NAN).take(future_len))
            .collect();

        DataFrame::new(vec![
            Column::new("date".into(), dates),
            Column::new("set".into(), set),
            Column::new("actual".into(), actual),
            Column::new(
                "forecast".into(),
                pick(&self.predicted.mean, future.map(|f| &f.mean)),
            ),
            Column::new(
                "lower".into(),
                pick(&self.predicted.lower, future.map(|f| &f.lower)),
            ),
            Column::new(
                "upper".into(),
                pick(&self.predicted.upper, future.map(|f| &f.upper)),
            ),
        ])
    }
}

/// One row per station: `station`, `order`, `aic`, `smape`, `mae`, `rmse`, `features`.
pub fn summary_dataframe(forecasts: &[StationForecast]) -> PolarsResult<DataFrame> {
    let stations: Vec<u32> = forecasts.iter().map(|f| f.station).collect();
    let orders: Vec<String> = forecasts.iter().map(|f| f.order.to_string()).collect();
    let aic: Vec<f64> = forecasts.iter().map(|f| f.aic).collect();
    let smape: Vec<f64> = forecasts.iter().map(|f| f.smape).collect();
    let mae: Vec<f64> = forecasts.iter().map(StationForecast::mae).collect();
    let rmse: Vec<f64> = forecasts.iter().map(StationForecast::rmse).collect();
    let features: Vec<String> = forecasts.iter().map(|f| f.features.join("|")).collect();

    DataFrame::new(vec![
        Column::new("station".into(), stations),
        Column::new("order".into(), orders),
        Column::new("aic".into(), aic),
        Column::new("smape".into(), smape),
        Column::new("mae".into(), mae),
        Column::new("rmse".into(), rmse),
        Column::new("features".into(), features),
    ])
}

/// Mean per calendar month of the finite values of a series starting at `start`.
///
/// Months without a finite value get the overall mean, or 0 for an all-missing series.
pub fn month_of_year_climatology(values: &[f64], start: Month) -> [f64; 12] {
    let mut sums = [0.0; 12];
    let mut counts = [0usize; 12];
    for (i, v) in values.iter().enumerate() {
        if v.is_finite() {
            let slot = (start.offset(i as i64).month() - 1) as usize;
            sums[slot] += v;
            counts[slot] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    let overall = if total == 0 {
        0.0
    } else {
        sums.iter().sum::<f64>() / total as f64
    };

    let mut climatology = [overall; 12];
    for slot in 0..12 {
        if counts[slot] > 0 {
            climatology[slot] = sums[slot] / counts[slot] as f64;
        }
    }
    climatology
}

fn fill_non_finite(values: &mut [f64], training: usize) {
    let finite: Vec<f64> = values[..training]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let fill = if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = fill;
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Evaluates a station on its final `horizon` observed months and forecasts `horizon`
/// months past its last observation.
///
/// The grid search runs on the observed target range minus the hold-out, with the
/// given `features` as regressors. Missing regressor values are filled with their
/// training mean and regressors that are constant over the training part are dropped.
/// The hold-out forecast uses the observed regressor values; the out-of-sample forecast
/// refits the best order on the full range and feeds each regressor's month-of-year
/// climatology.
pub fn forecast_station(
    frame: &AugmentedStationFrame,
    features: &[String],
    horizon: usize,
    grid: &SarimaGrid,
) -> Result<StationForecast, ModelError> {
    let (first, last) = frame.observed_range().ok_or(ModelError::NoObservations)?;
    let y = &frame.target()[first..=last];
    let observed = y.len();
    if horizon >= observed {
        return Err(ModelError::HoldoutTooLong { horizon, observed });
    }
    let split = observed - horizon;

    let mut regressors: Vec<(String, Vec<f64>)> = Vec::with_capacity(features.len());
    for name in features {
        let column = frame
            .column(name)
            .ok_or_else(|| ModelError::UnknownFeature(name.clone()))?;
        let mut values = column[first..=last].to_vec();
        fill_non_finite(&mut values, split);
        if is_constant(&values[..split]) {
            debug!("Station {}: dropping constant feature {}", frame.station(), name);
            continue;
        }
        regressors.push((name.clone(), values));
    }

    let train_exog: Vec<Vec<f64>> = regressors.iter().map(|(_, v)| v[..split].to_vec()).collect();
    let test_exog: Vec<Vec<f64>> = regressors.iter().map(|(_, v)| v[split..].to_vec()).collect();

    let search = grid_search(&y[..split], &train_exog, grid)?;
    let predicted = search.best.forecast(horizon, &test_exog)?;
    let actual = y[split..].to_vec();
    let score = smape(&actual, &predicted.mean);
    debug!(
        "Station {}: {} AIC {:.3}, SMAPE {:.3}%",
        frame.station(),
        search.best.order(),
        search.best.aic(),
        score
    );

    let start = frame.month_at(first);
    let future_months: Vec<Month> = (1..=horizon).map(|h| frame.month_at(last + h)).collect();
    let future_exog: Vec<Vec<f64>> = regressors
        .iter()
        .map(|(_, values)| {
            let climatology = month_of_year_climatology(values, start);
            future_months
                .iter()
                .map(|m| climatology[(m.month() - 1) as usize])
                .collect()
        })
        .collect();
    let full_exog: Vec<Vec<f64>> = regressors.iter().map(|(_, v)| v.clone()).collect();
    let future = match Sarima::fit(search.best.order(), y, &full_exog)
        .and_then(|model| model.forecast(horizon, &future_exog))
    {
        Ok(forecast) => Some(forecast),
        Err(e) => {
            warn!(
                "Station {}: out-of-sample forecast failed: {}",
                frame.station(),
                e
            );
            None
        }
    };

    Ok(StationForecast {
        station: frame.station(),
        order: search.best.order(),
        aic: search.best.aic(),
        features: regressors.into_iter().map(|(name, _)| name).collect(),
        test_months: (split..observed).map(|i| frame.month_at(first + i)).collect(),
        actual,
        predicted,
        smape: score,
        future_months,
        future,
        candidates: search.candidates,
    })
}
