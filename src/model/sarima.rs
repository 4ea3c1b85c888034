//! Seasonal ARIMA with optional exogenous regressors.
//!
//! The model is a regression with SARIMA errors:
//!
//! ```text
//! y_t = β0 + Σ β_i x_{i,t} + u_t
//! φ(B) Φ(B^s) (1 - B)^d (1 - B^s)^D u_t = c + θ(B) Θ(B^s) ε_t
//! ```
//!
//! The regression is fitted first by least squares, then the ARMA coefficients of the
//! differenced residuals are estimated by conditional sum of squares. The likelihood
//! skips a number of leading observations; models fitted to the same series with the
//! same conditioning share one sample and their AICs can be compared. Coefficients are
//! only bounded to `(-0.99, 0.99)`; stationarity and invertibility of the product
//! polynomials are not enforced. The constant `c` is estimated only when no
//! differencing is applied.

use crate::model::diff::{apply_polynomial, differencing_polynomial, integrate, poly_mul};
use crate::model::error::ModelError;
use crate::model::ols::{ols_fit, OlsFit};
use crate::model::optimization::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Two-sided 95% standard normal quantile.
const Z_95: f64 = 1.959_964;
const COEFFICIENT_BOUND: f64 = 0.99;
const MIN_VARIANCE: f64 = 1e-12;

/// `(p, d, q)(P, D, Q)[s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    /// A non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::seasonal(p, d, q, 0, 0, 0, 0)
    }

    pub fn seasonal(
        p: usize,
        d: usize,
        q: usize,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        // Seasonal terms are meaningless without a period.
        let (seasonal_p, seasonal_d, seasonal_q) = if period == 0 {
            (0, 0, 0)
        } else {
            (seasonal_p, seasonal_d, seasonal_q)
        };
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    /// The ARMA errors get a constant only when the series is not differenced.
    pub fn has_mean(&self) -> bool {
        self.d + self.seasonal_d == 0
    }

    /// Number of estimated ARMA coefficients, excluding the mean.
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Highest lag of the combined autoregressive polynomial.
    pub fn ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Highest lag of the combined differencing polynomial.
    pub fn differencing_lag(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Leading observations without a complete differencing and autoregressive history.
    pub fn warm_up(&self) -> usize {
        self.differencing_lag() + self.ar_lag()
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.period > 0 {
            write!(
                f,
                "({},{},{})[{}]",
                self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Coefficients {
    mean: f64,
    ar: Vec<f64>,
    seasonal_ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Splits an optimiser vector laid out as `[mean?, φ, Φ, θ, Θ]`.
    fn from_params(order: &SarimaOrder, params: &[f64]) -> Self {
        let mut cursor = 0;
        let mut take = |n: usize| {
            let end = (cursor + n).min(params.len());
            let slice = params[cursor..end].to_vec();
            cursor = end;
            slice
        };
        let mean = if order.has_mean() {
            take(1).first().copied().unwrap_or(0.0)
        } else {
            0.0
        };
        Self {
            mean,
            ar: take(order.p),
            seasonal_ar: take(order.seasonal_p),
            ma: take(order.q),
            seasonal_ma: take(order.seasonal_q),
        }
    }

    /// `φ(B) Φ(B^s)` with the sign convention `1 - φ_1 B - ...`.
    fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        let regular = lag_polynomial(&self.ar, 1, -1.0);
        let seasonal = lag_polynomial(&self.seasonal_ar, period, -1.0);
        poly_mul(&regular, &seasonal)
    }

    /// `θ(B) Θ(B^s)` with the sign convention `1 + θ_1 B + ...`.
    fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        let regular = lag_polynomial(&self.ma, 1, 1.0);
        let seasonal = lag_polynomial(&self.seasonal_ma, period, 1.0);
        poly_mul(&regular, &seasonal)
    }
}

fn lag_polynomial(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    if coefficients.is_empty() || spacing == 0 {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefficients.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

/// One-step ARMA residuals of `w` from `start` on; earlier residuals are zero.
fn arma_residuals(w: &[f64], ar: &[f64], ma: &[f64], mean: f64, start: usize) -> Vec<f64> {
    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let prediction = arma_prediction(w, &residuals, t, ar, ma, mean);
        residuals[t] = w[t] - prediction;
    }
    residuals
}

/// Prediction of `w[t]` from everything before `t`.
fn arma_prediction(w: &[f64], residuals: &[f64], t: usize, ar: &[f64], ma: &[f64], mean: f64) -> f64 {
    let mut prediction = mean;
    for (k, a) in ar.iter().enumerate().skip(1) {
        if *a != 0.0 && t >= k {
            prediction -= a * (w[t - k] - mean);
        }
    }
    for (k, m) in ma.iter().enumerate().skip(1) {
        if *m != 0.0 && t >= k {
            prediction += m * residuals[t - k];
        }
    }
    prediction
}

/// Point forecasts with a 95% interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaForecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl SarimaForecast {
    pub fn horizon(&self) -> usize {
        self.mean.len()
    }
}

/// A fitted regression-with-SARIMA-errors model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sarima {
    order: SarimaOrder,
    coefficients: Coefficients,
    regression: Option<OlsFit>,
    observations: Vec<f64>,
    /// Regression residuals `u_t` (equal to the observations without regressors).
    errors: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    ar_poly: Vec<f64>,
    ma_poly: Vec<f64>,
    diff_poly: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    num_params: usize,
    conditioning: usize,
    effective_obs: usize,
}

impl Sarima {
    /// Fits `order` to `y`. `exog` holds one column per regressor, each as long as `y`;
    /// pass an empty slice for a pure SARIMA.
    pub fn fit(order: SarimaOrder, y: &[f64], exog: &[Vec<f64>]) -> Result<Sarima, ModelError> {
        Self::fit_with(order, y, exog, order.warm_up(), &NelderMeadConfig::default())
    }

    /// Fits `order` with the first `conditioning` observations left out of the
    /// likelihood. Values below [`SarimaOrder::warm_up`] are raised to it.
    pub fn fit_with(
        order: SarimaOrder,
        y: &[f64],
        exog: &[Vec<f64>],
        conditioning: usize,
        optimizer: &NelderMeadConfig,
    ) -> Result<Sarima, ModelError> {
        if y.is_empty() {
            return Err(ModelError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite);
        }

        let conditioning = conditioning.max(order.warm_up());
        // First residual on the differenced scale.
        let start = conditioning - order.differencing_lag();
        let num_arma = order.num_coefficients() + usize::from(order.has_mean());
        let needed = conditioning + num_arma + 2;
        if y.len() < needed {
            return Err(ModelError::InsufficientData {
                order,
                needed,
                got: y.len(),
            });
        }

        let regression = if exog.is_empty() {
            None
        } else {
            Some(ols_fit(y, exog)?)
        };
        let errors = match &regression {
            Some(fit) => fit.residuals(y, exog)?,
            None => y.to_vec(),
        };

        let diff_poly = differencing_polynomial(order.d, order.seasonal_d, order.period);
        let differenced = apply_polynomial(&diff_poly, &errors);
        let coefficients = Self::estimate(&order, &differenced, start, optimizer);

        let ar_poly = coefficients.ar_polynomial(order.period);
        let ma_poly = coefficients.ma_polynomial(order.period);
        let residuals = arma_residuals(&differenced, &ar_poly, &ma_poly, coefficients.mean, start);

        let effective_obs = differenced.len() - start;
        let css: f64 = residuals[start..].iter().map(|e| e * e).sum();
        let sigma2 = (css / effective_obs as f64).max(MIN_VARIANCE);
        let n = effective_obs as f64;
        let log_likelihood = -0.5 * n * (1.0 + (2.0 * PI * sigma2).ln());
        if !log_likelihood.is_finite() {
            return Err(ModelError::NonFiniteFit(order));
        }

        let regression_params = regression.as_ref().map_or(0, |r| r.num_regressors() + 1);
        let num_params = num_arma + 1 + regression_params;

        Ok(Sarima {
            order,
            coefficients,
            regression,
            observations: y.to_vec(),
            errors,
            differenced,
            residuals,
            ar_poly,
            ma_poly,
            diff_poly,
            sigma2,
            log_likelihood,
            num_params,
            conditioning,
            effective_obs,
        })
    }

    fn estimate(
        order: &SarimaOrder,
        differenced: &[f64],
        start: usize,
        optimizer: &NelderMeadConfig,
    ) -> Coefficients {
        let sample_mean = differenced.iter().sum::<f64>() / differenced.len() as f64;
        // The optimiser works in units of the sample deviation so its tolerances do not
        // depend on the units of the series.
        let variance = differenced
            .iter()
            .map(|w| (w - sample_mean).powi(2))
            .sum::<f64>()
            / differenced.len() as f64;
        let scale = if variance > MIN_VARIANCE {
            variance.sqrt()
        } else {
            1.0
        };
        let to_model = |params: &[f64]| {
            let mut params = params.to_vec();
            if order.has_mean() {
                if let Some(mean) = params.first_mut() {
                    *mean = sample_mean + scale * *mean;
                }
            }
            Coefficients::from_params(order, &params)
        };

        let mut initial = Vec::new();
        let mut bounds = Vec::new();
        if order.has_mean() {
            initial.push(0.0);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for count in [order.p, order.seasonal_p, order.q, order.seasonal_q] {
            for i in 0..count {
                initial.push(0.1 / (i + 1) as f64);
                bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
            }
        }

        if order.num_coefficients() == 0 {
            return to_model(&initial);
        }

        let result = nelder_mead(
            |params| {
                let c = to_model(params);
                let ar = c.ar_polynomial(order.period);
                let ma = c.ma_polynomial(order.period);
                let residuals = arma_residuals(differenced, &ar, &ma, c.mean, start);
                let css: f64 =
                    residuals[start..].iter().map(|e| e * e).sum::<f64>() / (scale * scale);
                if css.is_finite() {
                    css
                } else {
                    f64::MAX
                }
            },
            &initial,
            Some(&bounds),
            optimizer,
        );
        to_model(&result.optimal_point)
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Constant of the ARMA errors, zero for differenced models.
    pub fn mean(&self) -> f64 {
        self.coefficients.mean
    }

    pub fn regression(&self) -> Option<&OlsFit> {
        self.regression.as_ref()
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.num_params as f64
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.num_params as f64 * (self.effective_obs as f64).ln()
    }

    /// Residuals on the differenced scale, zero before the conditioning sample ends.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    /// Leading observations left out of the likelihood.
    pub fn conditioning(&self) -> usize {
        self.conditioning
    }

    /// Observations the likelihood is summed over.
    pub fn effective_observations(&self) -> usize {
        self.effective_obs
    }

    /// In-sample one-step-ahead predictions on the original scale.
    ///
    /// Observations without enough history for a prediction are `NaN`.
    pub fn fitted(&self) -> Vec<f64> {
        let offset = self.order.differencing_lag();
        self.observations
            .iter()
            .enumerate()
            .map(|(t, y)| {
                if t < self.conditioning {
                    f64::NAN
                } else {
                    y - self.residuals[t - offset]
                }
            })
            .collect()
    }

    /// Forecasts `horizon` steps past the end of the fitted series.
    ///
    /// `future_exog` needs the same regressors as the fit, each `horizon` values long.
    pub fn forecast(
        &self,
        horizon: usize,
        future_exog: &[Vec<f64>],
    ) -> Result<SarimaForecast, ModelError> {
        let regression_part = match &self.regression {
            Some(fit) => {
                if future_exog.len() != fit.num_regressors() {
                    return Err(ModelError::RegressorCount {
                        expected: fit.num_regressors(),
                        got: future_exog.len(),
                    });
                }
                if let Some(bad) = future_exog.iter().find(|c| c.len() != horizon) {
                    return Err(ModelError::DimensionMismatch {
                        expected: horizon,
                        got: bad.len(),
                    });
                }
                if future_exog.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(ModelError::NonFinite);
                }
                if horizon == 0 {
                    Vec::new()
                } else {
                    fit.predict(future_exog)?
                }
            }
            None => {
                if !future_exog.is_empty() {
                    return Err(ModelError::RegressorCount {
                        expected: 0,
                        got: future_exog.len(),
                    });
                }
                vec![0.0; horizon]
            }
        };

        let mut w = self.differenced.clone();
        let mut residuals = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let prediction = arma_prediction(
                &w,
                &residuals,
                t,
                &self.ar_poly,
                &self.ma_poly,
                self.coefficients.mean,
            );
            w.push(prediction);
            residuals.push(0.0);
        }
        let future_w = &w[self.differenced.len()..];
        let future_errors = integrate(&self.diff_poly, &self.errors, future_w);

        let mean: Vec<f64> = future_errors
            .iter()
            .zip(&regression_part)
            .map(|(u, r)| u + r)
            .collect();

        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, m) in mean.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let se = (self.sigma2 * cumulative).sqrt();
            lower.push(m - Z_95 * se);
            upper.push(m + Z_95 * se);
        }

        Ok(SarimaForecast { mean, lower, upper })
    }

    /// MA(∞) weights of the full model including differencing.
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        let full_ar = poly_mul(&self.ar_poly, &self.diff_poly);
        let mut psi = Vec::with_capacity(count);
        for j in 0..count {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut value = self.ma_poly.get(j).copied().unwrap_or(0.0);
            for k in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[k] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }
}
