use crate::model::error::ModelError;
use crate::model::optimization::NelderMeadConfig;
use crate::model::sarima::{Sarima, SarimaOrder};
use log::{debug, trace};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The orders tried by [`grid_search`]: the Cartesian product of every list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaGrid {
    pub p: Vec<usize>,
    pub d: Vec<usize>,
    pub q: Vec<usize>,
    pub seasonal_p: Vec<usize>,
    pub seasonal_d: Vec<usize>,
    pub seasonal_q: Vec<usize>,
    pub period: usize,
}

impl Default for SarimaGrid {
    /// Every order in `{0, 1}` with a yearly season on monthly data: 64 candidates.
    fn default() -> Self {
        Self {
            p: vec![0, 1],
            d: vec![0, 1],
            q: vec![0, 1],
            seasonal_p: vec![0, 1],
            seasonal_d: vec![0, 1],
            seasonal_q: vec![0, 1],
            period: 12,
        }
    }
}

impl SarimaGrid {
    /// A grid holding exactly one order.
    pub fn single(order: SarimaOrder) -> Self {
        Self {
            p: vec![order.p],
            d: vec![order.d],
            q: vec![order.q],
            seasonal_p: vec![order.seasonal_p],
            seasonal_d: vec![order.seasonal_d],
            seasonal_q: vec![order.seasonal_q],
            period: order.period,
        }
    }

    /// Non-seasonal orders vary slowest, matching a nested `(p, d, q)` then `(P, D, Q)` loop.
    pub fn candidates(&self) -> Vec<SarimaOrder> {
        let mut orders = Vec::new();
        for &p in &self.p {
            for &d in &self.d {
                for &q in &self.q {
                    for &sp in &self.seasonal_p {
                        for &sd in &self.seasonal_d {
                            for &sq in &self.seasonal_q {
                                let order = SarimaOrder::seasonal(p, d, q, sp, sd, sq, self.period);
                                if !orders.contains(&order) {
                                    orders.push(order);
                                }
                            }
                        }
                    }
                }
            }
        }
        orders
    }
}

/// Outcome of one grid candidate; `aic` is `None` when the fit failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub order: SarimaOrder,
    pub aic: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// The lowest-AIC model; the earliest candidate wins ties.
    pub best: Sarima,
    pub candidates: Vec<CandidateResult>,
}

/// Fits every candidate of `grid` and keeps the one with the lowest AIC.
///
/// All candidates are conditioned on the same leading observations, the largest
/// warm-up among the orders the series is long enough for, so their likelihoods are
/// summed over one sample. Failed fits and non-finite AICs are skipped.
pub fn grid_search(
    y: &[f64],
    exog: &[Vec<f64>],
    grid: &SarimaGrid,
) -> Result<GridSearchResult, ModelError> {
    let orders = grid.candidates();
    let conditioning = common_conditioning(&orders, y.len());
    trace!("Conditioning {} candidates on {} observations", orders.len(), conditioning);
    let optimizer = NelderMeadConfig::default();
    let mut best: Option<Sarima> = None;
    let mut candidates = Vec::with_capacity(orders.len());

    for order in orders.iter().copied() {
        match Sarima::fit_with(order, y, exog, conditioning, &optimizer) {
            Ok(model) if model.aic().is_finite() => {
                let aic = model.aic();
                trace!("{} AIC {:.3}", order, aic);
                candidates.push(CandidateResult {
                    order,
                    aic: Some(aic),
                });
                let better = best
                    .as_ref()
                    .map_or(true, |b| OrderedFloat(aic) < OrderedFloat(b.aic()));
                if better {
                    best = Some(model);
                }
            }
            Ok(_) => {
                debug!("Skipping {}: non-finite AIC", order);
                candidates.push(CandidateResult { order, aic: None });
            }
            Err(e) => {
                debug!("Skipping {}: {}", order, e);
                candidates.push(CandidateResult { order, aic: None });
            }
        }
    }

    let best = best.ok_or(ModelError::NoCandidate(orders.len()))?;
    debug!("Best order {} with AIC {:.3}", best.order(), best.aic());
    Ok(GridSearchResult { best, candidates })
}

/// Largest warm-up among the orders that leave room for their own coefficients.
fn common_conditioning(orders: &[SarimaOrder], len: usize) -> usize {
    orders
        .iter()
        .filter(|order| {
            let num_arma = order.num_coefficients() + usize::from(order.has_mean());
            order.warm_up() + num_arma + 2 <= len
        })
        .map(SarimaOrder::warm_up)
        .max()
        .unwrap_or(0)
}
