//! Daily and monthly station series.

use crate::types::month::{Calendar, Month};
use crate::types::station::StationId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How missing values left after imputation are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddingMode {
    /// Replace every remaining gap with `0.0`.
    #[default]
    Zero,
    /// Keep gaps as `NaN`.
    Nan,
}

/// Raw observations of one station, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub station: StationId,
    pub observations: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    pub fn new(station: StationId, observations: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            station,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether dates never decrease from one row to the next.
    pub fn is_monotonic(&self) -> bool {
        self.observations.windows(2).all(|w| w[0].0 <= w[1].0)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|(d, _)| *d).min()
    }
}

/// A dense monthly series: one value per month from `start`, `NaN` marks a gap.
///
/// The dense layout makes the series strictly increasing in time by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    station: StationId,
    start: Month,
    values: Vec<f64>,
}

impl MonthlySeries {
    pub fn new(station: StationId, start: Month, values: Vec<f64>) -> Self {
        Self {
            station,
            start,
            values,
        }
    }

    /// Buckets observations by month and averages the finite values in each bucket.
    ///
    /// Months between the first and last observation without any finite value are `NaN`.
    pub fn from_observations(
        station: StationId,
        observations: impl IntoIterator<Item = (Month, f64)>,
    ) -> Self {
        let mut buckets: BTreeMap<Month, (f64, usize)> = BTreeMap::new();
        for (month, value) in observations {
            let entry = buckets.entry(month).or_insert((0.0, 0));
            if value.is_finite() {
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let (Some(first), Some(last)) = (
            buckets.keys().next().copied(),
            buckets.keys().next_back().copied(),
        ) else {
            return Self::new(station, Month::new(1, 1970), Vec::new());
        };

        let mut values = vec![f64::NAN; first.months_until(last) as usize + 1];
        for (month, (sum, count)) in buckets {
            if count > 0 {
                values[first.months_until(month) as usize] = sum / count as f64;
            }
        }
        Self::new(station, first, values)
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn start(&self) -> Month {
        self.start
    }

    /// Last month covered, `None` for an empty series.
    pub fn end(&self) -> Option<Month> {
        (!self.values.is_empty()).then(|| self.start.offset(self.values.len() as i64 - 1))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn month_at(&self, index: usize) -> Month {
        self.start.offset(index as i64)
    }

    /// Value for `month`, `NaN` when outside the series.
    pub fn get(&self, month: Month) -> f64 {
        let offset = self.start.months_until(month);
        if offset < 0 {
            return f64::NAN;
        }
        self.values
            .get(offset as usize)
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (self.month_at(i), *v))
    }

    /// Index range `[first, last]` of finite values.
    pub fn observed_range(&self) -> Option<(usize, usize)> {
        let first = self.values.iter().position(|v| v.is_finite())?;
        let last = self.values.iter().rposition(|v| v.is_finite())?;
        Some((first, last))
    }

    pub fn first_valid(&self) -> Option<Month> {
        self.observed_range().map(|(first, _)| self.month_at(first))
    }

    pub fn last_valid(&self) -> Option<Month> {
        self.observed_range().map(|(_, last)| self.month_at(last))
    }

    pub fn nan_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Re-indexes the series onto `calendar`. Months outside the series become `NaN`,
    /// values outside the calendar are dropped.
    pub fn align(&self, calendar: &Calendar) -> MonthlySeries {
        let values = calendar.months().map(|m| self.get(m)).collect();
        MonthlySeries::new(self.station, calendar.start, values)
    }

    /// Applies `mode` to every remaining gap.
    pub fn pad(&mut self, mode: PaddingMode) {
        pad_values(&mut self.values, mode);
    }
}

/// Fills `NaN` entries according to `mode`.
pub fn pad_values(values: &mut [f64], mode: PaddingMode) {
    if mode == PaddingMode::Zero {
        for v in values.iter_mut().filter(|v| v.is_nan()) {
            *v = 0.0;
        }
    }
}
