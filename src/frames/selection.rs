//! Ranking candidate features by how well they track the target across stations.

use crate::frames::snapshot::MonthlySnapshot;
use crate::types::month::Month;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_PAIRS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub name: String,
    /// Mean of the per-month Pearson correlations with the target.
    pub mean_correlation: f64,
    /// Number of months with a defined correlation.
    pub months: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Every candidate with at least one defined correlation, strongest first.
    pub ranked: Vec<FeatureScore>,
    /// Names of the chosen features.
    pub selected: Vec<String>,
}

/// Pearson correlation over the pairs where both values are finite.
///
/// `None` with fewer than three pairs or when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < MIN_PAIRS {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= f64::EPSILON * n || syy <= f64::EPSILON * n {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Scores every column except the target and the target-derived columns, then keeps
/// the `max_features` strongest with `|r| >= min_abs_correlation`.
pub fn select_features(
    snapshots: &BTreeMap<Month, MonthlySnapshot>,
    target: &str,
    max_features: usize,
    min_abs_correlation: f64,
) -> FeatureSelection {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for snapshot in snapshots.values() {
        let Some(target_values) = snapshot.column(target) else {
            continue;
        };
        for (name, values) in &snapshot.columns {
            if name.starts_with(target) {
                continue;
            }
            if let Some(r) = pearson(values, target_values) {
                let entry = totals.entry(name.as_str()).or_insert((0.0, 0));
                entry.0 += r;
                entry.1 += 1;
            }
        }
    }

    let mut ranked: Vec<FeatureScore> = totals
        .into_iter()
        .map(|(name, (sum, months))| FeatureScore {
            name: name.to_string(),
            mean_correlation: sum / months as f64,
            months,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.mean_correlation
            .abs()
            .total_cmp(&a.mean_correlation.abs())
            .then_with(|| a.name.cmp(&b.name))
    });

    let selected: Vec<String> = ranked
        .iter()
        .filter(|score| score.mean_correlation.abs() >= min_abs_correlation)
        .take(max_features)
        .map(|score| score.name.clone())
        .collect();
    debug!(
        "Selected {} of {} candidate features: {:?}",
        selected.len(),
        ranked.len(),
        selected
    );

    FeatureSelection { ranked, selected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(month: u32, columns: Vec<(&str, Vec<f64>)>) -> (Month, MonthlySnapshot) {
        let month = Month::new(month, 2020);
        let stations = (1..=columns[0].1.len() as u32).collect();
        (
            month,
            MonthlySnapshot {
                month,
                stations,
                columns: columns
                    .into_iter()
                    .map(|(n, v)| (n.to_string(), v))
                    .collect(),
            },
        )
    }

    #[test]
    fn pearson_edge_cases() {
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0]), None);
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0, f64::NAN, 3.0, 4.0], &[1.0, 2.0, f64::NAN, 4.0]), None);
    }

    #[test]
    fn ranks_by_mean_absolute_correlation() {
        let target = vec![1.0, 2.0, 3.0, 4.0];
        let snapshots = BTreeMap::from([
            snapshot(
                1,
                vec![
                    ("gw_level", target.clone()),
                    ("gw_level_lag_1", target.clone()),
                    ("rain_1", vec![4.0, 3.0, 2.0, 1.0]),
                    ("snow_1", vec![1.0, 3.0, 2.0, 4.0]),
                    ("sediment_1", vec![0.0; 4]),
                ],
            ),
            snapshot(
                2,
                vec![
                    ("gw_level", target.clone()),
                    ("gw_level_lag_1", target.clone()),
                    ("rain_1", vec![4.0, 3.0, 2.0, 1.5]),
                    ("snow_1", vec![1.0, 2.0, 3.0, 4.0]),
                    ("sediment_1", vec![0.0; 4]),
                ],
            ),
        ]);

        let selection = select_features(&snapshots, "gw_level", 1, 0.5);
        let names: Vec<_> = selection.ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["rain_1", "snow_1"]);
        assert!(selection.ranked[0].mean_correlation < -0.9);
        assert_eq!(selection.ranked[0].months, 2);
        assert_eq!(selection.selected, vec!["rain_1".to_string()]);

        let strict = select_features(&snapshots, "gw_level", 5, 0.95);
        assert_eq!(strict.selected, vec!["rain_1".to_string()]);
    }
}
