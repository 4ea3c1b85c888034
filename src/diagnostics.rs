//! Data quality reports over loaded and resampled networks.

use crate::ingest::loader::LoadedNetwork;
use crate::types::month::Month;
use crate::types::network::Network;
use crate::types::station::StationId;
use crate::types::store::SeriesStore;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Equal-width histogram; `edges` has one entry more than `counts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bins finite `values` into `bins` equal-width bins over their range. The last bin
    /// is closed on the right. A single-valued input spans `value ± 0.5`.
    pub fn new(values: &[f64], bins: usize) -> Histogram {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if bins == 0 {
            return Histogram {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        }

        let (mut lo, mut hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if finite.is_empty() {
            (lo, hi) = (0.0, 1.0);
        } else if lo == hi {
            (lo, hi) = (lo - 0.5, hi + 0.5);
        }

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for v in finite {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        Histogram { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Span statistics over the observed ranges of a store's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub stations: usize,
    pub min_months: usize,
    pub max_months: usize,
    pub earliest_start: Month,
    pub latest_start: Month,
    pub earliest_end: Month,
    pub latest_end: Month,
}

/// Stations of `network` whose raw rows are not in date order.
pub fn non_monotonic_stations(loaded: &LoadedNetwork) -> Vec<StationId> {
    loaded
        .series
        .values()
        .filter(|series| !series.is_monotonic())
        .map(|series| series.station)
        .collect()
}

/// Histogram of raw row counts per station.
pub fn row_count_histogram(loaded: &LoadedNetwork, bins: usize) -> Histogram {
    let counts: Vec<f64> = loaded.series.values().map(|s| s.len() as f64).collect();
    Histogram::new(&counts, bins)
}

/// Missing months per station, over each series' own span.
pub fn nan_counts(store: &SeriesStore) -> BTreeMap<StationId, usize> {
    store
        .series
        .iter()
        .map(|(id, series)| (*id, series.nan_count()))
        .collect()
}

/// `None` when no series of the store has an observation.
pub fn coverage(store: &SeriesStore) -> Option<Coverage> {
    let spans: Vec<(Month, Month, usize)> = store
        .series
        .values()
        .filter_map(|series| {
            let (first, last) = series.observed_range()?;
            Some((series.month_at(first), series.month_at(last), last - first + 1))
        })
        .collect();

    let first = spans.first()?;
    let mut summary = Coverage {
        stations: spans.len(),
        min_months: first.2,
        max_months: first.2,
        earliest_start: first.0,
        latest_start: first.0,
        earliest_end: first.1,
        latest_end: first.1,
    };
    for (start, end, months) in &spans[1..] {
        summary.min_months = summary.min_months.min(*months);
        summary.max_months = summary.max_months.max(*months);
        summary.earliest_start = summary.earliest_start.min(*start);
        summary.latest_start = summary.latest_start.max(*start);
        summary.earliest_end = summary.earliest_end.min(*end);
        summary.latest_end = summary.latest_end.max(*end);
    }
    Some(summary)
}

/// Logs the raw-data checks of one loaded network.
pub fn log_loaded(loaded: &LoadedNetwork) {
    let offenders = non_monotonic_stations(loaded);
    if offenders.is_empty() {
        info!("{}: all {} series are in date order", loaded.network, loaded.series.len());
    } else {
        warn!(
            "{}: {} series are not in date order: {:?}",
            loaded.network,
            offenders.len(),
            offenders
        );
    }

    let histogram = row_count_histogram(loaded, 10);
    info!("{}: rows per station", loaded.network);
    for (i, count) in histogram.counts.iter().enumerate() {
        info!(
            "  {:>10.1} .. {:>10.1}: {}",
            histogram.edges[i],
            histogram.edges[i + 1],
            count
        );
    }
}

/// Logs gap counts and coverage of one resampled network.
pub fn log_store(network: Network, store: &SeriesStore) {
    let gaps = nan_counts(store);
    let with_gaps = gaps.values().filter(|n| **n > 0).count();
    info!(
        "{}: {} of {} series have missing months ({} in total)",
        network,
        with_gaps,
        gaps.len(),
        gaps.values().sum::<usize>()
    );
    for (id, n) in gaps.iter().filter(|(_, n)| **n > 0) {
        debug!("  {}: {} missing months", id, n);
    }

    match coverage(store) {
        Some(c) => info!(
            "{}: {} stations, {}..{} observed months, starts {}..{}, ends {}..{}",
            network,
            c.stations,
            c.min_months,
            c.max_months,
            c.earliest_start,
            c.latest_start,
            c.earliest_end,
            c.latest_end
        ),
        None => warn!("{}: no observations", network),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::{DailySeries, MonthlySeries};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn histogram_matches_equal_width_bins() {
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        let histogram = Histogram::new(&values, 10);
        assert_eq!(histogram.edges.len(), 11);
        assert_eq!(histogram.edges[0], 0.0);
        assert_eq!(histogram.edges[10], 10.0);
        // The maximum lands in the last, right-closed bin.
        assert_eq!(histogram.counts, vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 2]);

        let single = Histogram::new(&[5.0, 5.0], 10);
        assert_eq!(single.edges[0], 4.5);
        assert_eq!(single.total(), 2);
        assert_eq!(single.counts[5], 2);
    }

    #[test]
    fn finds_unsorted_series() {
        let mut series = BTreeMap::new();
        series.insert(1, DailySeries::new(1, vec![(day(2000, 1, 1), 1.0), (day(2000, 1, 2), 1.0)]));
        series.insert(2, DailySeries::new(2, vec![(day(2000, 1, 2), 1.0), (day(2000, 1, 1), 1.0)]));
        let loaded = LoadedNetwork {
            network: Network::Precipitation,
            series,
            stations: Vec::new(),
        };
        assert_eq!(non_monotonic_stations(&loaded), vec![2]);
        assert_eq!(row_count_histogram(&loaded, 10).total(), 2);
    }

    #[test]
    fn coverage_and_gaps() {
        let mut store = SeriesStore::new(Network::GroundwaterLevel);
        store.series.insert(
            1,
            MonthlySeries::new(1, Month::new(1, 1990), vec![1.0, f64::NAN, 3.0]),
        );
        store.series.insert(
            2,
            MonthlySeries::new(2, Month::new(6, 1985), vec![f64::NAN, 1.0, 2.0, 3.0, 4.0, 5.0]),
        );

        assert_eq!(nan_counts(&store), BTreeMap::from([(1, 1), (2, 1)]));
        let c = coverage(&store).unwrap();
        assert_eq!(c.stations, 2);
        assert_eq!((c.min_months, c.max_months), (3, 5));
        assert_eq!(c.earliest_start, Month::new(7, 1985));
        assert_eq!(c.latest_start, Month::new(1, 1990));
        assert_eq!(c.latest_end, Month::new(3, 1990));
        assert!(coverage(&SeriesStore::new(Network::Snowfall)).is_none());
    }
}
