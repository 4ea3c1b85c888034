use crate::ingest::loader::LoadedNetwork;
use crate::types::month::Month;
use crate::types::network::Sampling;
use crate::types::series::{DailySeries, MonthlySeries};
use crate::types::station::StationId;
use crate::types::store::SeriesStore;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Monthly mean of the finite observations of each calendar month.
///
/// Monthly-native files hold one row per month and pass through unchanged; several
/// rows in one month are averaged.
pub fn resample_monthly(daily: &DailySeries) -> MonthlySeries {
    MonthlySeries::from_observations(
        daily.station,
        daily
            .observations
            .iter()
            .map(|(date, value)| (Month::from_date(*date), *value)),
    )
}

/// Stations of a monthly network with more than one row for some month.
///
/// Always empty for daily networks, where several rows per month are expected.
pub fn stations_with_repeated_months(loaded: &LoadedNetwork) -> Vec<StationId> {
    if loaded.network.sampling() == Sampling::Daily {
        return Vec::new();
    }
    loaded
        .series
        .iter()
        .filter(|(_, series)| {
            let months: BTreeSet<Month> = series
                .observations
                .iter()
                .map(|(date, _)| Month::from_date(*date))
                .collect();
            months.len() < series.observations.len()
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Resamples every series of a loaded network into a store.
pub fn to_series_store(loaded: &LoadedNetwork) -> SeriesStore {
    let repeated = stations_with_repeated_months(loaded);
    if !repeated.is_empty() {
        warn!(
            "{}: {} monthly series repeat a month, averaging: {:?}",
            loaded.network,
            repeated.len(),
            repeated
        );
    }
    debug!(
        "Resampling {} {:?} series of {}",
        loaded.series.len(),
        loaded.network.sampling(),
        loaded.network
    );

    let mut store = SeriesStore::new(loaded.network);
    store.stations = loaded.stations.clone();
    for (id, daily) in &loaded.series {
        let monthly = resample_monthly(daily);
        if monthly.is_empty() {
            debug!("{} station {} has no observations", loaded.network, id);
            continue;
        }
        store.series.insert(*id, monthly);
    }
    store
}
