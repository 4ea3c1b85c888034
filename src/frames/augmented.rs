//! One frame per groundwater station: its own history plus features from the
//! nearest stations of every other network.

use crate::frames::error::FrameError;
use crate::processing::features::{add_lag_and_rolling_mean, LagFeatures};
use crate::stations::association::NeighborTable;
use crate::types::month::{Calendar, Month};
use crate::types::network::Network;
use crate::types::series::{pad_values, MonthlySeries, PaddingMode};
use crate::types::station::StationId;
use crate::types::store::SeriesStore;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Name of the target column.
pub const TARGET_COLUMN: &str = "gw_level";

/// The shared schema of every augmented frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub calendar: Calendar,
    /// Rolling mean window in months.
    pub window: usize,
    pub padding: PaddingMode,
    /// Neighbour networks in column order, with the number of ranks per network.
    pub neighbours: Vec<(Network, usize)>,
}

impl FrameLayout {
    /// Base names (without lag suffixes) of the neighbour columns.
    pub fn neighbour_bases(&self) -> Vec<(Network, usize, String)> {
        self.neighbours
            .iter()
            .flat_map(|(network, k)| {
                (1..=*k).map(move |rank| (*network, rank, format!("{}_{}", network.prefix(), rank)))
            })
            .collect()
    }

    /// Every value column in frame order.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(TARGET_COLUMN.to_string())
            .chain(self.neighbour_bases().into_iter().map(|(_, _, base)| base))
            .flat_map(|base| {
                let lag = LagFeatures::lag_name(&base);
                let rolling = LagFeatures::rolling_name(&base, self.window);
                [base, lag, rolling]
            })
            .collect()
    }
}

fn f32_precision(values: &mut [f64]) {
    for v in values {
        *v = *v as f32 as f64;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedStationFrame {
    station: StationId,
    calendar: Calendar,
    /// Calendar positions of the first and last observed target value.
    observed: Option<(usize, usize)>,
    columns: Vec<(String, Vec<f64>)>,
}

impl AugmentedStationFrame {
    /// Joins the target's series with the series of its neighbours.
    ///
    /// Derived features are computed before padding, so with [`PaddingMode::Zero`]
    /// their warm-up is zero as well. A neighbour without a series yields a column of
    /// padding values.
    pub fn assemble(
        target: StationId,
        neighbours: &NeighborTable,
        stores: &BTreeMap<Network, SeriesStore>,
        layout: &FrameLayout,
    ) -> Result<Self, FrameError> {
        let target_store = stores
            .get(&Network::GroundwaterLevel)
            .ok_or(FrameError::MissingStore(Network::GroundwaterLevel))?;
        let target_series = target_store
            .get(target)
            .ok_or(FrameError::MissingTarget(target))?
            .align(&layout.calendar);

        let mut frame = AugmentedStationFrame {
            station: target,
            calendar: layout.calendar,
            observed: target_series.observed_range(),
            columns: Vec::new(),
        };
        frame.push_series(TARGET_COLUMN, target_series.values(), layout);

        let empty = vec![f64::NAN; layout.calendar.len()];
        for (network, rank, base) in layout.neighbour_bases() {
            let store = stores
                .get(&network)
                .ok_or(FrameError::MissingStore(network))?;
            let aligned: Option<MonthlySeries> = neighbours
                .neighbours(target, network)
                .get(rank - 1)
                .and_then(|id| store.get(*id))
                .map(|series| series.align(&layout.calendar));
            let values = aligned.as_ref().map_or(empty.as_slice(), |s| s.values());
            frame.push_series(&base, values, layout);
        }
        Ok(frame)
    }

    /// Builds a frame from already prepared columns. The target must come first.
    pub(crate) fn from_columns(
        station: StationId,
        calendar: Calendar,
        observed: Option<(usize, usize)>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Self {
        AugmentedStationFrame {
            station,
            calendar,
            observed,
            columns,
        }
    }

    fn push_series(&mut self, base: &str, values: &[f64], layout: &FrameLayout) {
        let features = add_lag_and_rolling_mean(values, layout.window);
        let entries = [
            (base.to_string(), values.to_vec()),
            (LagFeatures::lag_name(base), features.lag_1),
            (
                LagFeatures::rolling_name(base, layout.window),
                features.rolling_mean_lag_1,
            ),
        ];
        for (name, mut column) in entries {
            pad_values(&mut column, layout.padding);
            f32_precision(&mut column);
            self.columns.push((name, column));
        }
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn len(&self) -> usize {
        self.calendar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendar.is_empty()
    }

    /// Calendar positions `[first, last]` of the observed target values.
    pub fn observed_range(&self) -> Option<(usize, usize)> {
        self.observed
    }

    pub fn month_at(&self, index: usize) -> Month {
        self.calendar.start.offset(index as i64)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    pub fn target(&self) -> &[f64] {
        // The target is always pushed first.
        self.columns
            .first()
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Columns not derived from the target: the feature-selection candidates.
    pub fn feature_names(&self) -> Vec<&str> {
        self.column_names()
            .filter(|name| !name.starts_with(TARGET_COLUMN))
            .collect()
    }

    /// A `date` column followed by every value column.
    pub fn to_dataframe(&self) -> Result<DataFrame, FrameError> {
        let dates: Vec<NaiveDate> = self
            .calendar
            .months()
            .map(|m| m.first_day().ok_or(FrameError::InvalidMonth(m)))
            .collect::<Result<_, _>>()?;

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new("date".into(), dates));
        for (name, values) in &self.columns {
            columns.push(Column::new(name.as_str().into(), values.as_slice()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::station::Station;

    fn layout() -> FrameLayout {
        FrameLayout {
            calendar: Calendar::new(Month::new(1, 2000), Month::new(12, 2000)),
            window: 2,
            padding: PaddingMode::Zero,
            neighbours: vec![(Network::Precipitation, 2), (Network::Sediment, 1)],
        }
    }

    fn stores() -> BTreeMap<Network, SeriesStore> {
        let mut gw = SeriesStore::new(Network::GroundwaterLevel);
        gw.stations.push(Station::new(100, Network::GroundwaterLevel, 0.0, 0.0));
        gw.series.insert(
            100,
            MonthlySeries::new(100, Month::new(3, 2000), (1..=6).map(|v| v as f64).collect()),
        );
        let mut rain = SeriesStore::new(Network::Precipitation);
        rain.series.insert(
            7,
            MonthlySeries::new(7, Month::new(1, 1999), vec![0.1; 30]),
        );
        let sediment = SeriesStore::new(Network::Sediment);
        BTreeMap::from([
            (Network::GroundwaterLevel, gw),
            (Network::Precipitation, rain),
            (Network::Sediment, sediment),
        ])
    }

    #[test]
    fn layout_column_order() {
        let names = layout().column_names();
        assert_eq!(names.len(), 12);
        assert_eq!(
            &names[..6],
            &[
                "gw_level",
                "gw_level_lag_1",
                "gw_level_rolling_mean_2_lag_1",
                "rain_1",
                "rain_1_lag_1",
                "rain_1_rolling_mean_2_lag_1"
            ]
        );
        assert_eq!(names[9], "sediment_1");
    }

    #[test]
    fn assembles_target_and_neighbours() {
        let mut table = NeighborTable::new();
        table.insert(100, Network::Precipitation, vec![7, 8]);
        table.insert(100, Network::Sediment, vec![]);

        let layout = layout();
        let frame = AugmentedStationFrame::assemble(100, &table, &stores(), &layout).unwrap();
        assert_eq!(frame.len(), 12);
        assert_eq!(frame.column_names().map(String::from).collect::<Vec<_>>(), layout.column_names());
        assert_eq!(frame.observed_range(), Some((2, 7)));

        let target = frame.target();
        assert_eq!(target[0], 0.0);
        assert_eq!(target[2], 1.0);
        assert_eq!(target[7], 6.0);
        assert_eq!(target[8], 0.0);

        let lag = frame.column("gw_level_lag_1").unwrap();
        assert_eq!(lag[3], 1.0);
        let rolling = frame.column("gw_level_rolling_mean_2_lag_1").unwrap();
        assert_eq!(rolling[4], 1.5);
        // Window still touches the unobserved months.
        assert_eq!(rolling[3], 0.0);

        let rain = frame.column("rain_1").unwrap();
        assert!(rain.iter().all(|v| *v == 0.1f32 as f64));
        assert!(frame.column("rain_2").unwrap().iter().all(|v| *v == 0.0));
        assert!(frame.column("sediment_1").unwrap().iter().all(|v| *v == 0.0));
        assert!(!frame.feature_names().iter().any(|n| n.starts_with("gw_level")));
    }

    #[test]
    fn missing_target_is_an_error() {
        let table = NeighborTable::new();
        let result = AugmentedStationFrame::assemble(5, &table, &stores(), &layout());
        assert!(matches!(result, Err(FrameError::MissingTarget(5))));
    }

    #[test]
    fn dataframe_has_date_column() {
        let table = NeighborTable::new();
        let frame = AugmentedStationFrame::assemble(100, &table, &stores(), &layout()).unwrap();
        let df = frame.to_dataframe().unwrap();
        assert_eq!(df.shape(), (12, 13));
        assert_eq!(df.get_column_names()[0].as_str(), "date");
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }
}
