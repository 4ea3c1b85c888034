use crate::frames::augmented::AugmentedStationFrame;
use crate::frames::error::FrameError;
use crate::types::month::Month;
use crate::types::station::StationId;
use polars::prelude::*;
use std::collections::BTreeMap;

/// All stations' frame rows for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySnapshot {
    pub month: Month,
    pub stations: Vec<StationId>,
    pub columns: Vec<(String, Vec<f64>)>,
}

impl MonthlySnapshot {
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// A `station` column followed by every value column.
    pub fn to_dataframe(&self) -> Result<DataFrame, FrameError> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new("station".into(), self.stations.as_slice()));
        for (name, values) in &self.columns {
            columns.push(Column::new(name.as_str().into(), values.as_slice()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Reshapes per-station frames into one cross-section per calendar month.
///
/// Every frame must share the first frame's columns and calendar.
pub fn monthly_snapshots(
    frames: &[AugmentedStationFrame],
) -> Result<BTreeMap<Month, MonthlySnapshot>, FrameError> {
    let Some(first) = frames.first() else {
        return Ok(BTreeMap::new());
    };
    let names: Vec<&str> = first.column_names().collect();
    for frame in frames {
        if frame.calendar() != first.calendar() || !frame.column_names().eq(names.iter().copied()) {
            return Err(FrameError::SchemaMismatch {
                station: frame.station(),
            });
        }
    }

    let stations: Vec<StationId> = frames.iter().map(|f| f.station()).collect();
    let snapshots = (0..first.len())
        .map(|row| {
            let columns = first
                .columns()
                .iter()
                .enumerate()
                .map(|(c, (name, _))| {
                    let values = frames.iter().map(|f| f.columns()[c].1[row]).collect();
                    (name.clone(), values)
                })
                .collect();
            let month = first.month_at(row);
            (
                month,
                MonthlySnapshot {
                    month,
                    stations: stations.clone(),
                    columns,
                },
            )
        })
        .collect();
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::augmented::{FrameLayout, TARGET_COLUMN};
    use crate::stations::association::NeighborTable;
    use crate::types::month::Calendar;
    use crate::types::network::Network;
    use crate::types::series::{MonthlySeries, PaddingMode};
    use crate::types::store::SeriesStore;

    fn frames() -> Vec<AugmentedStationFrame> {
        let layout = FrameLayout {
            calendar: Calendar::new(Month::new(1, 2010), Month::new(6, 2010)),
            window: 2,
            padding: PaddingMode::Zero,
            neighbours: vec![(Network::Snowfall, 1)],
        };
        let mut gw = SeriesStore::new(Network::GroundwaterLevel);
        for id in [1u32, 2, 3] {
            gw.series.insert(
                id,
                MonthlySeries::new(id, Month::new(1, 2010), vec![id as f64; 6]),
            );
        }
        let stores = BTreeMap::from([
            (Network::GroundwaterLevel, gw),
            (Network::Snowfall, SeriesStore::new(Network::Snowfall)),
        ]);
        let table = NeighborTable::new();
        [1, 2, 3]
            .into_iter()
            .map(|id| AugmentedStationFrame::assemble(id, &table, &stores, &layout).unwrap())
            .collect()
    }

    #[test]
    fn one_snapshot_per_month() {
        let snapshots = monthly_snapshots(&frames()).unwrap();
        assert_eq!(snapshots.len(), 6);
        let march = &snapshots[&Month::new(3, 2010)];
        assert_eq!(march.stations, vec![1, 2, 3]);
        assert_eq!(march.columns.len(), 6);
        assert_eq!(march.column(TARGET_COLUMN).unwrap(), &[1.0, 2.0, 3.0]);

        let df = march.to_dataframe().unwrap();
        assert_eq!(df.shape(), (3, 7));
        assert_eq!(df.get_column_names()[0].as_str(), "station");
    }

    #[test]
    fn empty_input_gives_no_snapshots() {
        assert!(monthly_snapshots(&[]).unwrap().is_empty());
    }
}
