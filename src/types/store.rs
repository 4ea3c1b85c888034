//! The per-network collection of monthly series that is persisted between the
//! `prepare` and `forecast` phases.

use crate::types::network::Network;
use crate::types::series::MonthlySeries;
use crate::types::station::{Station, StationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every monthly series of one network, keyed by station id, together with the
/// stations (and coordinates) that have a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStore {
    pub network: Network,
    pub stations: Vec<Station>,
    pub series: BTreeMap<StationId, MonthlySeries>,
}

impl SeriesStore {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            stations: Vec::new(),
            series: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, id: StationId) -> Option<&MonthlySeries> {
        self.series.get(&id)
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Drops every series and station not listed in `keep`.
    pub fn retain(&mut self, keep: &BTreeSet<StationId>) {
        self.series.retain(|id, _| keep.contains(id));
        self.stations.retain(|s| keep.contains(&s.id));
    }
}
