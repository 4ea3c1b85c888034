//! Attaching the nearest stations of every other network to each groundwater station.

use crate::stations::error::LocateStationError;
use crate::stations::locate_station::StationLocator;
use crate::types::network::Network;
use crate::types::station::{Station, StationId};
use log::{debug, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// For each target station and neighbour network, the neighbour ids nearest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborTable {
    rows: BTreeMap<StationId, BTreeMap<Network, Vec<StationId>>>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: StationId, network: Network, neighbours: Vec<StationId>) {
        self.rows
            .entry(target)
            .or_default()
            .insert(network, neighbours);
    }

    /// Neighbours of `target` in `network`; empty when unknown.
    pub fn neighbours(&self, target: StationId, network: Network) -> &[StationId] {
        self.rows
            .get(&target)
            .and_then(|row| row.get(&network))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn targets(&self) -> impl Iterator<Item = StationId> + '_ {
        self.rows.keys().copied()
    }

    pub fn contains(&self, target: StationId) -> bool {
        self.rows.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every station of `network` referenced by at least one target.
    pub fn referenced(&self, network: Network) -> BTreeSet<StationId> {
        self.rows
            .values()
            .filter_map(|row| row.get(&network))
            .flatten()
            .copied()
            .collect()
    }

    /// One row per target: `hzbnr01`, then one `nearest_<prefix>` column per network
    /// holding the `|`-joined neighbour ids.
    pub fn to_dataframe(&self, networks: &[Network]) -> Result<DataFrame, LocateStationError> {
        let targets: Vec<u32> = self.targets().collect();
        let mut columns = vec![Column::new("hzbnr01".into(), targets.clone())];
        for network in networks {
            let joined: Vec<String> = targets
                .iter()
                .map(|t| {
                    self.neighbours(*t, *network)
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join("|")
                })
                .collect();
            columns.push(Column::new(
                format!("nearest_{}", network.prefix()).into(),
                joined,
            ));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Builds the neighbour table for `targets`. `neighbours` lists each network with the
/// number of stations to attach; a network with no indexed stations contributes empty
/// lists.
pub fn associate(
    targets: &[Station],
    locators: &BTreeMap<Network, StationLocator>,
    neighbours: &[(Network, usize)],
) -> Result<NeighborTable, LocateStationError> {
    let mut table = NeighborTable::new();
    for (network, _) in neighbours {
        match locators.get(network) {
            None => return Err(LocateStationError::MissingNetwork(*network)),
            Some(locator) if locator.is_empty() => {
                warn!("No {} stations with coordinates, neighbour lists stay empty", network)
            }
            Some(_) => {}
        }
    }

    for target in targets {
        for (network, k) in neighbours {
            let ids = locators
                .get(network)
                .map(|locator| locator.nearest_ids(target.location.x, target.location.y, *k))
                .unwrap_or_default();
            table.insert(target.id, *network, ids);
        }
    }
    debug!(
        "Associated {} targets with {} neighbour networks",
        table.len(),
        neighbours.len()
    );
    Ok(table)
}
