use crate::ingest::error::IngestError;
use crate::ingest::parser::{decode_latin1, parse_measurements, station_id_from_file_name};
use crate::ingest::station_list::read_station_list;
use crate::types::network::Network;
use crate::types::series::DailySeries;
use crate::types::station::{Station, StationId};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw series of one network plus the coordinates of the stations that have one.
#[derive(Debug, Clone)]
pub struct LoadedNetwork {
    pub network: Network,
    pub series: BTreeMap<StationId, DailySeries>,
    /// Stations present in both the measurement folder and the station list,
    /// in station list order.
    pub stations: Vec<Station>,
}

/// Reads the eHYD export folders below a dataset root.
pub struct NetworkLoader {
    dataset_root: PathBuf,
}

impl NetworkLoader {
    pub fn new(dataset_root: &Path) -> NetworkLoader {
        NetworkLoader {
            dataset_root: dataset_root.to_path_buf(),
        }
    }

    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    /// Parses every `.csv` in the network's folder and matches the stations to the
    /// category's station list.
    ///
    /// Unreadable and malformed files are logged and skipped.
    pub fn load(&self, network: Network) -> Result<LoadedNetwork, IngestError> {
        let data_dir = network.data_dir(&self.dataset_root);
        let series = Self::read_folder(&data_dir)?;

        let list_path = network.station_list_path(&self.dataset_root);
        let stations: Vec<Station> = read_station_list(&list_path)?
            .into_iter()
            .filter(|record| series.contains_key(&record.id))
            .map(|record| Station::new(record.id, network, record.x, record.y))
            .collect();

        if stations.len() < series.len() {
            debug!(
                "{} of {} {} stations have no coordinates",
                series.len() - stations.len(),
                series.len(),
                network
            );
        }
        info!(
            "Loaded {} {} series ({} with coordinates) from {}",
            series.len(),
            network,
            stations.len(),
            data_dir.display()
        );

        Ok(LoadedNetwork {
            network,
            series,
            stations,
        })
    }

    fn read_folder(dir: &Path) -> Result<BTreeMap<StationId, DailySeries>, IngestError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| IngestError::DirectoryRead(dir.to_path_buf(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        paths.sort();

        let mut series = BTreeMap::new();
        for path in paths {
            match Self::read_file(&path) {
                Ok(Some(daily)) => {
                    if series.insert(daily.station, daily).is_some() {
                        warn!("Duplicate station file {}, keeping the last one", path.display());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(series)
    }

    /// Reads a single export file. `Ok(None)` means the file was skipped.
    pub fn read_file(path: &Path) -> Result<Option<DailySeries>, IngestError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(station) = station_id_from_file_name(&file_name) else {
            warn!("Skipping {}: no numeric station id in file name", path.display());
            return Ok(None);
        };

        let bytes = fs::read(path).map_err(|e| IngestError::FileRead(path.to_path_buf(), e))?;
        match parse_measurements(&decode_latin1(&bytes)) {
            Ok(observations) => Ok(Some(DailySeries::new(station, observations))),
            Err(reason) => {
                warn!("Skipping {}: {:?}", path.display(), reason);
                Ok(None)
            }
        }
    }
}
