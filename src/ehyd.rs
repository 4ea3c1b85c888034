use crate::config::PipelineConfig;
use crate::diagnostics::{self, Coverage};
use crate::error::EhydError;
use crate::frames::augmented::{AugmentedStationFrame, TARGET_COLUMN};
use crate::frames::selection::{select_features, FeatureSelection};
use crate::frames::snapshot::monthly_snapshots;
use crate::ingest::loader::{LoadedNetwork, NetworkLoader};
use crate::ingest::points::read_points_file;
use crate::model::error::ModelError;
use crate::model::forecast::{forecast_station, summary_dataframe, StationForecast};
use crate::persistence::cache::{
    load_neighbor_table, load_store, save_neighbor_table, save_store,
};
use crate::persistence::tables::{write_csv, write_parquet};
use crate::processing::normalize_series;
use crate::processing::resample::to_series_store;
use crate::stations::association::{associate, NeighborTable};
use crate::stations::locate_station::StationLocator;
use crate::types::network::Network;
use crate::types::station::{Station, StationId};
use crate::types::store::SeriesStore;
use crate::utils::ensure_dir_exists;
use bon::bon;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const FRAMES_DIR_NAME: &str = "frames";
const SNAPSHOTS_DIR_NAME: &str = "snapshots";
const FORECASTS_DIR_NAME: &str = "forecasts";
const NEIGHBORS_CSV_FILE_NAME: &str = "neighbors.csv";
const FORECASTS_CSV_FILE_NAME: &str = "forecasts.csv";

/// Output of the prepare phase: imputed, calendar-aligned stores per network and the
/// neighbour table of every groundwater target.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    pub stores: BTreeMap<Network, SeriesStore>,
    pub neighbours: NeighborTable,
}

impl PreparedData {
    pub fn targets(&self) -> Vec<StationId> {
        self.neighbours.targets().collect()
    }
}

/// Output of the forecast phase.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub selection: FeatureSelection,
    pub forecasts: Vec<StationForecast>,
    /// Stations whose forecast failed, with the reason.
    pub failures: Vec<(StationId, ModelError)>,
}

/// The groundwater forecasting pipeline.
///
/// An `Ehyd` owns a [`PipelineConfig`] and a work directory. The pipeline runs in two
/// phases that communicate through the work directory:
///
/// * [`Ehyd::prepare`] reads the raw exports, associates every groundwater station
///   with its nearest stations of the other networks, imputes the monthly series and
///   persists them.
/// * [`Ehyd::forecast`] assembles one frame per groundwater station, selects features
///   across stations, and fits and evaluates one SARIMA model per station.
///
/// [`Ehyd::run`] executes both.
pub struct Ehyd {
    config: PipelineConfig,
    work_dir: PathBuf,
}

#[bon]
impl Ehyd {
    /// Creates a pipeline that writes to the configured work directory, or to
    /// `ehyd_cache` inside the platform cache directory when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`EhydError::CacheDirResolution`] if no cache directory can be determined,
    /// and [`EhydError::WorkDirCreation`] if the work directory cannot be created.
    pub fn new(config: PipelineConfig) -> Result<Self, EhydError> {
        let work_dir = config.resolve_work_dir()?;
        Self::with_work_dir(config, work_dir)
    }

    /// Creates a pipeline writing to `work_dir`, ignoring the configured work directory.
    pub fn with_work_dir(config: PipelineConfig, work_dir: PathBuf) -> Result<Self, EhydError> {
        ensure_dir_exists(&work_dir)?;
        Ok(Self { config, work_dir })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Reads the raw exports of every network.
    ///
    /// The groundwater level network is required. A neighbour network whose folder or
    /// station list cannot be read is logged and treated as empty.
    pub fn load_networks(&self) -> Result<BTreeMap<Network, LoadedNetwork>, EhydError> {
        let loader = NetworkLoader::new(&self.config.dataset_root);
        let mut networks = BTreeMap::new();
        for network in Network::ALL {
            let loaded = match loader.load(network) {
                Ok(loaded) => loaded,
                Err(e) if network != Network::GroundwaterLevel => {
                    warn!("Skipping {} network: {}", network, e);
                    LoadedNetwork {
                        network,
                        series: BTreeMap::new(),
                        stations: Vec::new(),
                    }
                }
                Err(e) => return Err(e.into()),
            };
            networks.insert(network, loaded);
        }
        Ok(networks)
    }

    fn select_targets(&self, store: &SeriesStore) -> Result<Vec<Station>, EhydError> {
        let mut targets = store.stations.clone();
        if let Some(points_file) = &self.config.points_file {
            let points = read_points_file(points_file)?;
            let available: BTreeSet<StationId> = targets.iter().map(|s| s.id).collect();
            let missing: Vec<&StationId> = points.difference(&available).collect();
            if !missing.is_empty() {
                warn!("Requested points without series or coordinates: {:?}", missing);
            }
            targets.retain(|s| points.contains(&s.id));
        }
        if targets.is_empty() {
            return Err(EhydError::NoTargets);
        }
        Ok(targets)
    }

    /// Runs the prepare phase and persists its output to the work directory.
    ///
    /// # Errors
    ///
    /// Fails when the groundwater exports cannot be read, when no groundwater station
    /// remains as target, or when the output cannot be written. Malformed single files
    /// are skipped with a warning.
    pub fn prepare(&self) -> Result<PreparedData, EhydError> {
        let loaded = self.load_networks()?;
        for network in loaded.values() {
            diagnostics::log_loaded(network);
        }
        let mut stores: BTreeMap<Network, SeriesStore> = loaded
            .iter()
            .map(|(network, loaded)| (*network, to_series_store(loaded)))
            .collect();

        let target_store = stores
            .get(&Network::GroundwaterLevel)
            .ok_or(EhydError::NoTargets)?;
        let targets = self.select_targets(target_store)?;

        let neighbour_counts = self.config.neighbour_counts();
        let locators: BTreeMap<Network, StationLocator> = neighbour_counts
            .iter()
            .map(|(network, _)| {
                let stations = stores
                    .get(network)
                    .map(|store| store.stations.clone())
                    .unwrap_or_default();
                (*network, StationLocator::new(stations))
            })
            .collect();
        let neighbours = associate(&targets, &locators, &neighbour_counts)?;

        let target_ids: BTreeSet<StationId> = targets.iter().map(|s| s.id).collect();
        for (network, store) in stores.iter_mut() {
            let before = store.len();
            if *network == Network::GroundwaterLevel {
                store.retain(&target_ids);
            } else {
                store.retain(&neighbours.referenced(*network));
            }
            info!("{}: keeping {} of {} series", network, store.len(), before);
        }

        for (network, store) in stores.iter_mut() {
            for series in store.series.values_mut() {
                *series = normalize_series(
                    series,
                    &self.config.calendar,
                    self.config.imputation,
                    &self.config.grid,
                );
            }
            diagnostics::log_store(*network, store);
        }

        let prepared = PreparedData { stores, neighbours };
        self.persist(&prepared)?;
        Ok(prepared)
    }

    fn persist(&self, prepared: &PreparedData) -> Result<(), EhydError> {
        for store in prepared.stores.values() {
            let path = save_store(store, &self.work_dir)?;
            info!("Saved {} {} series to {}", store.len(), store.network, path.display());
        }
        save_neighbor_table(&prepared.neighbours, &self.work_dir)?;

        let networks: Vec<Network> = Network::neighbour_networks().collect();
        let mut table = prepared.neighbours.to_dataframe(&networks)?;
        let csv_path = self.work_dir.join(NEIGHBORS_CSV_FILE_NAME);
        write_csv(&mut table, &csv_path)?;
        info!(
            "Saved neighbours of {} targets to {}",
            prepared.neighbours.len(),
            csv_path.display()
        );
        Ok(())
    }

    /// Loads the output of an earlier [`Ehyd::prepare`] from the work directory.
    ///
    /// # Errors
    ///
    /// Returns [`EhydError::Persistence`] when a store or the neighbour table is missing
    /// or cannot be decoded.
    pub fn load_prepared(&self) -> Result<PreparedData, EhydError> {
        let mut stores = BTreeMap::new();
        for network in Network::ALL {
            stores.insert(network, load_store(network, &self.work_dir)?);
        }
        let neighbours = load_neighbor_table(&self.work_dir)?;
        info!(
            "Loaded {} targets from {}",
            neighbours.len(),
            self.work_dir.display()
        );
        Ok(PreparedData { stores, neighbours })
    }

    /// Assembles the augmented frame of every target, in station order.
    pub fn build_frames(
        &self,
        prepared: &PreparedData,
    ) -> Result<Vec<AugmentedStationFrame>, EhydError> {
        let layout = self.config.frame_layout();
        prepared
            .neighbours
            .targets()
            .map(|id| {
                AugmentedStationFrame::assemble(id, &prepared.neighbours, &prepared.stores, &layout)
                    .map_err(EhydError::from)
            })
            .collect()
    }

    /// Runs the forecast phase on prepared data.
    ///
    /// Writes every frame to `frames/<station>.parquet`, optionally every monthly
    /// cross-section to `snapshots/<YYYY-MM>.parquet`, each station's hold-out and
    /// out-of-sample forecast to `forecasts/<station>.csv` and a summary to
    /// `forecasts.csv`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.prepared(&PreparedData)`: **Required.** Output of [`Ehyd::prepare`] or [`Ehyd::load_prepared`].
    /// * `.stations(Vec<StationId>)`: Optional. Only forecast these targets. Feature selection still uses all targets.
    ///
    /// # Errors
    ///
    /// Frame assembly and output errors abort the run. A station whose model fails is
    /// logged and reported in [`ForecastRun::failures`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ehyd::{Ehyd, EhydError, PipelineConfig};
    ///
    /// # fn main() -> Result<(), EhydError> {
    /// let pipeline = Ehyd::new(PipelineConfig::builder().dataset_root("data").build())?;
    /// let prepared = pipeline.load_prepared()?;
    /// let run = pipeline
    ///     .forecast()
    ///     .prepared(&prepared)
    ///     .stations(vec![300111])
    ///     .call()?;
    /// for forecast in &run.forecasts {
    ///     println!("{}", forecast.summary());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn forecast(
        &self,
        prepared: &PreparedData,
        stations: Option<Vec<StationId>>,
    ) -> Result<ForecastRun, EhydError> {
        let frames = self.build_frames(prepared)?;
        let frames_dir = self.work_dir.join(FRAMES_DIR_NAME);
        for frame in &frames {
            let mut df = frame.to_dataframe()?;
            write_parquet(&mut df, &frames_dir.join(format!("{}.parquet", frame.station())))?;
        }
        info!("Wrote {} frames to {}", frames.len(), frames_dir.display());

        let snapshots = monthly_snapshots(&frames)?;
        if self.config.write_snapshots {
            let snapshots_dir = self.work_dir.join(SNAPSHOTS_DIR_NAME);
            for (month, snapshot) in &snapshots {
                let mut df = snapshot.to_dataframe()?;
                write_parquet(&mut df, &snapshots_dir.join(format!("{}.parquet", month)))?;
            }
            info!("Wrote {} snapshots to {}", snapshots.len(), snapshots_dir.display());
        }

        let selection = select_features(
            &snapshots,
            TARGET_COLUMN,
            self.config.max_features,
            self.config.min_abs_correlation,
        );
        info!("Selected features: {:?}", selection.selected);

        let forecasts_dir = self.work_dir.join(FORECASTS_DIR_NAME);
        let mut forecasts = Vec::new();
        let mut failures = Vec::new();
        let requested = |id: StationId| stations.as_ref().map_or(true, |ids| ids.contains(&id));
        for frame in frames.iter().filter(|f| requested(f.station())) {
            match forecast_station(
                frame,
                &selection.selected,
                self.config.horizon,
                &self.config.grid,
            ) {
                Ok(forecast) => {
                    info!("{}", forecast.summary().trim_end());
                    let mut df = forecast.to_dataframe()?;
                    write_csv(&mut df, &forecasts_dir.join(format!("{}.csv", forecast.station)))?;
                    forecasts.push(forecast);
                }
                Err(e) => {
                    warn!("Forecast for station {} failed: {}", frame.station(), e);
                    failures.push((frame.station(), e));
                }
            }
        }

        let mut summary = summary_dataframe(&forecasts)?;
        let summary_path = self.work_dir.join(FORECASTS_CSV_FILE_NAME);
        write_csv(&mut summary, &summary_path)?;
        info!(
            "Forecast {} stations ({} failed), summary in {}",
            forecasts.len(),
            failures.len(),
            summary_path.display()
        );

        Ok(ForecastRun {
            selection,
            forecasts,
            failures,
        })
    }

    /// Runs [`Ehyd::prepare`] followed by the forecast phase on every target.
    pub fn run(&self) -> Result<ForecastRun, EhydError> {
        let prepared = self.prepare()?;
        self.forecast().prepared(&prepared).call()
    }

    /// Logs raw-data and coverage checks of every network without writing anything.
    ///
    /// Returns the observed coverage of each network's monthly series.
    pub fn diagnostics(&self) -> Result<BTreeMap<Network, Option<Coverage>>, EhydError> {
        let loaded = self.load_networks()?;
        let mut report = BTreeMap::new();
        for (network, loaded) in &loaded {
            diagnostics::log_loaded(loaded);
            let store = to_series_store(loaded);
            diagnostics::log_store(*network, &store);
            report.insert(*network, diagnostics::coverage(&store));
        }
        Ok(report)
    }
}
