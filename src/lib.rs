pub mod config;
pub mod diagnostics;
mod ehyd;
mod error;
pub mod frames;
pub mod ingest;
pub mod model;
pub mod persistence;
pub mod processing;
pub mod stations;
pub mod types;
mod utils;
pub mod windows;

pub use config::PipelineConfig;
pub use ehyd::*;
pub use error::EhydError;

pub use types::month::{Calendar, Month};
pub use types::network::{Network, Sampling};
pub use types::series::{DailySeries, MonthlySeries, PaddingMode};
pub use types::station::{Location, Station, StationId};
pub use types::store::SeriesStore;

pub use ingest::loader::{LoadedNetwork, NetworkLoader};
pub use ingest::parser::station_id_from_file_name;
pub use processing::impute::ImputationStrategy;
pub use stations::association::NeighborTable;
pub use stations::locate_station::StationLocator;

pub use frames::augmented::{AugmentedStationFrame, FrameLayout, TARGET_COLUMN};
pub use frames::selection::FeatureSelection;
pub use frames::snapshot::MonthlySnapshot;
pub use model::forecast::StationForecast;
pub use model::grid::SarimaGrid;
pub use model::sarima::{Sarima, SarimaForecast, SarimaOrder};

pub use frames::error::FrameError;
pub use ingest::error::IngestError;
pub use model::error::ModelError;
pub use persistence::error::PersistenceError;
pub use stations::error::LocateStationError;
