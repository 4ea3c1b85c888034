use crate::frames::error::FrameError;
use crate::ingest::error::IngestError;
use crate::model::error::ModelError;
use crate::persistence::error::PersistenceError;
use crate::stations::error::LocateStationError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EhydError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    LocateStation(#[from] LocateStationError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to create work directory '{0}'")]
    WorkDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("No groundwater station has both a series and neighbours")]
    NoTargets,
}
