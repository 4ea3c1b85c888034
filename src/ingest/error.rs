use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to list measurement directory '{0}'")]
    DirectoryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read measurement file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read station list '{path}'")]
    StationListRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to read points file '{path}'")]
    PointsRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
