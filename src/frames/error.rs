use crate::types::month::Month;
use crate::types::network::Network;
use crate::types::station::StationId;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("No groundwater level series for station {0}")]
    MissingTarget(StationId),

    #[error("No series store loaded for network '{0}'")]
    MissingStore(Network),

    #[error("Frame of station {station} has columns that differ from the first frame")]
    SchemaMismatch { station: StationId },

    #[error("Month {0} cannot be represented as a date")]
    InvalidMonth(Month),

    #[error("Failed building DataFrame: {0}")]
    DataFrame(#[from] PolarsError),
}
