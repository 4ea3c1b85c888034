use crate::types::network::Network;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateStationError {
    #[error("No station index was built for network '{0}'")]
    MissingNetwork(Network),

    #[error("Failed to build neighbour table frame")]
    TableFrame(#[from] polars::error::PolarsError),
}
