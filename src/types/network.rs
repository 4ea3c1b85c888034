//! Defines the eHYD measurement networks and where their raw files live.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How often a network reports values in its raw files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sampling {
    /// Daily sums or daily means, resampled to monthly means on ingestion.
    Daily,
    /// Monthly means, used as they are.
    Monthly,
}

/// One of the eleven eHYD measurement networks.
///
/// Each network has its own station list (shared per category folder), its own
/// folder of per-station CSV files and a native sampling frequency. Groundwater
/// level is the forecasting target; every other network contributes neighbour
/// features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Network {
    /// Monthly mean groundwater level.
    GroundwaterLevel,
    /// Monthly mean groundwater temperature.
    GroundwaterTemperature,
    /// Daily precipitation sums.
    Precipitation,
    /// Daily snowfall sums.
    Snowfall,
    /// Daily mean spring discharge.
    SpringFlowRate,
    /// Daily mean spring conductivity.
    SpringConductivity,
    /// Daily mean spring water temperature.
    SpringTemperature,
    /// Daily mean surface-water level.
    SurfaceWaterLevel,
    /// Monthly mean surface-water temperature.
    SurfaceWaterTemperature,
    /// Daily suspended sediment load.
    Sediment,
    /// Daily mean surface-water discharge.
    SurfaceWaterFlowRate,
}

impl Network {
    pub const ALL: [Network; 11] = [
        Network::GroundwaterLevel,
        Network::GroundwaterTemperature,
        Network::Precipitation,
        Network::Snowfall,
        Network::SpringFlowRate,
        Network::SpringConductivity,
        Network::SpringTemperature,
        Network::SurfaceWaterLevel,
        Network::SurfaceWaterTemperature,
        Network::Sediment,
        Network::SurfaceWaterFlowRate,
    ];

    /// All networks that provide neighbour features for groundwater targets.
    pub fn neighbour_networks() -> impl Iterator<Item = Network> {
        Self::ALL
            .into_iter()
            .filter(|n| *n != Network::GroundwaterLevel)
    }

    /// Top-level dataset folder holding the network's station list.
    pub fn category(&self) -> &'static str {
        match self {
            Network::GroundwaterLevel | Network::GroundwaterTemperature => "Groundwater",
            Network::Precipitation | Network::Snowfall => "Precipitation",
            Network::SpringFlowRate | Network::SpringConductivity | Network::SpringTemperature => {
                "Sources"
            }
            Network::SurfaceWaterLevel
            | Network::SurfaceWaterTemperature
            | Network::Sediment
            | Network::SurfaceWaterFlowRate => "Surface_Water",
        }
    }

    /// Folder (inside [`Network::category`]) holding one CSV file per station.
    pub fn folder(&self) -> &'static str {
        match self {
            Network::GroundwaterLevel => "Grundwasserstand-Monatsmittel",
            Network::GroundwaterTemperature => "Grundwassertemperatur-Monatsmittel",
            Network::Precipitation => "N-Tagessummen",
            Network::Snowfall => "NS-Tagessummen",
            Network::SpringFlowRate => "Quellschüttung-Tagesmittel",
            Network::SpringConductivity => "Quellleitfähigkeit-Tagesmittel",
            Network::SpringTemperature => "Quellwassertemperatur-Tagesmittel",
            Network::SurfaceWaterLevel => "W-Tagesmittel",
            Network::SurfaceWaterTemperature => "WT-Monatsmittel",
            Network::Sediment => "Schwebstoff-Tagesfracht",
            Network::SurfaceWaterFlowRate => "Q-Tagesmittel",
        }
    }

    pub fn sampling(&self) -> Sampling {
        match self {
            Network::GroundwaterLevel
            | Network::GroundwaterTemperature
            | Network::SurfaceWaterTemperature => Sampling::Monthly,
            _ => Sampling::Daily,
        }
    }

    /// How many nearest stations of this network are attached to each groundwater station.
    pub fn default_neighbours(&self) -> usize {
        match self {
            Network::GroundwaterLevel => 0,
            Network::Precipitation
            | Network::Snowfall
            | Network::SurfaceWaterLevel
            | Network::SurfaceWaterFlowRate => 3,
            _ => 1,
        }
    }

    /// Column prefix used for features derived from this network.
    pub fn prefix(&self) -> &'static str {
        match self {
            Network::GroundwaterLevel => "gw_level",
            Network::GroundwaterTemperature => "gw_temp",
            Network::Precipitation => "rain",
            Network::Snowfall => "snow",
            Network::SpringFlowRate => "source_fr",
            Network::SpringConductivity => "conductivity",
            Network::SpringTemperature => "source_temp",
            Network::SurfaceWaterLevel => "owf_level",
            Network::SurfaceWaterTemperature => "owf_temp",
            Network::Sediment => "sediment",
            Network::SurfaceWaterFlowRate => "owf_fr",
        }
    }

    pub(crate) fn station_list_path(&self, dataset_root: &std::path::Path) -> PathBuf {
        dataset_root
            .join(self.category())
            .join("messstellen_alle.csv")
    }

    pub(crate) fn data_dir(&self, dataset_root: &std::path::Path) -> PathBuf {
        dataset_root.join(self.category()).join(self.folder())
    }

    pub(crate) fn cache_file_name(&self) -> String {
        format!("{}.bin", self.prefix())
    }
}

/// Formats a `Network` using its column prefix.
///
/// # Examples
///
/// ```
/// use ehyd::Network;
///
/// assert_eq!(Network::Precipitation.to_string(), "rain");
/// ```
impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
