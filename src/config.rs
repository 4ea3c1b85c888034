//! Pipeline settings, built in code or loaded from a JSON file.

use crate::error::EhydError;
use crate::frames::augmented::FrameLayout;
use crate::model::grid::SarimaGrid;
use crate::processing::impute::ImputationStrategy;
use crate::types::month::Calendar;
use crate::types::network::Network;
use crate::types::series::PaddingMode;
use crate::utils::get_cache_dir;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings of both pipeline phases.
///
/// Every field has a default, so a JSON file only needs the fields it changes.
///
/// # Examples
///
/// ```
/// use ehyd::{Network, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .dataset_root("data")
///     .horizon(12)
///     .neighbours([(Network::Precipitation, 1)].into())
///     .build();
///
/// let counts = config.neighbour_counts();
/// assert_eq!(counts[0], (Network::GroundwaterTemperature, 1));
/// assert_eq!(counts[1], (Network::Precipitation, 1));
/// assert_eq!(counts[2], (Network::Snowfall, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folder holding the `Groundwater`, `Precipitation`, `Sources` and `Surface_Water`
    /// exports.
    #[builder(into)]
    pub dataset_root: PathBuf,
    /// Where stores, frames and forecasts are written. Defaults to the platform cache
    /// directory.
    #[builder(into)]
    pub work_dir: Option<PathBuf>,
    #[builder(default)]
    pub calendar: Calendar,
    #[builder(default)]
    pub padding: PaddingMode,
    #[builder(default)]
    pub imputation: ImputationStrategy,
    /// Rolling mean window in months.
    #[builder(default = 6)]
    pub window: usize,
    /// Hold-out length and forecast horizon in months.
    #[builder(default = 24)]
    pub horizon: usize,
    #[builder(default = 10)]
    pub max_features: usize,
    #[builder(default = 0.0)]
    pub min_abs_correlation: f64,
    /// Per-network neighbour counts overriding [`Network::default_neighbours`].
    #[builder(default)]
    pub neighbours: BTreeMap<Network, usize>,
    #[builder(default)]
    pub grid: SarimaGrid,
    /// Restricts the groundwater targets to the ids in this file's header.
    #[builder(into)]
    pub points_file: Option<PathBuf>,
    #[builder(default)]
    pub write_snapshots: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::builder().dataset_root("data").build()
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, EhydError> {
        let text =
            fs::read_to_string(path).map_err(|e| EhydError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| EhydError::ConfigParse(path.to_path_buf(), e))
    }

    /// Neighbour networks in column order with their neighbour counts.
    pub fn neighbour_counts(&self) -> Vec<(Network, usize)> {
        Network::neighbour_networks()
            .map(|network| {
                let k = self
                    .neighbours
                    .get(&network)
                    .copied()
                    .unwrap_or_else(|| network.default_neighbours());
                (network, k)
            })
            .collect()
    }

    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout {
            calendar: self.calendar,
            window: self.window,
            padding: self.padding,
            neighbours: self.neighbour_counts(),
        }
    }

    /// The configured work directory, or the default cache directory.
    pub fn resolve_work_dir(&self) -> Result<PathBuf, EhydError> {
        match &self.work_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir(),
        }
    }
}
