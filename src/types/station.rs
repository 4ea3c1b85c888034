//! Defines the measurement station record and the implementations
//! needed to index stations spatially with the `rstar` crate.

use crate::types::network::Network;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// eHYD station number (`hzbnr01`).
pub type StationId = u32;

/// A single measurement station of one network.
///
/// Coordinates are the projected `x`/`y` values from the network's
/// `messstellen_alle.csv`, so plain Euclidean distance is meaningful.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// The eHYD station number (`hzbnr01`).
    pub id: StationId,
    /// The network whose files this station reports in.
    pub network: Network,
    /// Projected location of the station.
    pub location: Location,
}

/// Projected planar coordinates of a station.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Station {
    pub fn new(id: StationId, network: Network, x: f64, y: f64) -> Self {
        Self {
            id,
            network,
            location: Location { x, y },
        }
    }

    /// Euclidean distance to a point in the same projection.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        self.distance_2(&[x, y]).sqrt()
    }
}

// --- R-Tree Implementations ---

/// A station is a degenerate bounding box at its own location.
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// Squared Euclidean distance between the station and a query point `[x, y]`.
impl PointDistance for Station {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.x - point[0];
        let dy = self.location.y - point[1];
        dx * dx + dy * dy
    }
}
