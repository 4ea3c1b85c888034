use crate::types::station::{Station, StationId};
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::cmp::Ordering;

/// Spatial index over the stations of one network.
#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<Station>,
}

// Candidates order by distance, then by station id so equidistant stations
// resolve deterministically.
struct StationCandidate<'a> {
    distance: OrderedFloat<f64>,
    station: &'a Station,
}

impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.station.id.cmp(&other.station.id))
    }
}

impl StationLocator {
    pub fn new(stations: Vec<Station>) -> Self {
        StationLocator {
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// The `k` stations closest to `(x, y)` by Euclidean distance, nearest first.
    ///
    /// Returns every station when `k` exceeds the network size.
    pub fn nearest(&self, x: f64, y: f64, k: usize) -> Vec<(Station, f64)> {
        if k == 0 {
            return vec![];
        }

        let mut candidates: Vec<StationCandidate<'_>> = Vec::with_capacity(k + 1);
        for (station, distance_2) in self.rtree.nearest_neighbor_iter_with_distance_2(&[x, y]) {
            let distance = OrderedFloat(distance_2.sqrt());
            // Keep pulling past the k-th station while the distance ties with it.
            if candidates.len() >= k && candidates.last().is_some_and(|c| distance > c.distance) {
                break;
            }
            candidates.push(StationCandidate { distance, station });
        }

        candidates.sort();
        candidates.truncate(k);
        candidates
            .into_iter()
            .map(|c| (c.station.to_owned(), c.distance.into_inner()))
            .collect()
    }

    /// Ids of the `k` nearest stations.
    pub fn nearest_ids(&self, x: f64, y: f64, k: usize) -> Vec<StationId> {
        self.nearest(x, y, k)
            .into_iter()
            .map(|(station, _)| station.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::network::Network;

    fn locator(points: &[(StationId, f64, f64)]) -> StationLocator {
        StationLocator::new(
            points
                .iter()
                .map(|&(id, x, y)| Station::new(id, Network::Precipitation, x, y))
                .collect(),
        )
    }

    #[test]
    fn nearest_in_ascending_distance() {
        let locator = locator(&[(1, 0.0, 0.0), (2, 10.0, 0.0), (3, 3.0, 4.0), (4, -1.0, 0.0)]);
        let result = locator.nearest(0.0, 0.0, 3);
        let ids: Vec<_> = result.iter().map(|(s, _)| s.id).collect();
        assert_eq!(ids, vec![1, 4, 3]);
        assert_eq!(result[2].1, 5.0);
        let mut last = -1.0;
        for (_, d) in &result {
            assert!(*d >= last);
            last = *d;
        }
    }

    #[test]
    fn ties_resolve_by_id() {
        let locator = locator(&[(30, 1.0, 0.0), (10, 0.0, 1.0), (20, -1.0, 0.0), (5, 0.0, 2.0)]);
        assert_eq!(locator.nearest_ids(0.0, 0.0, 2), vec![10, 20]);
        assert_eq!(locator.nearest_ids(0.0, 0.0, 3), vec![10, 20, 30]);
    }

    #[test]
    fn k_edge_cases() {
        let locator = locator(&[(1, 0.0, 0.0), (2, 1.0, 1.0)]);
        assert!(locator.nearest(0.0, 0.0, 0).is_empty());
        assert_eq!(locator.nearest_ids(5.0, 5.0, 10), vec![2, 1]);
        assert!(StationLocator::new(vec![]).nearest(0.0, 0.0, 3).is_empty());
    }
}
