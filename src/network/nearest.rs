//! Nearest-station rankings used when a return has to be rerouted

use super::StationCatalog;
use crate::types::StationId;
use std::collections::BTreeMap;

/// Per-station list of alternatives, nearest first, bounded in length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestStations {
    ranking: BTreeMap<StationId, Vec<StationId>>,
    limit: usize,
}

impl NearestStations {
    /// Empty ranking keeping at most `limit` alternatives per station
    pub fn new(limit: usize) -> Self {
        Self { ranking: BTreeMap::new(), limit }
    }

    /// Build from precomputed rankings
    pub fn from_rankings(
        rankings: impl IntoIterator<Item = (StationId, Vec<StationId>)>,
        limit: usize,
    ) -> Self {
        let mut nearest = Self::new(limit);
        for (station, ranked) in rankings {
            nearest.insert(station, ranked);
        }
        nearest
    }

    /// Set the ranking of one station; the station itself and repeats are skipped
    pub fn insert(&mut self, station: StationId, ranked: Vec<StationId>) {
        let mut kept = Vec::with_capacity(self.limit.min(ranked.len()));
        for candidate in ranked {
            if kept.len() == self.limit {
                break;
            }
            if candidate != station && !kept.contains(&candidate) {
                kept.push(candidate);
            }
        }
        self.ranking.insert(station, kept);
    }

    /// Remove stations outside the catalog from every ranking
    pub fn restrict_to(&mut self, catalog: &StationCatalog) {
        self.ranking.retain(|station, _| catalog.contains(*station));
        for ranked in self.ranking.values_mut() {
            ranked.retain(|candidate| catalog.contains(*candidate));
        }
    }

    /// Alternatives for a station, nearest first
    pub fn candidates(&self, station: StationId) -> &[StationId] {
        self.ranking.get(&station).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Maximum alternatives kept per station
    pub fn limit(&self) -> usize {
        self.limit
    }
}
