//! Station catalog
//!
//! The catalog is read-only once a run starts. It is ordered by station id so
//! every pass over the network visits stations in the same order.

use crate::simulation::{EngineResult, SimulationError};
use crate::types::StationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A docking station and its dock count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Station identifier
    pub id: StationId,
    /// Number of docks
    pub capacity: u32,
}

impl Station {
    /// Create a station
    pub fn new(id: impl Into<StationId>, capacity: u32) -> Self {
        Self { id: id.into(), capacity }
    }
}

/// Set of stations taking part in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationCatalog {
    stations: BTreeMap<StationId, Station>,
}

impl StationCatalog {
    /// Build a catalog; a repeated id keeps the last entry
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        Self { stations: stations.into_iter().map(|station| (station.id, station)).collect() }
    }

    /// Apply capacity overrides, then remove dropped stations
    ///
    /// An override naming a station outside the catalog is a configuration
    /// error. Dropping an unknown station is only logged.
    pub fn with_adjustments(
        mut self,
        capacity_overrides: &BTreeMap<StationId, u32>,
        drop_stations: &[StationId],
    ) -> EngineResult<Self> {
        for (id, capacity) in capacity_overrides {
            let station =
                self.stations.get_mut(id).ok_or(SimulationError::UnknownStation(*id))?;
            station.capacity = *capacity;
        }

        for id in drop_stations {
            if self.stations.remove(id).is_none() {
                warn!(station = %id, "Dropped station is not in the catalog");
            }
        }

        info!(
            stations = self.stations.len(),
            overrides = capacity_overrides.len(),
            dropped = drop_stations.len(),
            "Station catalog prepared"
        );
        Ok(self)
    }

    /// Capacity of a station, if it is in the catalog
    pub fn capacity(&self, id: StationId) -> Option<u32> {
        self.stations.get(&id).map(|station| station.capacity)
    }

    /// Whether the station is in the catalog
    pub fn contains(&self, id: StationId) -> bool {
        self.stations.contains_key(&id)
    }

    /// Station ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.keys().copied()
    }

    /// Stations in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Station> + '_ {
        self.stations.values()
    }

    /// Station at a position in id order
    pub fn nth(&self, index: usize) -> Option<StationId> {
        self.stations.keys().nth(index).copied()
    }

    /// Number of stations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the catalog has no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Sum of all dock counts
    pub fn total_capacity(&self) -> u64 {
        self.stations.values().map(|station| station.capacity as u64).sum()
    }
}
