//! Scenario files
//!
//! A scenario describes one bike-share network: its stations, capacity
//! overrides and dropped stations, nearest-station rankings, initial placement,
//! trips already on the road and fitted distributions. It is stored as JSON:
//!
//! ```json
//! {
//!   "stations": [{"id": 1, "capacity": 15}, {"id": 2, "capacity": 11}],
//!   "capacity_overrides": {"2": 19},
//!   "drop_stations": [],
//!   "nearest": {"1": [2], "2": [1]},
//!   "initial_occupancy": {"total": 20},
//!   "distributions": {"rates": [], "durations": [], "destinations": []}
//! }
//! ```

use crate::distributions::{DistributionRecords, FittedDistributions};
use crate::network::{InitialOccupancy, NearestStations, Station, StationCatalog};
use crate::simulation::{EngineResult, Simulation};
use crate::trips::TripEvent;
use crate::types::{ConfigError, SimulationConfig, StationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn default_initial_occupancy() -> InitialOccupancy {
    InitialOccupancy::Total(0)
}

/// Contents of a scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Stations and their dock counts
    pub stations: Vec<Station>,

    /// Capacities replacing the listed ones
    #[serde(default)]
    pub capacity_overrides: BTreeMap<StationId, u32>,

    /// Stations left out of the run
    #[serde(default)]
    pub drop_stations: Vec<StationId>,

    /// Alternatives for each station, nearest first
    #[serde(default)]
    pub nearest: BTreeMap<StationId, Vec<StationId>>,

    /// How bikes are placed at the start
    #[serde(default = "default_initial_occupancy")]
    pub initial_occupancy: InitialOccupancy,

    /// Trips already on the road at the start
    #[serde(default)]
    pub in_flight: Vec<TripEvent>,

    /// Fitted rates, durations and destinations
    #[serde(default)]
    pub distributions: DistributionRecords,
}

impl ScenarioFile {
    /// Load a scenario from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let content = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Station catalog after overrides and drops
    pub fn catalog(&self) -> EngineResult<StationCatalog> {
        StationCatalog::new(self.stations.iter().copied())
            .with_adjustments(&self.capacity_overrides, &self.drop_stations)
    }

    /// Build the simulation this scenario describes under `config`
    ///
    /// Distributions are loaded once for the configured window.
    pub fn into_simulation(self, config: &SimulationConfig) -> EngineResult<Simulation> {
        let catalog = self.catalog()?;

        let mut nearest =
            NearestStations::from_rankings(self.nearest, config.max_reroute_candidates);
        nearest.restrict_to(&catalog);

        let provider =
            FittedDistributions::load(&self.distributions, config.start_time, config.end_time, &catalog);

        info!(
            stations = catalog.len(),
            docks = catalog.total_capacity(),
            in_flight = self.in_flight.len(),
            "Scenario loaded"
        );

        Ok(Simulation::new(
            config.clone(),
            catalog,
            nearest,
            Arc::new(provider),
            self.initial_occupancy,
        )?
        .with_in_flight(self.in_flight))
    }
}
