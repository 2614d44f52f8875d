//! Simulation engine and control
//!
//! This module contains the tick-driven engine, the event timeline, the
//! reroute and rebalancing policies, result reporting, error handling and
//! logging setup.
//!
//! # Overview
//!
//! - **Simulation**: immutable network inputs, re-runnable with different windows or fleet sizes
//! - **SimulationRun**: one run's ledger, timeline and random generator
//! - **EventTimeline**: pending departures and arrivals with a fixed merge rule
//! - **DisappointmentTracker**: refused riders and reroute to the nearest free station
//! - **RebalancePolicy**: redistribution of bikes among stale full and empty stations
//! - **SimulationResult**: trips, disappointments and counters handed back to the caller
//!
//! # Usage Example
//!
//! ```rust
//! use bikeshare_sim::distributions::FittedDistributions;
//! use bikeshare_sim::network::{InitialOccupancy, NearestStations, Station, StationCatalog};
//! use bikeshare_sim::simulation::Simulation;
//! use bikeshare_sim::types::{GeneratorKind, SimulationConfig};
//! use std::sync::Arc;
//!
//! let config = SimulationConfig { generator: GeneratorKind::Baseline, ..Default::default() };
//! let catalog = StationCatalog::new([Station::new(1, 4), Station::new(2, 4)]);
//! let simulation = Simulation::new(
//!     config,
//!     catalog,
//!     NearestStations::new(8),
//!     Arc::new(FittedDistributions::default()),
//!     InitialOccupancy::Total(4),
//! )
//! .unwrap();
//!
//! let result = simulation.run_configured().unwrap();
//! assert_eq!(result.total_bikes, 4);
//! ```

pub mod engine;
pub mod error;
pub mod logging;
pub mod rebalance;
pub mod reroute;
pub mod statistics;
pub mod timeline;

pub use engine::*;
pub use error::*;
pub use logging::*;
pub use rebalance::*;
pub use reroute::*;
pub use statistics::*;
pub use timeline::*;
