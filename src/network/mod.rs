//! Station network state
//!
//! - **StationCatalog**: stations and capacities, fixed for a run
//! - **NearestStations**: bounded nearest-alternative rankings for rerouting
//! - **OccupancyLedger**: live bike counts with empty/full onsets
//! - **InitialOccupancy**: how bikes are placed when a run starts

pub mod catalog;
pub mod initial;
pub mod nearest;
pub mod occupancy;

pub use catalog::*;
pub use initial::*;
pub use nearest::*;
pub use occupancy::*;
