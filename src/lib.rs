//! Bike-Share Network Simulator
//!
//! A discrete-event simulation of a bike-share network. Stations hold a bounded
//! number of bikes, fitted demand moves bikes between stations over time, riders
//! who find no bike or no dock are recorded as disappointments, and a periodic
//! rebalancing pass relieves stations that stay full or empty too long.
//!
//! # Overview
//!
//! The engine consumes already-fitted distributions and produces an in-memory
//! result. Every run draws from one generator seeded from the configuration, so
//! the same inputs and seed always produce the same result.
//!
//! ## Key Features
//!
//! - **Dual-queue timeline**: departures and arrivals merged by one fixed rule
//! - **Bounded occupancy ledger**: counts never leave `[0, capacity]`
//! - **Pluggable trip generation**: baseline, count-based and inter-arrival strategies
//! - **Bounded reroute**: refused returns go to the nearest untried station
//! - **Rebalancing**: bikes move from stale full and crowded stations to stale empty ones
//! - **Fleet-size analysis**: parallel sweeps and a profit hill climb
//!
//! ## Quick Start
//!
//! ```rust
//! use bikeshare_sim::*;
//! use std::sync::Arc;
//!
//! let config = SimulationConfig { generator: GeneratorKind::Baseline, ..Default::default() };
//! let catalog = StationCatalog::new([Station::new(1, 10), Station::new(2, 10), Station::new(3, 10)]);
//!
//! let simulation = Simulation::new(
//!     config,
//!     catalog,
//!     NearestStations::new(8),
//!     Arc::new(FittedDistributions::default()),
//!     InitialOccupancy::Total(12),
//! )?;
//!
//! let result = simulation.run_configured()?;
//! println!("{}", result.generate_compact_summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Identifiers, enums and configuration
//! - [`network`]: Station catalog, nearest rankings, occupancy ledger and initial placement
//! - [`distributions`]: Fitted distribution lookup and samplers
//! - [`trips`]: Trip records and generation strategies
//! - [`simulation`]: Engine, timeline, reroute, rebalancing, results, errors and logging
//! - [`scenario`]: Scenario file loading
//! - [`analysis`]: Cost model, fleet-size sweeps and optimisation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌───────────────┐    ┌─────────────┐
//! │   Types     │    │ Distributions │    │  Scenario   │
//! │             │    │               │    │             │
//! │ Identifiers │◄───┤ Rates         │◄───┤ JSON input  │
//! │ Enums       │    │ Durations     │    │             │
//! │ Config      │    │ Destinations  │    │             │
//! └─────────────┘    └───────────────┘    └─────────────┘
//!        ▲                   ▲                   │
//!        │                   │                   ▼
//! ┌─────────────┐    ┌───────────────┐    ┌─────────────┐
//! │  Network    │    │    Trips      │    │ Simulation  │
//! │             │    │               │    │             │
//! │ Catalog     │◄───┤ Generators    │◄───┤ Engine      │
//! │ Ledger      │    │ Records       │    │ Rebalance   │
//! │ Nearest     │    │               │    │ Reroute     │
//! └─────────────┘    └───────────────┘    └─────────────┘
//!                                                ▲
//!                                                │
//!                                         ┌─────────────┐
//!                                         │  Analysis   │
//!                                         │ Sweeps      │
//!                                         └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod analysis;
pub mod distributions;
pub mod network;
pub mod scenario;
pub mod simulation;
pub mod trips;
pub mod types;

// Core types and identifiers
pub use types::{
    BikeId,
    ConfigError,
    ConfigValidationError,
    DisappointmentKind,
    EventKind,
    GeneratorKind,
    RiderClass,
    SimulationConfig,
    StationCondition,
    // Identifiers
    StationId,
    TripId,
};

// Network state
pub use network::{DockOutcome, InitialOccupancy, NearestStations, OccupancyLedger, Station, StationCatalog};

// Distributions
pub use distributions::{DistributionProvider, DistributionRecords, FittedDistributions, TimeSlot};

// Trips
pub use trips::{Disappointment, TripEvent, TripGenerator};

// Simulation types and functionality
pub use simulation::{
    DisappointmentTracker, EngineResult, EventTimeline, RebalancePolicy, RunSummary, Simulation,
    SimulationError, SimulationResult, SimulationRun,
};

// Scenario input and analysis
pub use analysis::{CostBreakdown, CostModel, SweepPoint, SweepRange};
pub use scenario::ScenarioFile;
