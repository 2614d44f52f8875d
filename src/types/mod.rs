//! Core types and identifiers for the bike-share simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: station, trip and bike ids
//! - **Enums**: rider classes, disappointment kinds, generator strategies, station conditions
//! - **Configuration**: simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use bikeshare_sim::types::*;
//!
//! let station = StationId::new(31101);
//! assert_eq!(station.to_string(), "STN_31101");
//!
//! let config = SimulationConfig {
//!     generator: GeneratorKind::InterArrival,
//!     seed: 42,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
