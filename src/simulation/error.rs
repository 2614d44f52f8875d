//! Error types and handling
//!
//! Only configuration problems and invariant violations abort a run. Empty or
//! full stations, exhausted reroutes and missing distribution entries are
//! ordinary simulation outcomes and never surface here.

use crate::types::{ConfigError, ConfigValidationError, StationId};
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// A station id is not part of the catalog
    #[error("Unknown station: {0}")]
    UnknownStation(StationId),

    /// Occupancy bounds or bike conservation were breached
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigError> for SimulationError {
    fn from(error: ConfigError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl From<anyhow::Error> for SimulationError {
    fn from(error: anyhow::Error) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invariant violation
    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Whether the error aborts a run in progress
    pub fn is_fatal(&self) -> bool {
        match self {
            SimulationError::ConfigurationError(_) => true,
            SimulationError::UnknownStation(_) => true,
            SimulationError::InvariantViolation(_) => true,
            SimulationError::IoError(_) => false,
            SimulationError::SerializationError(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::UnknownStation(_) => "Configuration",
            SimulationError::InvariantViolation(_) => "Invariant",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type EngineResult<T> = Result<T, SimulationError>;
