//! Enumeration types for the bike-share simulator
//!
//! This module contains the enumerations shared across the simulator: rider
//! classes, disappointment kinds, generator strategies, timeline event kinds
//! and the per-station occupancy condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership class of the rider taking a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiderClass {
    /// Pay-per-ride customer
    #[default]
    Casual,
    /// Subscribed member
    Registered,
}

impl fmt::Display for RiderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiderClass::Casual => write!(f, "Casual"),
            RiderClass::Registered => write!(f, "Registered"),
        }
    }
}

impl FromStr for RiderClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "casual" => Ok(RiderClass::Casual),
            "registered" | "member" => Ok(RiderClass::Registered),
            _ => Err(format!("Unknown rider class: {}", s)),
        }
    }
}

/// Why a rider was turned away at a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisappointmentKind {
    /// No bike was available to take out
    EmptyOnDeparture,
    /// No free dock was available to return the bike
    FullOnArrival,
}

impl fmt::Display for DisappointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisappointmentKind::EmptyOnDeparture => write!(f, "Empty on departure"),
            DisappointmentKind::FullOnArrival => write!(f, "Full on arrival"),
        }
    }
}

/// Strategy used to produce trips each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// Uniformly random counts, destinations and durations
    Baseline,
    /// Poisson trip counts per station and tick from fitted rates
    #[default]
    CountBased,
    /// One exponential waiting-time stream per station
    InterArrival,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Baseline => write!(f, "baseline"),
            GeneratorKind::CountBased => write!(f, "count-based"),
            GeneratorKind::InterArrival => write!(f, "inter-arrival"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "simple" => Ok(GeneratorKind::Baseline),
            "count" | "count-based" | "poisson" => Ok(GeneratorKind::CountBased),
            "inter-arrival" | "interarrival" | "exponential" => Ok(GeneratorKind::InterArrival),
            _ => Err(format!("Unknown generator: {}", s)),
        }
    }
}

/// Kind of event held by the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A bike leaving its origin station
    Departure,
    /// A bike docking at its destination station
    Arrival,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Departure => write!(f, "departure"),
            EventKind::Arrival => write!(f, "arrival"),
        }
    }
}

/// Occupancy condition of a station as seen by the rebalancer
///
/// `Empty` and `Full` carry the time the condition was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationCondition {
    /// Neither flagged empty nor full
    Normal,
    /// Flagged empty since the given time
    Empty(DateTime<Utc>),
    /// Flagged full since the given time
    Full(DateTime<Utc>),
}

impl StationCondition {
    /// Whether the station has been flagged in either direction
    pub fn is_flagged(&self) -> bool {
        !matches!(self, StationCondition::Normal)
    }
}
