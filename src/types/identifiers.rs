//! Identifier types for the bike-share simulator
//!
//! Stations keep the integer ids of the source catalog. Trips get UUIDs whose
//! bytes are drawn from the run's seeded generator so that two runs with the
//! same seed produce identical trip ids.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::{Builder, Uuid};

/// Identifier of a docking station
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl StationId {
    /// Wrap a raw catalog id
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw catalog id
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for StationId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STN_{}", self.0)
    }
}

/// Unique identifier for a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripId(pub Uuid);

impl TripId {
    /// Draw a new trip id from the given generator
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRIP_{}", self.0.simple())
    }
}

impl Serialize for TripId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TripId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let raw = s.strip_prefix("TRIP_").unwrap_or(&s);
        let uuid = Uuid::parse_str(raw).map_err(serde::de::Error::custom)?;
        Ok(TripId(uuid))
    }
}

/// Identifier of a bike
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BikeId(pub u32);

impl BikeId {
    /// Pick a bike id uniformly from `1..=fleet_size`
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, fleet_size: u32) -> Self {
        Self(rng.gen_range(1..=fleet_size.max(1)))
    }
}

impl fmt::Display for BikeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BIKE_{}", self.0)
    }
}
