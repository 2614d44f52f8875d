//! Trip and disappointment records

use crate::types::{BikeId, DisappointmentKind, RiderClass, StationId, TripId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single rider journey
///
/// `end_time` is `None` once a trip has been abandoned after running out of
/// reroute candidates. `tried` lists the destinations that turned the rider
/// away, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEvent {
    /// Trip identifier
    pub id: TripId,
    /// Bike used
    pub bike_id: BikeId,
    /// Rider membership class
    pub rider_class: RiderClass,
    /// Station the bike leaves from
    pub origin: StationId,
    /// Station the bike is heading to
    pub destination: StationId,
    /// Departure time
    pub start_time: DateTime<Utc>,
    /// Arrival time at `destination`
    pub end_time: Option<DateTime<Utc>>,
    /// Destinations that were full when the rider arrived
    #[serde(default)]
    pub tried: Vec<StationId>,
}

impl TripEvent {
    /// A fresh trip that has not been rerouted
    pub fn new(
        id: TripId,
        bike_id: BikeId,
        rider_class: RiderClass,
        origin: StationId,
        destination: StationId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bike_id,
            rider_class,
            origin,
            destination,
            start_time,
            end_time: Some(end_time),
            tried: Vec::new(),
        }
    }

    /// Whether the trip was sent to at least one alternative station
    pub fn was_rerouted(&self) -> bool {
        !self.tried.is_empty()
    }

    /// Whether the trip still has somewhere to arrive
    pub fn is_resolvable(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A rider turned away at a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disappointment {
    /// Station that could not serve the rider
    pub station: StationId,
    /// When it happened
    pub time: DateTime<Utc>,
    /// Empty on departure or full on arrival
    pub kind: DisappointmentKind,
    /// The trip that was refused a dock, for arrivals
    pub trip: Option<TripId>,
}

impl Disappointment {
    /// No bike to take out at `station`
    pub fn empty_on_departure(station: StationId, time: DateTime<Utc>) -> Self {
        Self { station, time, kind: DisappointmentKind::EmptyOnDeparture, trip: None }
    }

    /// No dock to return `trip` at `station`
    pub fn full_on_arrival(station: StationId, time: DateTime<Utc>, trip: TripId) -> Self {
        Self { station, time, kind: DisappointmentKind::FullOnArrival, trip: Some(trip) }
    }
}
