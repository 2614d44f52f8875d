//! Disappointment accounting and reroute to the nearest free alternative
//!
//! A rider who finds the origin empty is turned away and the trip dropped. A
//! rider who finds the destination full is sent to the nearest station in the
//! static ranking that the trip has not tried yet. The failed station joins the
//! trip's tried list before the trip is requeued, so a trip gives up after at
//! most `max_attempts` full stations.

use crate::network::NearestStations;
use crate::sim_event;
use crate::trips::{Disappointment, GenerationContext, TripEvent};
use crate::types::{DisappointmentKind, StationId};
use chrono::{DateTime, Utc};
use tracing::debug;

/// What became of a trip refused at a full station
#[derive(Debug, Clone, PartialEq)]
pub enum RerouteOutcome {
    /// Destination and end time rewritten; the trip goes back on the timeline
    Rerouted(TripEvent),
    /// No untried candidate left; the trip is finalized without an end time
    Exhausted(TripEvent),
}

impl RerouteOutcome {
    /// The trip, whatever happened to it
    pub fn trip(&self) -> &TripEvent {
        match self {
            RerouteOutcome::Rerouted(trip) | RerouteOutcome::Exhausted(trip) => trip,
        }
    }
}

/// Append-only disappointment log of one run
#[derive(Debug, Clone)]
pub struct DisappointmentTracker {
    disappointments: Vec<Disappointment>,
    max_attempts: usize,
    reroutes: usize,
    exhausted: usize,
}

impl DisappointmentTracker {
    /// Tracker allowing `max_attempts` full stations per trip
    pub fn new(max_attempts: usize) -> Self {
        Self { disappointments: Vec::new(), max_attempts, reroutes: 0, exhausted: 0 }
    }

    /// Record a departure refused at an empty station
    pub fn record_empty(&mut self, station: StationId, at: DateTime<Utc>) {
        debug!(station = %station, time = %at, "Departure refused, station empty");
        self.disappointments.push(Disappointment::empty_on_departure(station, at));
    }

    /// Record an arrival refused at a full station and pick where the rider goes next
    pub fn handle_full_arrival(
        &mut self,
        mut trip: TripEvent,
        at: DateTime<Utc>,
        nearest: &NearestStations,
        ctx: &mut GenerationContext<'_>,
    ) -> RerouteOutcome {
        let failed = trip.destination;
        self.disappointments.push(Disappointment::full_on_arrival(failed, at, trip.id));
        if !trip.tried.contains(&failed) {
            trip.tried.push(failed);
        }

        let candidate = if trip.tried.len() >= self.max_attempts {
            None
        } else {
            nearest
                .candidates(failed)
                .iter()
                .copied()
                .find(|station| *station != failed && !trip.tried.contains(station))
        };

        match candidate {
            Some(next) => {
                let ride = ctx.duration_between(failed, next);
                trip.destination = next;
                trip.end_time = Some(at + ride);
                self.reroutes += 1;
                debug!(
                    trip = %trip.id,
                    from = %failed,
                    to = %next,
                    attempt = trip.tried.len(),
                    "Rerouting arrival"
                );
                RerouteOutcome::Rerouted(trip)
            }
            None => {
                trip.end_time = None;
                self.exhausted += 1;
                sim_event!(
                    info,
                    "Reroute candidates exhausted, trip left unresolved",
                    trip = tracing::field::display(&trip.id),
                    station = failed.raw(),
                    attempts = trip.tried.len(),
                );
                RerouteOutcome::Exhausted(trip)
            }
        }
    }

    /// Every disappointment so far, in the order they happened
    pub fn disappointments(&self) -> &[Disappointment] {
        &self.disappointments
    }

    /// Take the log
    pub fn into_disappointments(self) -> Vec<Disappointment> {
        self.disappointments
    }

    /// Number of disappointments of one kind
    pub fn count(&self, kind: DisappointmentKind) -> usize {
        self.disappointments.iter().filter(|d| d.kind == kind).count()
    }

    /// Successful reroutes
    pub fn reroutes(&self) -> usize {
        self.reroutes
    }

    /// Trips that ran out of candidates
    pub fn exhausted(&self) -> usize {
        self.exhausted
    }

    /// Per-trip limit on full stations
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
