//! Event timeline
//!
//! Pending departures are ordered by start time and pending arrivals by end
//! time, each in its own min-heap. The next event is the departure when its
//! start time is at or before the earliest arrival's end time; otherwise the
//! arrival. Events with equal times in the same queue come out in push order.

use super::{EngineResult, SimulationError};
use crate::trips::TripEvent;
use crate::types::EventKind;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An event taken off the timeline
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// The trip's bike leaves its origin
    Departure(TripEvent),
    /// The trip's bike docks at its destination
    Arrival(TripEvent),
}

impl TimelineEvent {
    /// Departure or arrival
    pub fn kind(&self) -> EventKind {
        match self {
            TimelineEvent::Departure(_) => EventKind::Departure,
            TimelineEvent::Arrival(_) => EventKind::Arrival,
        }
    }

    /// The trip carried by the event
    pub fn trip(&self) -> &TripEvent {
        match self {
            TimelineEvent::Departure(trip) | TimelineEvent::Arrival(trip) => trip,
        }
    }

    /// Consume the event, keeping its trip
    pub fn into_trip(self) -> TripEvent {
        match self {
            TimelineEvent::Departure(trip) | TimelineEvent::Arrival(trip) => trip,
        }
    }
}

#[derive(Debug, Clone)]
struct Queued {
    time: DateTime<Utc>,
    seq: u64,
    trip: TripEvent,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the earliest time, then the oldest push
        other.time.cmp(&self.time).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending departures and arrivals of a run
#[derive(Debug, Clone, Default)]
pub struct EventTimeline {
    departures: BinaryHeap<Queued>,
    arrivals: BinaryHeap<Queued>,
    next_seq: u64,
}

impl EventTimeline {
    /// Empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    fn queued(&mut self, time: DateTime<Utc>, trip: TripEvent) -> Queued {
        let seq = self.next_seq;
        self.next_seq += 1;
        Queued { time, seq, trip }
    }

    /// Queue a trip's departure at its start time
    pub fn push_departure(&mut self, trip: TripEvent) {
        let queued = self.queued(trip.start_time, trip);
        self.departures.push(queued);
    }

    /// Queue a trip's arrival at its end time
    pub fn push_arrival(&mut self, trip: TripEvent) -> EngineResult<()> {
        let end = trip.end_time.ok_or_else(|| {
            SimulationError::invariant_violation(format!("Trip {} has no arrival time", trip.id))
        })?;
        let queued = self.queued(end, trip);
        self.arrivals.push(queued);
        Ok(())
    }

    /// Queue an event of either kind
    pub fn push(&mut self, event: TimelineEvent) -> EngineResult<()> {
        match event {
            TimelineEvent::Departure(trip) => {
                self.push_departure(trip);
                Ok(())
            }
            TimelineEvent::Arrival(trip) => self.push_arrival(trip),
        }
    }

    fn next_kind(&self) -> Option<EventKind> {
        match (self.departures.peek(), self.arrivals.peek()) {
            (Some(departure), Some(arrival)) if departure.time <= arrival.time => {
                Some(EventKind::Departure)
            }
            (Some(_), Some(_)) => Some(EventKind::Arrival),
            (Some(_), None) => Some(EventKind::Departure),
            (None, Some(_)) => Some(EventKind::Arrival),
            (None, None) => None,
        }
    }

    /// Kind and effective time of the next event
    pub fn peek_next(&self) -> Option<(EventKind, DateTime<Utc>)> {
        match self.next_kind()? {
            EventKind::Departure => self.departures.peek().map(|q| (EventKind::Departure, q.time)),
            EventKind::Arrival => self.arrivals.peek().map(|q| (EventKind::Arrival, q.time)),
        }
    }

    /// Remove and return the next event
    pub fn pop_next(&mut self) -> Option<TimelineEvent> {
        match self.next_kind()? {
            EventKind::Departure => self.departures.pop().map(|q| TimelineEvent::Departure(q.trip)),
            EventKind::Arrival => self.arrivals.pop().map(|q| TimelineEvent::Arrival(q.trip)),
        }
    }

    /// Remove and return the next event if it happens no later than `horizon`
    pub fn pop_due(&mut self, horizon: DateTime<Utc>) -> Option<TimelineEvent> {
        match self.peek_next() {
            Some((_, time)) if time <= horizon => self.pop_next(),
            _ => None,
        }
    }

    /// Departures not yet resolved
    pub fn pending_departures(&self) -> usize {
        self.departures.len()
    }

    /// Bikes currently on the road
    pub fn pending_arrivals(&self) -> usize {
        self.arrivals.len()
    }

    /// Total pending events
    pub fn len(&self) -> usize {
        self.departures.len() + self.arrivals.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.departures.is_empty() && self.arrivals.is_empty()
    }

    /// Drain every pending trip, departures first, each queue in time order
    pub fn drain_pending(&mut self) -> (Vec<TripEvent>, Vec<TripEvent>) {
        let departures = drain_sorted(&mut self.departures);
        let arrivals = drain_sorted(&mut self.arrivals);
        (departures, arrivals)
    }
}

fn drain_sorted(heap: &mut BinaryHeap<Queued>) -> Vec<TripEvent> {
    let mut drained = Vec::with_capacity(heap.len());
    while let Some(queued) = heap.pop() {
        drained.push(queued.trip);
    }
    drained
}
