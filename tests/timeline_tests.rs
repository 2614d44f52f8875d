//! Tests for event timeline ordering
//!
//! The timeline merges pending departures and arrivals. Events must come out in
//! time order, a departure must win a tie with an arrival, and events of one
//! kind at the same instant must keep the order they were queued in.

use bikeshare_sim::simulation::{EventTimeline, TimelineEvent};
use bikeshare_sim::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2012, 4, 2, 8, 0, 0).unwrap()
}

fn trip(tag: u128, start_minute: i64, end_minute: i64) -> TripEvent {
    TripEvent::new(
        TripId(Uuid::from_u128(tag)),
        BikeId(1),
        RiderClass::Registered,
        StationId(1),
        StationId(2),
        base() + Duration::minutes(start_minute),
        base() + Duration::minutes(end_minute),
    )
}

/// Effective time of an event and the kind rank used to break ties
fn key(event: &TimelineEvent) -> (DateTime<Utc>, u8) {
    match event {
        TimelineEvent::Departure(trip) => (trip.start_time, 0),
        TimelineEvent::Arrival(trip) => (trip.end_time.unwrap(), 1),
    }
}

fn tag(event: &TimelineEvent) -> u128 {
    event.trip().id.0.as_u128()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Test that popping yields time order with departures first on ties
    #[test]
    fn prop_pop_order_is_by_time_then_departure(
        events in prop::collection::vec((any::<bool>(), 0i64..30), 0..60),
    ) {
        let mut timeline = EventTimeline::new();
        for (index, (is_departure, minute)) in events.iter().enumerate() {
            let tag = index as u128;
            if *is_departure {
                timeline.push_departure(trip(tag, *minute, *minute + 10));
            } else {
                timeline.push_arrival(trip(tag, *minute - 10, *minute)).unwrap();
            }
        }
        prop_assert_eq!(timeline.len(), events.len());

        let mut popped = Vec::new();
        while let Some(event) = timeline.pop_next() {
            popped.push(event);
        }
        prop_assert_eq!(popped.len(), events.len());
        prop_assert!(timeline.is_empty());

        for pair in popped.windows(2) {
            let (earlier, later) = (key(&pair[0]), key(&pair[1]));
            prop_assert!(earlier <= later, "{:?} popped before {:?}", earlier, later);
            if earlier == later {
                prop_assert!(tag(&pair[0]) < tag(&pair[1]), "same-instant events out of queue order");
            }
        }
    }

    /// Test that pop_due never returns an event past the horizon
    #[test]
    fn prop_pop_due_respects_horizon(
        minutes in prop::collection::vec(0i64..120, 0..40),
        horizon in 0i64..120,
    ) {
        let mut timeline = EventTimeline::new();
        for (index, minute) in minutes.iter().enumerate() {
            timeline.push_departure(trip(index as u128, *minute, *minute + 5));
        }

        let limit = base() + Duration::minutes(horizon);
        let mut due = 0;
        while let Some(event) = timeline.pop_due(limit) {
            prop_assert!(key(&event).0 <= limit);
            due += 1;
        }
        prop_assert_eq!(due, minutes.iter().filter(|m| **m <= horizon).count());
        prop_assert_eq!(timeline.pending_departures(), minutes.len() - due);
    }
}
