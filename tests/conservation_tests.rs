//! Tests for bike conservation and occupancy bounds
//!
//! These property tests build random networks and check after every tick that
//! each station stays within its capacity and that every bike of the fleet is
//! docked, on the road or waiting in the rebalancing pool.

use bikeshare_sim::distributions::{DestinationRecord, DistributionRecords, DurationRecord, RateRecord};
use bikeshare_sim::network::{DockOutcome, OccupancyLedger};
use bikeshare_sim::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2012, 4, 2, 0, 0, 0).unwrap()
}

/// Fitted data covering every hour, with uniform destinations
fn records(ids: &[StationId], rate: f64) -> DistributionRecords {
    let mut records = DistributionRecords::default();
    for &origin in ids {
        for hour in 0..24u8 {
            for is_weekday in [true, false] {
                records.rates.push(RateRecord { station: origin, hour, is_weekday, year: None, month: None, rate });
                for &destination in ids {
                    records.destinations.push(DestinationRecord {
                        origin,
                        hour,
                        is_weekday,
                        destination,
                        probability: 1.0,
                    });
                }
            }
        }
        for &destination in ids {
            records.durations.push(DurationRecord { origin, destination, shape: 2.0, scale: 600.0 });
        }
    }
    records
}

/// Network with the given capacities and a fleet of `total` bikes
fn network(capacities: &[u32], total: u32, config: SimulationConfig, rate: f64) -> Simulation {
    let ids: Vec<StationId> = (1..=capacities.len() as u32).map(StationId).collect();
    let catalog = StationCatalog::new(ids.iter().zip(capacities).map(|(id, cap)| Station::new(*id, *cap)));
    let nearest = NearestStations::from_rankings(
        ids.iter().map(|id| (*id, ids.iter().copied().filter(|other| other != id).collect())),
        config.max_reroute_candidates,
    );
    let provider = FittedDistributions::load(&records(&ids, rate), monday(), monday() + Duration::days(1), &catalog);
    Simulation::new(config, catalog, nearest, Arc::new(provider), InitialOccupancy::Total(total)).unwrap()
}

fn generator() -> impl Strategy<Value = GeneratorKind> {
    prop_oneof![
        Just(GeneratorKind::Baseline),
        Just(GeneratorKind::CountBased),
        Just(GeneratorKind::InterArrival),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Test that no tick ever loses or invents a bike or overfills a station
    #[test]
    fn prop_every_tick_conserves_bikes(
        capacities in prop::collection::vec(1u32..8, 2..6),
        fill in 0.0f64..=1.0,
        seed in any::<u64>(),
        kind in generator(),
        rebalancing in any::<bool>(),
        rate in 0.5f64..12.0,
    ) {
        let docks: u32 = capacities.iter().sum();
        let total = (docks as f64 * fill).round() as u32;
        let config = SimulationConfig {
            start_time: monday(),
            end_time: monday() + Duration::hours(12),
            seed,
            generator: kind,
            rebalancing,
            max_reroute_candidates: 3,
            ..Default::default()
        };
        let sim = network(&capacities, total, config, rate);
        let mut run = sim.start(monday(), monday() + Duration::hours(12), Duration::hours(1)).unwrap();
        prop_assert_eq!(run.total_bikes(), total as u64);

        while !run.is_finished() {
            run.step().unwrap();
            prop_assert!(run.conservation_holds(), "lost bikes at tick {}", run.ticks());
            for (station, count, capacity) in run.ledger().iter() {
                prop_assert!(count <= capacity, "{} holds {} of {}", station, count, capacity);
            }
        }

        let result = run.finish();
        let docked: u64 = result.final_occupancy.values().map(|count| *count as u64).sum();
        prop_assert_eq!(docked + result.pending_arrivals.len() as u64 + result.pool_at_end, total as u64);
        for trip in &result.completed_trips {
            prop_assert!(trip.end_time.is_some());
            prop_assert!(trip.tried.len() < 3);
        }
        for trip in &result.unresolved_trips {
            prop_assert_eq!(trip.end_time, None);
            prop_assert!(trip.tried.len() <= 3);
        }
    }

    /// Test that ledger counts stay within bounds under any event sequence
    #[test]
    fn prop_ledger_never_leaves_bounds(
        capacity in 0u32..6,
        initial in 0u32..6,
        events in prop::collection::vec(any::<bool>(), 0..64),
    ) {
        let initial = initial.min(capacity);
        let catalog = StationCatalog::new([Station::new(1, capacity)]);
        let mut ledger = OccupancyLedger::new(&catalog, &BTreeMap::from([(StationId(1), initial)])).unwrap();
        let mut expected = initial;

        for (minute, is_arrival) in events.into_iter().enumerate() {
            let at = monday() + Duration::minutes(minute as i64);
            if is_arrival {
                let outcome = ledger.apply_arrival(StationId(1), at).unwrap();
                if expected < capacity {
                    prop_assert_eq!(outcome, DockOutcome::Applied);
                    expected += 1;
                } else {
                    prop_assert_eq!(outcome, DockOutcome::StationFull);
                }
            } else {
                let outcome = ledger.apply_departure(StationId(1), at).unwrap();
                if expected > 0 {
                    prop_assert_eq!(outcome, DockOutcome::Applied);
                    expected -= 1;
                } else {
                    prop_assert_eq!(outcome, DockOutcome::StationEmpty);
                }
            }
            prop_assert_eq!(ledger.count(StationId(1)), Some(expected));
            prop_assert!(ledger.check_bounds().is_ok());
        }
    }
}

/// Test that a placement total is capped by the network's docks
#[test]
fn test_total_larger_than_docks_fills_every_station() {
    let config = SimulationConfig { generator: GeneratorKind::Baseline, ..Default::default() };
    let sim = network(&[3, 4], 50, config, 1.0);

    let start = sim.config().start_time;
    let run = sim.start(start, start, Duration::hours(1)).unwrap();
    assert_eq!(run.ledger().count(StationId(1)), Some(3));
    assert_eq!(run.ledger().count(StationId(2)), Some(4));
    assert_eq!(run.total_bikes(), 7);
}
