//! Trip generation strategies
//!
//! Three interchangeable strategies share one interface:
//!
//! - **Baseline**: a uniform number of departures between zero and the
//!   station's current count, uniform destinations, uniform durations
//! - **CountBased**: a Poisson number of departures per station and tick,
//!   drawn from the fitted hourly rate
//! - **InterArrival**: one pending departure per station at a time, spaced by
//!   exponential waits; a station without a rate waits for the next hour
//!
//! A missing destination vector falls back to a uniformly chosen station and a
//! missing duration model to a uniform duration. Both count as data gaps.

use crate::distributions::{sample_count, sample_uniform_duration, sample_wait, DistributionProvider, TimeSlot};
use crate::network::{OccupancyLedger, StationCatalog};
use crate::sim_event;
use crate::types::{BikeId, GeneratorKind, RiderClass, SimulationConfig, StationId, TripId};
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use super::TripEvent;

/// Everything a generator may read while producing trips
#[derive(Debug)]
pub struct GenerationContext<'a> {
    /// Stations in the run
    pub catalog: &'a StationCatalog,
    /// Current occupancy
    pub ledger: &'a OccupancyLedger,
    /// Fitted rates, durations and destinations
    pub provider: &'a dyn DistributionProvider,
    /// Run configuration
    pub config: &'a SimulationConfig,
    /// Length of the run's ticks
    pub timestep: Duration,
    /// Fleet size used to draw bike ids
    pub fleet_size: u32,
    /// The run's generator
    pub rng: &'a mut StdRng,
    /// Fallbacks taken because fitted data was missing
    pub data_gaps: usize,
}

impl<'a> GenerationContext<'a> {
    fn uniform_station(&mut self) -> Option<StationId> {
        if self.catalog.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.catalog.len());
        self.catalog.nth(index)
    }

    fn rider_class(&mut self) -> RiderClass {
        let share = self.config.registered_rider_share;
        if share > 0.0 && self.rng.gen::<f64>() < share {
            RiderClass::Registered
        } else {
            RiderClass::Casual
        }
    }

    fn destination_for(&mut self, origin: StationId, slot: &TimeSlot) -> Option<StationId> {
        let provider = self.provider;
        let fitted = provider.destinations(origin, slot).and_then(|d| d.sample(self.rng));
        match fitted {
            Some(destination) => Some(destination),
            None => {
                self.data_gaps += 1;
                sim_event!(
                    warn,
                    "No destination distribution, choosing uniformly",
                    station = origin.raw(),
                    hour = slot.hour,
                    weekday = slot.is_weekday,
                );
                self.uniform_station()
            }
        }
    }

    /// Duration of a ride between two stations, falling back to a uniform draw
    pub fn duration_between(&mut self, origin: StationId, destination: StationId) -> Duration {
        let provider = self.provider;
        match provider.trip_duration(origin, destination) {
            Some(model) => model.sample(self.rng),
            None => {
                self.data_gaps += 1;
                sim_event!(
                    warn,
                    "No duration model, drawing uniformly",
                    origin = origin.raw(),
                    destination = destination.raw(),
                );
                let max = self.config.max_trip_duration();
                sample_uniform_duration(max, self.rng)
            }
        }
    }

    fn build_trip(
        &mut self,
        origin: StationId,
        destination: StationId,
        start: DateTime<Utc>,
        duration: Duration,
    ) -> TripEvent {
        let id = TripId::from_rng(self.rng);
        let bike = BikeId::sample(self.rng, self.fleet_size);
        let rider_class = self.rider_class();
        TripEvent::new(id, bike, rider_class, origin, destination, start, start + duration)
    }

    fn fitted_trip(&mut self, origin: StationId, start: DateTime<Utc>) -> Option<TripEvent> {
        let slot = TimeSlot::at(start);
        let destination = self.destination_for(origin, &slot)?;
        let duration = self.duration_between(origin, destination);
        Some(self.build_trip(origin, destination, start, duration))
    }

    fn scaled_rate(&self, origin: StationId, at: DateTime<Utc>) -> Option<f64> {
        self.provider
            .departure_rate(origin, &TimeSlot::at(at))
            .map(|rate| rate * self.config.rate_scale)
    }
}

/// Per-station bookkeeping of the inter-arrival strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamState {
    outstanding: BTreeSet<StationId>,
    resume_at: BTreeMap<StationId, DateTime<Utc>>,
}

impl StreamState {
    /// Whether the station has a departure waiting in the timeline
    pub fn is_outstanding(&self, station: StationId) -> bool {
        self.outstanding.contains(&station)
    }

    /// When a station without a rate will next look for one
    pub fn resume_at(&self, station: StationId) -> Option<DateTime<Utc>> {
        self.resume_at.get(&station).copied()
    }
}

fn next_hour(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(Duration::hours(1)).unwrap_or(time) + Duration::hours(1)
}

/// Trip generator, one variant per strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripGenerator {
    /// Uniform counts, destinations and durations
    Baseline,
    /// Poisson counts from fitted rates
    CountBased,
    /// Exponential per-station streams
    InterArrival(StreamState),
}

impl TripGenerator {
    /// Generator for the given strategy
    pub fn new(kind: GeneratorKind) -> Self {
        match kind {
            GeneratorKind::Baseline => TripGenerator::Baseline,
            GeneratorKind::CountBased => TripGenerator::CountBased,
            GeneratorKind::InterArrival => TripGenerator::InterArrival(StreamState::default()),
        }
    }

    /// Strategy of this generator
    pub fn kind(&self) -> GeneratorKind {
        match self {
            TripGenerator::Baseline => GeneratorKind::Baseline,
            TripGenerator::CountBased => GeneratorKind::CountBased,
            TripGenerator::InterArrival(_) => GeneratorKind::InterArrival,
        }
    }

    /// Departures from one station for the tick starting at `now`
    pub fn generate(
        &mut self,
        station: StationId,
        now: DateTime<Utc>,
        ctx: &mut GenerationContext<'_>,
    ) -> Vec<TripEvent> {
        let timestep = ctx.timestep;
        match self {
            TripGenerator::Baseline => {
                let available = ctx.ledger.count(station).unwrap_or(0);
                let departures = ctx.rng.gen_range(0..=available);
                let tick_minutes = timestep.num_minutes().max(0);
                let max_trip = ctx.config.max_trip_duration();

                let mut trips = Vec::with_capacity(departures as usize);
                for _ in 0..departures {
                    let Some(destination) = ctx.uniform_station() else { break };
                    let start = now + Duration::minutes(ctx.rng.gen_range(0..=tick_minutes));
                    let duration = sample_uniform_duration(max_trip, ctx.rng);
                    trips.push(ctx.build_trip(station, destination, start, duration));
                }
                trips
            }
            TripGenerator::CountBased => {
                let Some(rate) = ctx.scaled_rate(station, now) else { return Vec::new() };
                let tick_hours = timestep.num_seconds() as f64 / 3600.0;
                let departures = sample_count(rate * tick_hours, ctx.rng);
                let tick_secs = timestep.num_seconds().max(1);

                let mut trips = Vec::with_capacity(departures as usize);
                for _ in 0..departures {
                    let start = now + Duration::seconds(ctx.rng.gen_range(0..tick_secs));
                    if let Some(trip) = ctx.fitted_trip(station, start) {
                        trips.push(trip);
                    }
                }
                trips
            }
            TripGenerator::InterArrival(state) => {
                if state.outstanding.contains(&station) {
                    return Vec::new();
                }
                let horizon = now + timestep;
                let mut from = state.resume_at.get(&station).copied().unwrap_or(now);

                loop {
                    if from > horizon {
                        state.resume_at.insert(station, from);
                        return Vec::new();
                    }
                    let wait = ctx.scaled_rate(station, from).and_then(|rate| sample_wait(rate, ctx.rng));
                    match wait {
                        Some(wait) => {
                            state.resume_at.remove(&station);
                            return match ctx.fitted_trip(station, from + wait) {
                                Some(trip) => {
                                    state.outstanding.insert(station);
                                    vec![trip]
                                }
                                None => Vec::new(),
                            };
                        }
                        None => from = next_hour(from),
                    }
                }
            }
        }
    }

    /// Departures from every station for the tick starting at `now`
    pub fn generate_tick(
        &mut self,
        now: DateTime<Utc>,
        ctx: &mut GenerationContext<'_>,
    ) -> Vec<TripEvent> {
        let stations: Vec<StationId> = ctx.catalog.ids().collect();
        stations.into_iter().flat_map(|station| self.generate(station, now, ctx)).collect()
    }

    /// Notify the generator that a departure from `station` was resolved at `at`
    ///
    /// The inter-arrival strategy schedules the station's next departure right
    /// away, whether or not the rider found a bike. `now` is the start of the
    /// current tick.
    pub fn on_departure_resolved(
        &mut self,
        station: StationId,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
        ctx: &mut GenerationContext<'_>,
    ) -> Vec<TripEvent> {
        match self {
            TripGenerator::InterArrival(state) => {
                state.outstanding.remove(&station);
                state.resume_at.insert(station, at);
            }
            _ => return Vec::new(),
        }
        self.generate(station, now, ctx)
    }
}
