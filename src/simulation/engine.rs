//! Simulation engine
//!
//! [`Simulation`] holds the immutable inputs of a network: catalog, nearest
//! rankings, fitted distributions and initial placement. Each call to
//! [`Simulation::run`] builds a fresh [`SimulationRun`] that owns its ledger,
//! timeline and random generator, so runs never share mutable state and can
//! execute side by side.
//!
//! A tick at time `now` rebalances, generates departures, then resolves every
//! event due no later than `now + timestep`. Events further out stay on the
//! timeline for a later tick. After each tick the ledger bounds and the bike
//! count are checked; a breach aborts the run.

use super::rebalance::RebalancePolicy;
use super::reroute::{DisappointmentTracker, RerouteOutcome};
use super::statistics::SimulationResult;
use super::timeline::{EventTimeline, TimelineEvent};
use super::{EngineResult, SimulationError};
use crate::distributions::DistributionProvider;
use crate::network::{DockOutcome, InitialOccupancy, NearestStations, OccupancyLedger, StationCatalog};
use crate::perf_span;
use crate::trips::{Disappointment, GenerationContext, TripEvent, TripGenerator};
use crate::types::SimulationConfig;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Inputs of a bike-share network, reusable across runs
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    catalog: StationCatalog,
    nearest: NearestStations,
    provider: Arc<dyn DistributionProvider>,
    initial: InitialOccupancy,
    in_flight: Vec<TripEvent>,
}

impl Simulation {
    /// Create a simulation after validating its configuration
    ///
    /// A configured `bike_total` rescales `initial` to that fleet size.
    pub fn new(
        config: SimulationConfig,
        catalog: StationCatalog,
        nearest: NearestStations,
        provider: Arc<dyn DistributionProvider>,
        initial: InitialOccupancy,
    ) -> EngineResult<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(SimulationError::configuration_error("Station catalog is empty"));
        }
        let initial = match config.bike_total {
            Some(total) => initial.with_total(total),
            None => initial,
        };
        Ok(Self { config, catalog, nearest, provider, initial, in_flight: Vec::new() })
    }

    /// Trips already on the road when every run starts
    pub fn with_in_flight(mut self, trips: Vec<TripEvent>) -> Self {
        self.in_flight = trips;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Stations of the network
    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Reroute rankings
    pub fn nearest(&self) -> &NearestStations {
        &self.nearest
    }

    /// Initial placement used by [`Simulation::run`]
    pub fn initial_occupancy(&self) -> &InitialOccupancy {
        &self.initial
    }

    /// Prepare a run over `[start, end)` without executing it
    pub fn start(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timestep: Duration,
    ) -> EngineResult<SimulationRun<'_>> {
        SimulationRun::new(self, &self.initial, start, end, timestep)
    }

    /// Run over `[start, end)` with ticks of `timestep`
    #[instrument(skip(self), fields(stations = self.catalog.len(), generator = %self.config.generator))]
    pub fn run(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timestep: Duration,
    ) -> EngineResult<SimulationResult> {
        self.start(start, end, timestep)?.run_to_end()
    }

    /// Run over the configured window and timestep
    pub fn run_configured(&self) -> EngineResult<SimulationResult> {
        self.run(self.config.start_time, self.config.end_time, self.config.timestep())
    }

    /// Run over the configured window with the fleet rescaled to `total` bikes
    #[instrument(skip(self), fields(stations = self.catalog.len()))]
    pub fn run_with_total(&self, total: u32) -> EngineResult<SimulationResult> {
        let initial = self.initial.clone().with_total(total);
        SimulationRun::new(
            self,
            &initial,
            self.config.start_time,
            self.config.end_time,
            self.config.timestep(),
        )?
        .run_to_end()
    }
}

fn context<'r>(
    sim: &'r Simulation,
    ledger: &'r OccupancyLedger,
    rng: &'r mut StdRng,
    fleet_size: u32,
    timestep: Duration,
) -> GenerationContext<'r> {
    GenerationContext {
        catalog: &sim.catalog,
        ledger,
        provider: sim.provider.as_ref(),
        config: &sim.config,
        timestep,
        fleet_size,
        rng,
        data_gaps: 0,
    }
}

/// State of one run in progress
#[derive(Debug)]
pub struct SimulationRun<'a> {
    sim: &'a Simulation,
    ledger: OccupancyLedger,
    timeline: EventTimeline,
    generator: TripGenerator,
    tracker: DisappointmentTracker,
    rebalance: Option<RebalancePolicy>,
    rng: StdRng,
    pool: u64,
    total_bikes: u64,
    fleet_size: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    timestep: Duration,
    completed: Vec<TripEvent>,
    unresolved: Vec<TripEvent>,
    bikes_rebalanced: u64,
    data_gaps: usize,
    ticks: u64,
}

impl<'a> SimulationRun<'a> {
    /// Place the initial fleet and queue the simulation's in-flight trips
    pub fn new(
        sim: &'a Simulation,
        initial: &InitialOccupancy,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timestep: Duration,
    ) -> EngineResult<Self> {
        if end < start {
            return Err(SimulationError::configuration_error(format!(
                "Run ends at {} before it starts at {}",
                end, start
            )));
        }
        if timestep <= Duration::zero() {
            return Err(SimulationError::configuration_error("Timestep must be positive"));
        }
        if !sim.provider.covers(start, end) {
            return Err(SimulationError::configuration_error(format!(
                "Run from {} to {} is outside the window the distributions were loaded for",
                start, end
            )));
        }

        let mut rng = StdRng::seed_from_u64(sim.config.seed);
        let counts = initial.resolve(&sim.catalog, &mut rng);
        let ledger = OccupancyLedger::new(&sim.catalog, &counts)?;
        let total_bikes = ledger.total_bikes();

        let mut run = Self {
            sim,
            ledger,
            timeline: EventTimeline::new(),
            generator: TripGenerator::new(sim.config.generator),
            tracker: DisappointmentTracker::new(sim.config.max_reroute_candidates),
            rebalance: sim.config.rebalancing.then(|| RebalancePolicy::from_config(&sim.config)),
            rng,
            pool: 0,
            total_bikes,
            fleet_size: 0,
            start,
            end,
            now: start,
            timestep,
            completed: Vec::new(),
            unresolved: Vec::new(),
            bikes_rebalanced: 0,
            data_gaps: 0,
            ticks: 0,
        };
        for trip in &sim.in_flight {
            run.inject_arrival(trip.clone())?;
        }
        run.fleet_size = u32::try_from(run.total_bikes).unwrap_or(u32::MAX);

        info!(
            start = %start,
            end = %end,
            timestep_secs = timestep.num_seconds(),
            stations = sim.catalog.len(),
            bikes = run.total_bikes,
            seed = sim.config.seed,
            "Simulation run initialized"
        );
        Ok(run)
    }

    /// Queue a departure that the generator did not produce
    pub fn inject_departure(&mut self, trip: TripEvent) -> EngineResult<()> {
        if !self.sim.catalog.contains(trip.origin) {
            return Err(SimulationError::UnknownStation(trip.origin));
        }
        self.timeline.push_departure(trip);
        Ok(())
    }

    /// Queue a bike already on the road; it joins the run's fleet
    pub fn inject_arrival(&mut self, trip: TripEvent) -> EngineResult<()> {
        if !self.sim.catalog.contains(trip.destination) {
            return Err(SimulationError::UnknownStation(trip.destination));
        }
        self.timeline.push_arrival(trip)?;
        self.total_bikes += 1;
        Ok(())
    }

    /// Whether the clock has reached the end of the window
    pub fn is_finished(&self) -> bool {
        self.now >= self.end
    }

    /// Advance the clock by one tick
    pub fn step(&mut self) -> EngineResult<()> {
        if self.is_finished() {
            return Ok(());
        }
        let now = self.now;
        let horizon = now + self.timestep;
        let span = perf_span!("tick", tick = self.ticks);
        let _guard = span.enter();

        if let Some(policy) = self.rebalance {
            let report = policy.run(&mut self.ledger, &mut self.pool, now)?;
            self.bikes_rebalanced += report.bikes_removed();
        }

        let departures = {
            let mut ctx = context(
                self.sim,
                &self.ledger,
                &mut self.rng,
                self.fleet_size,
                self.timestep,
            );
            let trips = self.generator.generate_tick(now, &mut ctx);
            self.data_gaps += ctx.data_gaps;
            trips
        };
        let generated = departures.len();
        for trip in departures {
            self.timeline.push_departure(trip);
        }

        let mut resolved = 0usize;
        while let Some(event) = self.timeline.pop_due(horizon) {
            self.resolve(event, now)?;
            resolved += 1;
        }

        self.ledger.check_bounds()?;
        self.check_conservation()?;

        debug!(
            tick = self.ticks,
            now = %now,
            generated,
            resolved,
            pending = self.timeline.len(),
            pool = self.pool,
            "Tick complete"
        );
        self.now = horizon;
        self.ticks += 1;
        Ok(())
    }

    fn resolve(&mut self, event: TimelineEvent, now: DateTime<Utc>) -> EngineResult<()> {
        match event {
            TimelineEvent::Departure(trip) => {
                let origin = trip.origin;
                let at = trip.start_time;
                match self.ledger.apply_departure(origin, at)? {
                    DockOutcome::Applied => self.timeline.push_arrival(trip)?,
                    DockOutcome::StationEmpty => self.tracker.record_empty(origin, at),
                    DockOutcome::StationFull => {
                        return Err(SimulationError::invariant_violation(format!(
                            "Departure from {} reported a full station",
                            origin
                        )))
                    }
                }

                let follow_up = {
                    let mut ctx = context(
                        self.sim,
                        &self.ledger,
                        &mut self.rng,
                        self.fleet_size,
                        self.timestep,
                    );
                    let trips = self.generator.on_departure_resolved(origin, at, now, &mut ctx);
                    self.data_gaps += ctx.data_gaps;
                    trips
                };
                for trip in follow_up {
                    self.timeline.push_departure(trip);
                }
            }
            TimelineEvent::Arrival(trip) => {
                let at = trip.end_time.ok_or_else(|| {
                    SimulationError::invariant_violation(format!("Trip {} arrived without an end time", trip.id))
                })?;
                match self.ledger.apply_arrival(trip.destination, at)? {
                    DockOutcome::Applied => self.completed.push(trip),
                    DockOutcome::StationFull => {
                        let outcome = {
                            let mut ctx = context(
                                self.sim,
                                &self.ledger,
                                &mut self.rng,
                                self.fleet_size,
                                self.timestep,
                            );
                            let outcome =
                                self.tracker.handle_full_arrival(trip, at, &self.sim.nearest, &mut ctx);
                            self.data_gaps += ctx.data_gaps;
                            outcome
                        };
                        match outcome {
                            RerouteOutcome::Rerouted(trip) => self.timeline.push_arrival(trip)?,
                            RerouteOutcome::Exhausted(trip) => {
                                // The abandoned bike is picked up by the rebalancing crew
                                self.pool += 1;
                                self.unresolved.push(trip);
                            }
                        }
                    }
                    DockOutcome::StationEmpty => {
                        return Err(SimulationError::invariant_violation(format!(
                            "Arrival at {} reported an empty station",
                            trip.destination
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Bikes docked, on the road and in the rebalancing pool
    pub fn bikes_accounted(&self) -> u64 {
        self.ledger.total_bikes() + self.timeline.pending_arrivals() as u64 + self.pool
    }

    /// Whether every bike of the fleet is accounted for
    pub fn conservation_holds(&self) -> bool {
        self.bikes_accounted() == self.total_bikes
    }

    fn check_conservation(&self) -> EngineResult<()> {
        if self.conservation_holds() {
            return Ok(());
        }
        Err(SimulationError::invariant_violation(format!(
            "Fleet of {} bikes but {} docked, {} on the road and {} in the pool",
            self.total_bikes,
            self.ledger.total_bikes(),
            self.timeline.pending_arrivals(),
            self.pool
        )))
    }

    /// Current simulation time
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Current occupancy
    pub fn ledger(&self) -> &OccupancyLedger {
        &self.ledger
    }

    /// Pending events
    pub fn timeline(&self) -> &EventTimeline {
        &self.timeline
    }

    /// Bikes waiting in the rebalancing pool
    pub fn pool(&self) -> u64 {
        self.pool
    }

    /// Fleet size of the run
    pub fn total_bikes(&self) -> u64 {
        self.total_bikes
    }

    /// Disappointments recorded so far
    pub fn disappointments(&self) -> &[Disappointment] {
        self.tracker.disappointments()
    }

    /// Trips that reached a dock so far
    pub fn completed_trips(&self) -> &[TripEvent] {
        &self.completed
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run every remaining tick and collect the result
    pub fn run_to_end(mut self) -> EngineResult<SimulationResult> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.finish())
    }

    /// Stop here and collect the result
    pub fn finish(mut self) -> SimulationResult {
        let (pending_departures, pending_arrivals) = self.timeline.drain_pending();
        let reroutes = self.tracker.reroutes();
        let result = SimulationResult {
            start_time: self.start,
            end_time: self.end,
            timestep_secs: self.timestep.num_seconds(),
            generator: self.sim.config.generator,
            seed: self.sim.config.seed,
            completed_trips: self.completed,
            disappointments: self.tracker.into_disappointments(),
            final_occupancy: self.ledger.snapshot(),
            bikes_rebalanced: self.bikes_rebalanced,
            total_bikes: self.total_bikes,
            unresolved_trips: self.unresolved,
            pending_departures,
            pending_arrivals,
            pool_at_end: self.pool,
            data_gaps: self.data_gaps,
            reroutes,
            ticks: self.ticks,
        };
        info!(summary = %result.generate_compact_summary(), "Simulation run finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{DistributionRecords, DurationRecord, FittedDistributions, RateRecord};
    use crate::network::Station;
    use crate::types::{BikeId, GeneratorKind, RiderClass, StationId, TripId};
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn monday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 4, 2, hour, 0, 0).unwrap()
    }

    fn config(generator: GeneratorKind) -> SimulationConfig {
        SimulationConfig {
            start_time: monday(6),
            end_time: monday(12),
            generator,
            ..Default::default()
        }
    }

    fn network() -> (StationCatalog, NearestStations) {
        let catalog = StationCatalog::new((1..=4).map(|id| Station::new(id, 6)));
        let nearest = NearestStations::from_rankings(
            (1..=4).map(|id| {
                let others = (1..=4).filter(|other| *other != id).map(StationId).collect();
                (StationId(id), others)
            }),
            8,
        );
        (catalog, nearest)
    }

    fn records() -> DistributionRecords {
        let rates = (1..=4)
            .flat_map(|station| {
                (0..24).map(move |hour| RateRecord {
                    station: StationId(station),
                    hour,
                    is_weekday: true,
                    year: None,
                    month: None,
                    rate: 3.0,
                })
            })
            .collect();
        let durations = (1..=4)
            .flat_map(|a| (1..=4).map(move |b| (a, b)))
            .map(|(a, b)| DurationRecord { origin: StationId(a), destination: StationId(b), shape: 2.0, scale: 600.0 })
            .collect();
        DistributionRecords { rates, durations, ..Default::default() }
    }

    fn simulation(generator: GeneratorKind, total: u32) -> Simulation {
        let config = config(generator);
        let (catalog, nearest) = network();
        let provider = FittedDistributions::load(&records(), config.start_time, config.end_time, &catalog);
        Simulation::new(config, catalog, nearest, Arc::new(provider), InitialOccupancy::Total(total)).unwrap()
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let sim = simulation(GeneratorKind::CountBased, 8);
        let result = sim.run(monday(10), monday(9), Duration::hours(1));
        assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));
    }

    #[test]
    fn test_zero_timestep_is_rejected() {
        let sim = simulation(GeneratorKind::CountBased, 8);
        let result = sim.run(monday(9), monday(10), Duration::zero());
        assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));
    }

    #[test]
    fn test_run_outside_loaded_window_is_rejected() {
        let sim = simulation(GeneratorKind::CountBased, 8);
        let result = sim.run(monday(11), monday(14), Duration::hours(1));
        assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));

        let result = sim.run(monday(7), monday(9), Duration::minutes(20)).unwrap();
        assert_eq!(result.ticks, 6);
    }

    #[test]
    fn test_every_tick_conserves_bikes() {
        for generator in [GeneratorKind::Baseline, GeneratorKind::CountBased, GeneratorKind::InterArrival] {
            let sim = simulation(generator, 12);
            let mut run = sim.start(monday(6), monday(12), Duration::minutes(30)).unwrap();
            while !run.is_finished() {
                run.step().unwrap();
                assert!(run.conservation_holds(), "{} lost a bike", generator);
                run.ledger().check_bounds().unwrap();
            }
            assert_eq!(run.ticks(), 12);
        }
    }

    #[test]
    fn test_same_seed_gives_same_result() {
        let sim = simulation(GeneratorKind::CountBased, 12);
        let first = sim.run_configured().unwrap();
        let second = sim.run_configured().unwrap();
        assert_eq!(first.completed_trips, second.completed_trips);
        assert_eq!(first.disappointments, second.disappointments);
        assert_eq!(first.final_occupancy, second.final_occupancy);
    }

    #[test]
    fn test_run_with_total_rescales_fleet() {
        let sim = simulation(GeneratorKind::CountBased, 8);
        let result = sim.run_with_total(20).unwrap();
        assert_eq!(result.total_bikes, 20);
    }

    #[test]
    fn test_injected_arrival_joins_fleet() {
        let sim = simulation(GeneratorKind::Baseline, 4);
        let mut run = sim.start(monday(6), monday(7), Duration::hours(1)).unwrap();
        let trip = TripEvent::new(
            TripId(Uuid::from_u128(1)),
            BikeId(1),
            RiderClass::Registered,
            StationId(1),
            StationId(2),
            monday(5),
            monday(6) + Duration::minutes(5),
        );
        run.inject_arrival(trip).unwrap();
        assert_eq!(run.total_bikes(), 5);
        assert!(run.conservation_holds());

        let unknown = TripEvent::new(
            TripId(Uuid::from_u128(2)),
            BikeId(1),
            RiderClass::Casual,
            StationId(1),
            StationId(99),
            monday(5),
            monday(6),
        );
        assert!(matches!(run.inject_arrival(unknown), Err(SimulationError::UnknownStation(_))));
    }

    #[test]
    fn test_explicit_counts_over_capacity_are_rejected() {
        let config = config(GeneratorKind::Baseline);
        let (catalog, nearest) = network();
        let provider = FittedDistributions::default();
        let initial = InitialOccupancy::Explicit(BTreeMap::from([(StationId(1), 7)]));
        let sim = Simulation::new(config, catalog, nearest, Arc::new(provider), initial).unwrap();
        assert!(matches!(sim.run_configured(), Err(SimulationError::ConfigurationError(_))));
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let (_, nearest) = network();
        let result = Simulation::new(
            config(GeneratorKind::Baseline),
            StationCatalog::new(Vec::new()),
            nearest,
            Arc::new(FittedDistributions::default()),
            InitialOccupancy::Total(0),
        );
        assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));
    }
}
