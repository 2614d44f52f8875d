//! Simulation results and reporting
//!
//! [`SimulationResult`] is what a run hands back: the trips that reached a
//! dock, every disappointment, the final occupancy and the rebalancing and
//! reroute counters. The derived views here summarise it for reports and for
//! the cost analysis.

use crate::trips::{Disappointment, TripEvent};
use crate::types::{DisappointmentKind, GeneratorKind, StationId};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Start of the simulated window
    pub start_time: DateTime<Utc>,
    /// End of the simulated window
    pub end_time: DateTime<Utc>,
    /// Tick length in seconds
    pub timestep_secs: i64,
    /// Trip generation strategy used
    pub generator: GeneratorKind,
    /// Seed of the run's generator
    pub seed: u64,
    /// Trips that docked, in the order they docked
    pub completed_trips: Vec<TripEvent>,
    /// Riders turned away, in the order it happened
    pub disappointments: Vec<Disappointment>,
    /// Station counts when the run stopped
    pub final_occupancy: BTreeMap<StationId, u32>,
    /// Bikes taken out of stations by rebalancing
    pub bikes_rebalanced: u64,
    /// Fleet size of the run
    pub total_bikes: u64,
    /// Trips that ran out of reroute candidates
    pub unresolved_trips: Vec<TripEvent>,
    /// Departures scheduled past the end of the window
    pub pending_departures: Vec<TripEvent>,
    /// Bikes still on the road at the end of the window
    pub pending_arrivals: Vec<TripEvent>,
    /// Bikes left in the rebalancing pool
    pub pool_at_end: u64,
    /// Fallbacks taken because fitted data was missing
    pub data_gaps: usize,
    /// Arrivals sent on to another station
    pub reroutes: usize,
    /// Ticks executed
    pub ticks: u64,
}

/// Disappointments at one station
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationTally {
    /// Riders who found no bike
    pub empty: usize,
    /// Riders who found no dock
    pub full: usize,
}

impl StationTally {
    /// All disappointments at the station
    pub fn total(&self) -> usize {
        self.empty + self.full
    }
}

/// Headline numbers of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Trip generation strategy used
    pub generator: GeneratorKind,
    /// Seed of the run's generator
    pub seed: u64,
    /// Start of the simulated window
    pub start_time: DateTime<Utc>,
    /// End of the simulated window
    pub end_time: DateTime<Utc>,
    /// Ticks executed
    pub ticks: u64,
    /// Fleet size
    pub total_bikes: u64,
    /// Trips that docked
    pub completed_trips: usize,
    /// Docked trips that needed at least one reroute
    pub rerouted_trips: usize,
    /// Trips abandoned after exhausting reroute candidates
    pub unresolved_trips: usize,
    /// Riders who found no bike
    pub empty_disappointments: usize,
    /// Riders who found no dock
    pub full_disappointments: usize,
    /// Bikes moved by rebalancing
    pub bikes_rebalanced: u64,
    /// Fallbacks taken because fitted data was missing
    pub data_gaps: usize,
    /// Bikes still on the road at the end
    pub pending_arrivals: usize,
    /// Bikes left in the rebalancing pool
    pub pool_at_end: u64,
}

impl SimulationResult {
    /// Result of a run that never ticked
    pub fn empty(
        start_time: DateTime<Utc>,
        generator: GeneratorKind,
        seed: u64,
        final_occupancy: BTreeMap<StationId, u32>,
    ) -> Self {
        let total_bikes = final_occupancy.values().map(|count| *count as u64).sum();
        Self {
            start_time,
            end_time: start_time,
            timestep_secs: 0,
            generator,
            seed,
            completed_trips: Vec::new(),
            disappointments: Vec::new(),
            final_occupancy,
            bikes_rebalanced: 0,
            total_bikes,
            unresolved_trips: Vec::new(),
            pending_departures: Vec::new(),
            pending_arrivals: Vec::new(),
            pool_at_end: 0,
            data_gaps: 0,
            reroutes: 0,
            ticks: 0,
        }
    }

    /// Number of trips that docked
    pub fn trip_count(&self) -> usize {
        self.completed_trips.len()
    }

    /// Docked trips that needed at least one reroute
    pub fn rerouted_trip_count(&self) -> usize {
        self.completed_trips.iter().filter(|trip| trip.was_rerouted()).count()
    }

    fn count_kind(&self, kind: DisappointmentKind) -> usize {
        self.disappointments.iter().filter(|d| d.kind == kind).count()
    }

    /// Riders who found no bike
    pub fn empty_disappointments(&self) -> usize {
        self.count_kind(DisappointmentKind::EmptyOnDeparture)
    }

    /// Riders who found no dock
    pub fn full_disappointments(&self) -> usize {
        self.count_kind(DisappointmentKind::FullOnArrival)
    }

    /// Disappointments per attempted departure, as a percentage
    pub fn disappointment_percentage(&self) -> f64 {
        let attempts = self.trip_count() + self.empty_disappointments() + self.unresolved_trips.len();
        if attempts == 0 {
            0.0
        } else {
            (self.disappointments.len() as f64 / attempts as f64) * 100.0
        }
    }

    /// Disappointments grouped by station
    pub fn disappointments_by_station(&self) -> BTreeMap<StationId, StationTally> {
        let mut tallies: BTreeMap<StationId, StationTally> = BTreeMap::new();
        for disappointment in &self.disappointments {
            let tally = tallies.entry(disappointment.station).or_default();
            match disappointment.kind {
                DisappointmentKind::EmptyOnDeparture => tally.empty += 1,
                DisappointmentKind::FullOnArrival => tally.full += 1,
            }
        }
        tallies
    }

    /// Completed trips by start weekday (Monday first) and hour
    pub fn trips_by_weekday_hour(&self) -> [[usize; 24]; 7] {
        let mut histogram = [[0usize; 24]; 7];
        for trip in &self.completed_trips {
            let day = trip.start_time.weekday().num_days_from_monday() as usize;
            let hour = trip.start_time.hour() as usize;
            histogram[day][hour] += 1;
        }
        histogram
    }

    /// Station with the most disappointments, lowest id on ties
    pub fn worst_station(&self) -> Option<(StationId, StationTally)> {
        self.disappointments_by_station()
            .into_iter()
            .fold(None, |worst, (station, tally)| match worst {
                Some((_, best)) if best.total() >= tally.total() => worst,
                _ => Some((station, tally)),
            })
    }

    /// Headline numbers
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            generator: self.generator,
            seed: self.seed,
            start_time: self.start_time,
            end_time: self.end_time,
            ticks: self.ticks,
            total_bikes: self.total_bikes,
            completed_trips: self.trip_count(),
            rerouted_trips: self.rerouted_trip_count(),
            unresolved_trips: self.unresolved_trips.len(),
            empty_disappointments: self.empty_disappointments(),
            full_disappointments: self.full_disappointments(),
            bikes_rebalanced: self.bikes_rebalanced,
            data_gaps: self.data_gaps,
            pending_arrivals: self.pending_arrivals.len(),
            pool_at_end: self.pool_at_end,
        }
    }

    /// Multi-line report for the terminal
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Bike-Share Simulation Report ===\n\n");
        report.push_str(&format!(
            "Window: {} to {} ({} ticks of {}s)\n",
            self.start_time, self.end_time, self.ticks, self.timestep_secs
        ));
        report.push_str(&format!("Generator: {} (seed {})\n", self.generator, self.seed));
        report.push_str(&format!(
            "Fleet: {} bikes across {} stations\n\n",
            self.total_bikes,
            self.final_occupancy.len()
        ));

        report.push_str("Trips:\n");
        report.push_str(&format!("  • Completed: {}\n", self.trip_count()));
        report.push_str(&format!("  • Rerouted before docking: {}\n", self.rerouted_trip_count()));
        report.push_str(&format!("  • Unresolved: {}\n", self.unresolved_trips.len()));
        report.push_str(&format!("  • Still on the road: {}\n\n", self.pending_arrivals.len()));

        report.push_str("Disappointments:\n");
        report.push_str(&format!("  • Empty on departure: {}\n", self.empty_disappointments()));
        report.push_str(&format!("  • Full on arrival: {}\n", self.full_disappointments()));
        report.push_str(&format!(
            "  • Share of attempts: {:.1}%\n",
            self.disappointment_percentage()
        ));
        if let Some((station, tally)) = self.worst_station() {
            report.push_str(&format!(
                "  • Worst station: {} ({} empty, {} full)\n",
                station, tally.empty, tally.full
            ));
        }
        report.push('\n');

        report.push_str("Operations:\n");
        report.push_str(&format!("  • Bikes rebalanced: {}\n", self.bikes_rebalanced));
        report.push_str(&format!("  • Left in pool: {}\n", self.pool_at_end));
        report.push_str(&format!("  • Data gaps: {}\n", self.data_gaps));

        report
    }

    /// One-line summary for logs
    pub fn generate_compact_summary(&self) -> String {
        format!(
            "{} ticks, {} trips ({} rerouted, {} unresolved), {} disappointments ({} empty, {} full), {} bikes rebalanced",
            self.ticks,
            self.trip_count(),
            self.rerouted_trip_count(),
            self.unresolved_trips.len(),
            self.disappointments.len(),
            self.empty_disappointments(),
            self.full_disappointments(),
            self.bikes_rebalanced
        )
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}
