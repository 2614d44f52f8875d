//! Cost analysis and fleet-size optimisation
//!
//! A run's profit is trip revenue minus the cost of owning the fleet and of
//! moving bikes around. Riders who found no bike are reported as missed
//! revenue but do not enter the profit.
//!
//! Fleet-size sweeps run one independent simulation per total on the rayon
//! pool. The optimiser climbs from a starting total by a relative step, halving
//! the step whenever neither neighbour improves on the best profit.

use crate::simulation::{EngineResult, RunSummary, Simulation, SimulationResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Inclusive range of fleet sizes, `MIN:MAX:STEP` on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRange {
    /// Smallest fleet
    pub min: u32,
    /// Largest fleet
    pub max: u32,
    /// Distance between fleets
    pub step: u32,
}

impl SweepRange {
    /// Fleet sizes covered, smallest first
    pub fn values(&self) -> Vec<u32> {
        if self.step == 0 || self.min > self.max {
            return Vec::new();
        }
        (self.min..=self.max).step_by(self.step as usize).collect()
    }
}

impl FromStr for SweepRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [min, max, step] = parts.as_slice() else {
            return Err(format!("Expected MIN:MAX:STEP, got '{}'", s));
        };
        let parse = |field: &str, value: &str| {
            value.trim().parse::<u32>().map_err(|e| format!("Invalid {} '{}': {}", field, value, e))
        };
        let range = SweepRange { min: parse("min", min)?, max: parse("max", max)?, step: parse("step", step)? };
        if range.step == 0 {
            return Err("Sweep step must be greater than 0".to_string());
        }
        if range.min > range.max {
            return Err(format!("Sweep minimum {} exceeds maximum {}", range.min, range.max));
        }
        Ok(range)
    }
}

impl fmt::Display for SweepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.min, self.max, self.step)
    }
}

/// Prices used to value a run, in dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Cost per bike moved by rebalancing
    pub rebalance_cost: f64,
    /// Cost per bike in the fleet
    pub bike_cost: f64,
    /// Revenue per completed trip
    pub trip_revenue: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { rebalance_cost: 0.03, bike_cost: 0.001, trip_revenue: 0.05 }
    }
}

impl CostModel {
    /// Value a run
    pub fn evaluate(&self, result: &SimulationResult) -> CostBreakdown {
        let trips = result.trip_count() as f64;
        let refused = result.empty_disappointments() as f64;
        CostBreakdown {
            gross_revenue: trips * self.trip_revenue,
            gross_cost: result.bikes_rebalanced as f64 * self.rebalance_cost
                + result.total_bikes as f64 * self.bike_cost,
            missed_revenue: refused * self.trip_revenue,
        }
    }
}

/// Money made and lost in one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Revenue from completed trips
    pub gross_revenue: f64,
    /// Fleet and rebalancing cost
    pub gross_cost: f64,
    /// Revenue lost to riders who found no bike
    pub missed_revenue: f64,
}

impl CostBreakdown {
    /// Revenue minus cost
    pub fn profit(&self) -> f64 {
        self.gross_revenue - self.gross_cost
    }
}

/// One fleet size of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Fleet size requested
    pub bike_total: u32,
    /// Headline numbers of the run
    pub summary: RunSummary,
    /// Its valuation
    pub costs: CostBreakdown,
}

impl SweepPoint {
    fn evaluate(simulation: &Simulation, bike_total: u32, model: &CostModel) -> EngineResult<Self> {
        let result = simulation.run_with_total(bike_total)?;
        let costs = model.evaluate(&result);
        debug!(bike_total, profit = costs.profit(), "Evaluated fleet size");
        Ok(Self { bike_total, summary: result.summary(), costs })
    }

    /// Profit of the run
    pub fn profit(&self) -> f64 {
        self.costs.profit()
    }
}

/// Run one simulation per fleet size in `range` on the rayon pool
///
/// Points come back sorted by fleet size. The first failing run aborts the
/// sweep.
#[instrument(skip(simulation, model, range), fields(range = %range))]
pub fn sweep_bike_totals(
    simulation: &Simulation,
    range: SweepRange,
    model: &CostModel,
) -> EngineResult<Vec<SweepPoint>> {
    let totals = range.values();
    info!(runs = totals.len(), "Starting fleet-size sweep");

    let mut points = totals
        .par_iter()
        .map(|total| SweepPoint::evaluate(simulation, *total, model))
        .collect::<EngineResult<Vec<_>>>()?;
    points.sort_by_key(|point| point.bike_total);
    Ok(points)
}

/// Outcome of the fleet-size hill climb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    /// Best point found
    pub best: SweepPoint,
    /// Every point evaluated, in evaluation order
    pub evaluated: Vec<SweepPoint>,
    /// Relative step when the climb stopped
    pub final_step: f64,
}

/// Options of the fleet-size hill climb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Largest relative change tried per iteration
    pub step_factor: f64,
    /// Iterations to run
    pub iterations: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self { step_factor: 0.15, iterations: 5 }
    }
}

/// Hill-climb the fleet size from `start` toward higher profit
///
/// Each iteration evaluates the best total scaled up and down by the current
/// step. The better neighbour replaces the best when it strictly improves on
/// it; otherwise the step is halved.
#[instrument(skip(simulation, model, settings))]
pub fn optimize_bike_total(
    simulation: &Simulation,
    start: u32,
    model: &CostModel,
    settings: OptimizerSettings,
) -> EngineResult<Optimization> {
    let mut best = SweepPoint::evaluate(simulation, start, model)?;
    let mut evaluated = vec![best.clone()];
    let mut step = settings.step_factor;

    for iteration in 0..settings.iterations {
        let current = best.bike_total as f64;
        let up_total = (current * (1.0 + step)).round() as u32;
        let down_total = (current * (1.0 - step)).max(0.0).round() as u32;

        let (up, down) = rayon::join(
            || SweepPoint::evaluate(simulation, up_total, model),
            || SweepPoint::evaluate(simulation, down_total, model),
        );
        let (up, down) = (up?, down?);
        evaluated.push(up.clone());
        evaluated.push(down.clone());

        let best_profit = best.profit();
        if up.profit() > down.profit() && up.profit() > best_profit {
            best = up;
        } else if down.profit() > up.profit() && down.profit() > best_profit {
            best = down;
        } else {
            step *= 0.5;
        }
        debug!(iteration, best_total = best.bike_total, profit = best.profit(), step, "Optimizer iteration");
    }

    info!(best_total = best.bike_total, profit = best.profit(), "Fleet-size optimisation finished");
    Ok(Optimization { best, evaluated, final_step: step })
}
