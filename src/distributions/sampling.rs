//! Samplers for counts, waits, durations and destinations

use crate::types::StationId;
use chrono::Duration;
use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma, Poisson};
use serde::{Deserialize, Serialize};

/// Gamma-distributed trip duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationModel {
    /// Gamma shape parameter
    pub shape: f64,
    /// Gamma scale parameter, in seconds
    pub scale: f64,
}

impl DurationModel {
    /// Create a duration model
    pub fn new(shape: f64, scale: f64) -> Self {
        Self { shape, scale }
    }

    /// Draw a duration; degenerate parameters yield zero
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.shape <= 0.0 || self.scale <= 0.0 {
            return Duration::zero();
        }
        match Gamma::new(self.shape, self.scale) {
            Ok(gamma) => seconds(gamma.sample(rng)),
            Err(_) => Duration::zero(),
        }
    }

    /// Mean duration
    pub fn mean(&self) -> Duration {
        if self.shape <= 0.0 || self.scale <= 0.0 {
            return Duration::zero();
        }
        seconds(self.shape * self.scale)
    }
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::milliseconds((value * 1000.0).round() as i64)
    } else {
        Duration::zero()
    }
}

/// Number of departures in a tick with the given expected count
pub fn sample_count<R: Rng + ?Sized>(expected: f64, rng: &mut R) -> u32 {
    if !expected.is_finite() || expected <= 0.0 {
        return 0;
    }
    match Poisson::new(expected) {
        Ok(poisson) => {
            let draw: f64 = poisson.sample(rng);
            draw.max(0.0).min(u32::MAX as f64) as u32
        }
        Err(_) => 0,
    }
}

/// Waiting time until the next departure for a rate in departures per hour
pub fn sample_wait<R: Rng + ?Sized>(rate_per_hour: f64, rng: &mut R) -> Option<Duration> {
    if !rate_per_hour.is_finite() || rate_per_hour <= 0.0 {
        return None;
    }
    let exp = Exp::new(rate_per_hour).ok()?;
    let hours: f64 = exp.sample(rng);
    Some(seconds(hours * 3600.0))
}

/// Uniform duration in `[0, max]`, whole minutes
pub fn sample_uniform_duration<R: Rng + ?Sized>(max: Duration, rng: &mut R) -> Duration {
    let minutes = max.num_minutes().max(0);
    Duration::minutes(rng.gen_range(0..=minutes))
}

/// Destination probabilities from one origin stored as a cumulative vector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DestinationDistribution {
    cumulative: Vec<f64>,
    stations: Vec<StationId>,
}

impl DestinationDistribution {
    /// Build from `(station, weight)` pairs; non-positive weights are skipped
    ///
    /// Returns `None` when no weight remains.
    pub fn from_weights(weights: impl IntoIterator<Item = (StationId, f64)>) -> Option<Self> {
        let mut running = 0.0;
        let mut cumulative = Vec::new();
        let mut stations = Vec::new();
        for (station, weight) in weights {
            if weight.is_finite() && weight > 0.0 {
                running += weight;
                cumulative.push(running);
                stations.push(station);
            }
        }
        if stations.is_empty() {
            return None;
        }
        // Normalise so the last entry is exactly one
        for value in cumulative.iter_mut() {
            *value /= running;
        }
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Some(Self { cumulative, stations })
    }

    /// Pick a destination by bisecting the cumulative vector
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<StationId> {
        let draw: f64 = rng.gen();
        let index = self.cumulative.partition_point(|bound| *bound <= draw);
        self.stations.get(index.min(self.stations.len().saturating_sub(1))).copied()
    }

    /// Candidate destinations in insertion order
    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    /// Probability of a given destination
    pub fn probability(&self, station: StationId) -> f64 {
        self.stations
            .iter()
            .position(|candidate| *candidate == station)
            .map(|index| {
                let previous = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
                self.cumulative[index] - previous
            })
            .unwrap_or(0.0)
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether there are no destinations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
