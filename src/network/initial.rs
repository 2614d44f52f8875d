//! Initial bike placement
//!
//! A run starts either from a fleet size spread over the network, from
//! historical per-station count statistics, or from explicit counts. Any of
//! these can be rescaled to a different fleet size.

use super::StationCatalog;
use crate::types::StationId;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Mean and standard deviation of a station's historical bike count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountStats {
    /// Mean count
    pub mean: f64,
    /// Standard deviation of the count
    #[serde(default)]
    pub std: f64,
}

impl CountStats {
    /// Draw a count, truncated toward zero and clamped to `[0, capacity]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, capacity: u32) -> u32 {
        let value = match Normal::new(self.mean, self.std) {
            Ok(normal) if self.std > 0.0 => normal.sample(rng),
            _ => self.mean,
        };
        if !value.is_finite() {
            return 0;
        }
        value.trunc().clamp(0.0, capacity as f64) as u32
    }
}

/// How bikes are placed when a run starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialOccupancy {
    /// Spread a fleet of this size over an empty network
    Total(u32),
    /// Sample each station from its historical count statistics
    Historical(BTreeMap<StationId, CountStats>),
    /// Use the given counts as-is
    Explicit(BTreeMap<StationId, u32>),
    /// Resolve `base`, then adjust proportionally until `total` bikes are placed
    Scaled {
        /// Placement to start from
        base: Box<InitialOccupancy>,
        /// Fleet size to reach
        total: u32,
    },
}

impl InitialOccupancy {
    /// The same placement rescaled to a fleet of `total` bikes
    pub fn with_total(self, total: u32) -> Self {
        match self {
            InitialOccupancy::Total(_) => InitialOccupancy::Total(total),
            InitialOccupancy::Scaled { base, .. } => InitialOccupancy::Scaled { base, total },
            other => InitialOccupancy::Scaled { base: Box::new(other), total },
        }
    }

    /// Counts for every catalog station, drawing from `rng` where sampling is needed
    ///
    /// Explicit counts are returned unchecked; the ledger validates them.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        catalog: &StationCatalog,
        rng: &mut R,
    ) -> BTreeMap<StationId, u32> {
        match self {
            InitialOccupancy::Total(total) => {
                let mut counts = catalog.ids().map(|id| (id, 0)).collect();
                distribute_total(&mut counts, catalog, *total as u64);
                counts
            }
            InitialOccupancy::Historical(stats) => sample_historical(stats, catalog, rng),
            InitialOccupancy::Explicit(counts) => counts.clone(),
            InitialOccupancy::Scaled { base, total } => {
                let mut counts = base.resolve(catalog, rng);
                counts.retain(|id, _| catalog.contains(*id));
                for station in catalog.iter() {
                    let count = counts.entry(station.id).or_insert(0);
                    *count = (*count).min(station.capacity);
                }
                distribute_total(&mut counts, catalog, *total as u64);
                counts
            }
        }
    }
}

fn sample_historical<R: Rng + ?Sized>(
    stats: &BTreeMap<StationId, CountStats>,
    catalog: &StationCatalog,
    rng: &mut R,
) -> BTreeMap<StationId, u32> {
    catalog
        .iter()
        .map(|station| {
            let count = match stats.get(&station.id) {
                Some(stats) => stats.sample(rng, station.capacity),
                None => {
                    warn!(station = %station.id, "No historical counts, drawing uniformly");
                    rng.gen_range(0..=station.capacity)
                }
            };
            (station.id, count)
        })
        .collect()
}

/// Move the network toward `total` bikes in proportional rounds
///
/// Each round gives every eligible station a share of the remaining
/// difference proportional to its current count (equal shares when all
/// eligible stations are empty), rounded toward the sign of the difference and
/// clamped to the station's bounds. Stations already at capacity are skipped
/// when adding and empty ones when removing. Stops once the total is reached
/// or no station can move further.
pub fn distribute_total(
    counts: &mut BTreeMap<StationId, u32>,
    catalog: &StationCatalog,
    total: u64,
) {
    loop {
        let current: i64 = counts.values().map(|count| *count as i64).sum();
        let mut remaining = total as i64 - current;
        if remaining == 0 {
            return;
        }
        let growing = remaining > 0;

        let eligible: Vec<(StationId, u32, u32)> = catalog
            .iter()
            .map(|station| {
                (station.id, counts.get(&station.id).copied().unwrap_or(0), station.capacity)
            })
            .filter(|(_, count, capacity)| if growing { count < capacity } else { *count > 0 })
            .collect();

        if eligible.is_empty() {
            warn!(requested = total, placed = current, "Network saturated before reaching fleet size");
            return;
        }

        let basis: i64 = eligible.iter().map(|(_, count, _)| *count as i64).sum();
        let delta = remaining as f64;
        let stations = eligible.len() as f64;

        for (id, count, capacity) in eligible {
            if remaining == 0 {
                break;
            }
            let raw = if basis > 0 {
                delta * count as f64 / basis as f64
            } else {
                delta / stations
            };
            let share = if growing {
                (raw.ceil() as i64).min((capacity - count) as i64).min(remaining)
            } else {
                (raw.floor() as i64).max(-(count as i64)).max(remaining)
            };
            counts.insert(id, (count as i64 + share) as u32);
            remaining -= share;
        }
        debug!(remaining, "Proportional placement round finished");
    }
}
