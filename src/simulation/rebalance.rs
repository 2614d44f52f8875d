//! Periodic rebalancing of stale full and empty stations
//!
//! One pass runs at the start of every tick:
//!
//! 1. Stations full for at least the threshold give up half their bikes
//!    (rounded down) to a shared moving pool and lose their full flag.
//! 2. Stations empty for at least the threshold become needy.
//! 3. While the pool holds fewer than `pool_factor` bikes per needy station,
//!    the currently most crowded station is drained to half its capacity, or
//!    to half its count when already below that, never under two bikes. The
//!    same station may be picked again; the loop ends once no station can
//!    give up another bike.
//! 4. The pool is shared evenly among needy stations, oldest onset first,
//!    limited by each station's free docks.
//!
//! Bikes left in the pool carry over to the next pass.

use crate::network::OccupancyLedger;
use crate::types::{SimulationConfig, StationId};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use super::EngineResult;

/// Bikes never taken from a crowded station below this count
const CROWDED_FLOOR: u32 = 2;

/// Bikes a crowded station gives up in one drain
///
/// Above half capacity it drops to half its docks, otherwise to half its
/// count, never under [`CROWDED_FLOOR`].
fn crowded_surplus(count: u32, capacity: u32) -> u32 {
    let half = if count > capacity / 2 { capacity / 2 } else { count / 2 };
    count.saturating_sub(half.max(CROWDED_FLOOR))
}

/// What one rebalancing pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    /// Stale full stations drained, with bikes taken
    pub drained_full: Vec<(StationId, u32)>,
    /// Crowded stations drained to top up the pool, with bikes taken
    pub drained_crowded: Vec<(StationId, u32)>,
    /// Needy stations supplied, with bikes delivered
    pub supplied: Vec<(StationId, u32)>,
    /// Pool size before the pass
    pub pool_before: u64,
    /// Pool size after the pass
    pub pool_after: u64,
}

impl RebalanceReport {
    /// Bikes taken out of stations during the pass
    pub fn bikes_removed(&self) -> u64 {
        self.drained_full
            .iter()
            .chain(self.drained_crowded.iter())
            .map(|(_, bikes)| *bikes as u64)
            .sum()
    }

    /// Bikes docked at needy stations during the pass
    pub fn bikes_delivered(&self) -> u64 {
        self.supplied.iter().map(|(_, bikes)| *bikes as u64).sum()
    }

    /// Whether the pass touched nothing
    pub fn is_noop(&self) -> bool {
        self.drained_full.is_empty() && self.drained_crowded.is_empty() && self.supplied.is_empty()
    }
}

/// Thresholds of the rebalancing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalancePolicy {
    threshold: Duration,
    pool_factor: u32,
}

impl RebalancePolicy {
    /// Policy acting on stations flagged for at least `threshold`
    pub fn new(threshold: Duration, pool_factor: u32) -> Self {
        Self { threshold, pool_factor }
    }

    /// Policy from the run configuration
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.rebalancing_threshold(), config.rebalance_pool_factor)
    }

    /// Age an onset must reach before the policy acts on it
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Run one pass at `now`, moving bikes through `pool`
    #[instrument(level = "debug", skip(self, ledger, pool), fields(pool = *pool))]
    pub fn run(
        &self,
        ledger: &mut OccupancyLedger,
        pool: &mut u64,
        now: DateTime<Utc>,
    ) -> EngineResult<RebalanceReport> {
        let mut report = RebalanceReport { pool_before: *pool, ..Default::default() };
        let mut visited: BTreeSet<StationId> = BTreeSet::new();

        for station in ledger.stale_full(now, self.threshold) {
            let count = ledger.count(station).unwrap_or(0);
            let take = count / 2;
            if take > 0 {
                ledger.remove_bikes(station, take)?;
                *pool += take as u64;
                report.drained_full.push((station, take));
            }
            ledger.clear_full(station)?;
            visited.insert(station);
        }

        let needy = ledger.stale_empty(now, self.threshold);
        if !needy.is_empty() {
            visited.extend(needy.iter().copied());
            self.top_up_pool(ledger, pool, needy.len(), &visited, &mut report)?;
            self.distribute(ledger, pool, &needy, &mut report)?;
        }

        report.pool_after = *pool;
        if !report.is_noop() {
            debug!(
                removed = report.bikes_removed(),
                delivered = report.bikes_delivered(),
                pool = *pool,
                needy = needy.len(),
                "Rebalancing pass moved bikes"
            );
        }
        Ok(report)
    }

    fn top_up_pool(
        &self,
        ledger: &mut OccupancyLedger,
        pool: &mut u64,
        needy: usize,
        visited: &BTreeSet<StationId>,
        report: &mut RebalanceReport,
    ) -> EngineResult<()> {
        let goal = self.pool_factor as u64 * needy as u64;

        while *pool < goal {
            // Most crowded first: fewest free docks, then lowest id
            let next = ledger
                .iter()
                .filter(|(id, _, _)| !visited.contains(id))
                .filter_map(|(id, count, capacity)| {
                    let take = crowded_surplus(count, capacity);
                    (take > 0).then_some((capacity - count, id, take))
                })
                .min();
            let Some((_, station, take)) = next else { break };

            ledger.remove_bikes(station, take)?;
            *pool += take as u64;
            report.drained_crowded.push((station, take));
        }
        Ok(())
    }

    fn distribute(
        &self,
        ledger: &mut OccupancyLedger,
        pool: &mut u64,
        needy: &[StationId],
        report: &mut RebalanceReport,
    ) -> EngineResult<()> {
        if *pool == 0 {
            return Ok(());
        }
        let even_share = (*pool / needy.len() as u64).max(1);

        for station in needy {
            if *pool == 0 {
                break;
            }
            let free = ledger.free_docks(*station).unwrap_or(0) as u64;
            let give = even_share.min(free).min(*pool) as u32;
            if give == 0 {
                continue;
            }
            ledger.add_bikes(*station, give)?;
            ledger.clear_empty(*station)?;
            *pool -= give as u64;
            report.supplied.push((*station, give));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{DockOutcome, Station, StationCatalog};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 4, 2, hour, 0, 0).unwrap()
    }

    fn ledger(stations: &[(u32, u32, u32)]) -> OccupancyLedger {
        let catalog =
            StationCatalog::new(stations.iter().map(|(id, capacity, _)| Station::new(*id, *capacity)));
        let counts: BTreeMap<StationId, u32> =
            stations.iter().map(|(id, _, count)| (StationId(*id), *count)).collect();
        OccupancyLedger::new(&catalog, &counts).unwrap()
    }

    fn policy() -> RebalancePolicy {
        RebalancePolicy::new(Duration::hours(1), 5)
    }

    #[test]
    fn test_pass_without_stale_stations_is_noop() {
        let mut ledger = ledger(&[(1, 10, 10), (2, 10, 0), (3, 10, 5)]);
        // Flag both stations, but only just now
        assert_eq!(ledger.apply_arrival(StationId(1), at(8)).unwrap(), DockOutcome::StationFull);
        assert_eq!(ledger.apply_departure(StationId(2), at(8)).unwrap(), DockOutcome::StationEmpty);
        let before = ledger.clone();
        let mut pool = 3;

        let report = policy().run(&mut ledger, &mut pool, at(8) + Duration::minutes(30)).unwrap();

        assert!(report.is_noop());
        assert_eq!(ledger, before);
        assert_eq!(pool, 3);
    }

    #[test]
    fn test_stale_full_station_gives_half_to_pool() {
        let mut ledger = ledger(&[(1, 9, 9), (2, 10, 4)]);
        ledger.apply_arrival(StationId(1), at(6)).unwrap();
        let mut pool = 0;

        let report = policy().run(&mut ledger, &mut pool, at(8)).unwrap();

        assert_eq!(report.drained_full, vec![(StationId(1), 4)]);
        assert_eq!(ledger.count(StationId(1)), Some(5));
        assert_eq!(pool, 4);
        assert_eq!(ledger.flagged_full(), 0);
        // Nobody is needy, so nothing else is drained
        assert!(report.drained_crowded.is_empty());
        assert_eq!(ledger.count(StationId(2)), Some(4));
    }

    #[test]
    fn test_needy_stations_drain_crowded_stations_in_order() {
        // Station 3 has the fewest free docks, then 2
        let mut ledger = ledger(&[(1, 10, 0), (2, 10, 7), (3, 10, 9), (4, 10, 3)]);
        ledger.apply_departure(StationId(1), at(6)).unwrap();
        let mut pool = 0;

        let report = policy().run(&mut ledger, &mut pool, at(8)).unwrap();

        // Goal is five bikes: 3 gives 4 (down to 5), 2 gives 2 (down to 5)
        assert_eq!(report.drained_crowded, vec![(StationId(3), 4), (StationId(2), 2)]);
        assert_eq!(ledger.count(StationId(4)), Some(3));
        // The only needy station takes the whole pool
        assert_eq!(report.supplied, vec![(StationId(1), 6)]);
        assert_eq!(pool, 0);
        assert_eq!(ledger.flagged_empty(), 0);
        assert_eq!(ledger.total_bikes(), 19);
    }

    #[test]
    fn test_crowded_station_is_never_drained_below_two() {
        let mut ledger = ledger(&[(1, 10, 0), (2, 10, 3), (3, 4, 2)]);
        ledger.apply_departure(StationId(1), at(6)).unwrap();
        let mut pool = 0;

        let report = policy().run(&mut ledger, &mut pool, at(8)).unwrap();

        assert_eq!(report.drained_crowded, vec![(StationId(2), 1)]);
        assert_eq!(ledger.count(StationId(2)), Some(2));
        assert_eq!(ledger.count(StationId(3)), Some(2));
        assert_eq!(report.supplied, vec![(StationId(1), 1)]);
    }

    #[test]
    fn test_crowded_station_is_drained_again_until_goal_or_floor() {
        let mut ledger = ledger(&[(1, 10, 0), (2, 10, 6)]);
        ledger.apply_departure(StationId(1), at(6)).unwrap();
        let mut pool = 0;

        let report = policy().run(&mut ledger, &mut pool, at(8)).unwrap();

        // 6 to half capacity is 5, then half of 5 is 2, then nothing is left to give
        assert_eq!(report.drained_crowded, vec![(StationId(2), 1), (StationId(2), 3)]);
        assert_eq!(ledger.count(StationId(2)), Some(2));
        assert_eq!(report.supplied, vec![(StationId(1), 4)]);
        assert_eq!(pool, 0);
    }

    #[test]
    fn test_crowded_surplus() {
        assert_eq!(crowded_surplus(9, 10), 4);
        assert_eq!(crowded_surplus(5, 10), 3);
        assert_eq!(crowded_surplus(3, 10), 1);
        assert_eq!(crowded_surplus(2, 10), 0);
        assert_eq!(crowded_surplus(0, 0), 0);
    }

    #[test]
    fn test_small_pool_serves_oldest_needy_stations_first() {
        let mut ledger = ledger(&[(1, 4, 0), (2, 4, 0), (3, 4, 0)]);
        ledger.apply_departure(StationId(3), at(4)).unwrap();
        ledger.apply_departure(StationId(1), at(5)).unwrap();
        ledger.apply_departure(StationId(2), at(6)).unwrap();
        let mut pool = 2;

        let report = policy().run(&mut ledger, &mut pool, at(8)).unwrap();

        // Fewer bikes than needy stations: one each until the pool runs dry
        assert!(report.drained_crowded.is_empty());
        assert_eq!(report.supplied, vec![(StationId(3), 1), (StationId(1), 1)]);
        assert_eq!(pool, 0);
        assert_eq!(ledger.count(StationId(2)), Some(0));
        assert_eq!(ledger.flagged_empty(), 1);
    }

    #[test]
    fn test_distribution_respects_free_docks_and_keeps_remainder() {
        let mut ledger = ledger(&[(1, 2, 0), (2, 20, 0), (3, 1, 1)]);
        ledger.apply_departure(StationId(1), at(5)).unwrap();
        ledger.apply_departure(StationId(2), at(6)).unwrap();
        let mut pool = 12;

        let report = RebalancePolicy::new(Duration::hours(1), 1).run(&mut ledger, &mut pool, at(8)).unwrap();

        // Even share is six; station 1 only has two docks
        assert_eq!(report.supplied, vec![(StationId(1), 2), (StationId(2), 6)]);
        assert_eq!(pool, 4);
        assert_eq!(report.pool_before, 12);
        assert_eq!(report.pool_after, 4);
    }

    #[test]
    fn test_pass_conserves_bikes() {
        let mut ledger = ledger(&[(1, 8, 8), (2, 8, 0), (3, 8, 6), (4, 8, 0), (5, 8, 7)]);
        ledger.apply_arrival(StationId(1), at(3)).unwrap();
        ledger.apply_departure(StationId(2), at(4)).unwrap();
        ledger.apply_departure(StationId(4), at(5)).unwrap();
        let mut pool = 1;
        let before = ledger.total_bikes() + pool;

        let report = policy().run(&mut ledger, &mut pool, at(9)).unwrap();

        assert_eq!(ledger.total_bikes() + pool, before);
        assert_eq!(
            report.pool_after,
            report.pool_before + report.bikes_removed() - report.bikes_delivered()
        );
        ledger.check_bounds().unwrap();
    }
}
