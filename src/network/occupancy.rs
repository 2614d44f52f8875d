//! Occupancy ledger
//!
//! Tracks the bike count of every station together with the time each station
//! was first seen empty or full. Every mutation keeps `0 <= count <= capacity`;
//! a mutation that would leave those bounds is rejected.

use super::StationCatalog;
use crate::simulation::{EngineResult, SimulationError};
use crate::types::{StationCondition, StationId};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of asking a station to release or accept a bike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockOutcome {
    /// The count changed by one
    Applied,
    /// No bike to release
    StationEmpty,
    /// No free dock to accept the bike
    StationFull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    count: u32,
    capacity: u32,
    empty_since: Option<DateTime<Utc>>,
    full_since: Option<DateTime<Utc>>,
}

impl Slot {
    /// Drop flags the count has moved away from
    fn settle(&mut self) {
        if self.count > 0 {
            self.empty_since = None;
        }
        if self.count < self.capacity {
            self.full_since = None;
        }
    }
}

/// Bike counts and empty/full onsets for every station in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyLedger {
    slots: BTreeMap<StationId, Slot>,
}

impl OccupancyLedger {
    /// Ledger for every catalog station; stations missing from `counts` start empty
    pub fn new(catalog: &StationCatalog, counts: &BTreeMap<StationId, u32>) -> EngineResult<Self> {
        for (id, count) in counts {
            let capacity = catalog.capacity(*id).ok_or(SimulationError::UnknownStation(*id))?;
            if *count > capacity {
                return Err(SimulationError::configuration_error(format!(
                    "Initial count {} at {} exceeds capacity {}",
                    count, id, capacity
                )));
            }
        }

        let slots = catalog
            .iter()
            .map(|station| {
                let slot = Slot {
                    count: counts.get(&station.id).copied().unwrap_or(0),
                    capacity: station.capacity,
                    empty_since: None,
                    full_since: None,
                };
                (station.id, slot)
            })
            .collect();

        Ok(Self { slots })
    }

    fn slot(&self, id: StationId) -> EngineResult<&Slot> {
        self.slots.get(&id).ok_or(SimulationError::UnknownStation(id))
    }

    fn slot_mut(&mut self, id: StationId) -> EngineResult<&mut Slot> {
        self.slots.get_mut(&id).ok_or(SimulationError::UnknownStation(id))
    }

    /// Current count of a station
    pub fn count(&self, id: StationId) -> Option<u32> {
        self.slots.get(&id).map(|slot| slot.count)
    }

    /// Capacity of a station
    pub fn capacity(&self, id: StationId) -> Option<u32> {
        self.slots.get(&id).map(|slot| slot.capacity)
    }

    /// Free docks at a station
    pub fn free_docks(&self, id: StationId) -> Option<u32> {
        self.slots.get(&id).map(|slot| slot.capacity - slot.count)
    }

    /// Release a bike at `station`
    ///
    /// An empty station is flagged with `at` as its onset unless already flagged.
    pub fn apply_departure(&mut self, station: StationId, at: DateTime<Utc>) -> EngineResult<DockOutcome> {
        let slot = self.slot_mut(station)?;
        if slot.count == 0 {
            slot.empty_since.get_or_insert(at);
            debug!(%station, "Departure refused, station empty");
            return Ok(DockOutcome::StationEmpty);
        }
        slot.count -= 1;
        slot.settle();
        Ok(DockOutcome::Applied)
    }

    /// Dock a bike at `station`
    ///
    /// A station left without free docks, or refusing a bike, is flagged full
    /// with `at` as its onset unless already flagged.
    pub fn apply_arrival(&mut self, station: StationId, at: DateTime<Utc>) -> EngineResult<DockOutcome> {
        let slot = self.slot_mut(station)?;
        if slot.count >= slot.capacity {
            slot.full_since.get_or_insert(at);
            debug!(%station, "Arrival refused, station full");
            return Ok(DockOutcome::StationFull);
        }
        slot.count += 1;
        slot.settle();
        if slot.count == slot.capacity {
            slot.full_since.get_or_insert(at);
        }
        Ok(DockOutcome::Applied)
    }

    /// Take `bikes` out of a station for rebalancing
    pub fn remove_bikes(&mut self, station: StationId, bikes: u32) -> EngineResult<()> {
        let slot = self.slot_mut(station)?;
        if bikes > slot.count {
            return Err(SimulationError::invariant_violation(format!(
                "Removing {} bikes from {} holding {}",
                bikes, station, slot.count
            )));
        }
        slot.count -= bikes;
        slot.settle();
        Ok(())
    }

    /// Put `bikes` into a station for rebalancing
    pub fn add_bikes(&mut self, station: StationId, bikes: u32) -> EngineResult<()> {
        let slot = self.slot_mut(station)?;
        let free = slot.capacity - slot.count;
        if bikes > free {
            return Err(SimulationError::invariant_violation(format!(
                "Adding {} bikes to {} with {} free docks",
                bikes, station, free
            )));
        }
        slot.count += bikes;
        slot.settle();
        Ok(())
    }

    /// Forget the full onset of a station
    pub fn clear_full(&mut self, station: StationId) -> EngineResult<()> {
        self.slot_mut(station)?.full_since = None;
        Ok(())
    }

    /// Forget the empty onset of a station
    pub fn clear_empty(&mut self, station: StationId) -> EngineResult<()> {
        self.slot_mut(station)?.empty_since = None;
        Ok(())
    }

    /// Empty/full condition of a station
    pub fn condition(&self, station: StationId) -> EngineResult<StationCondition> {
        let slot = self.slot(station)?;
        Ok(match (slot.empty_since, slot.full_since) {
            (Some(since), _) => StationCondition::Empty(since),
            (None, Some(since)) => StationCondition::Full(since),
            (None, None) => StationCondition::Normal,
        })
    }

    fn stale(
        &self,
        onset: impl Fn(&Slot) -> Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Vec<StationId> {
        let mut stale: Vec<(DateTime<Utc>, StationId)> = self
            .slots
            .iter()
            .filter_map(|(id, slot)| onset(slot).map(|since| (since, *id)))
            .filter(|(since, _)| now - *since >= threshold)
            .collect();
        stale.sort();
        stale.into_iter().map(|(_, id)| id).collect()
    }

    /// Stations flagged full for at least `threshold`, oldest onset first
    pub fn stale_full(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<StationId> {
        self.stale(|slot| slot.full_since, now, threshold)
    }

    /// Stations flagged empty for at least `threshold`, oldest onset first
    pub fn stale_empty(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<StationId> {
        self.stale(|slot| slot.empty_since, now, threshold)
    }

    /// Number of stations currently flagged empty
    pub fn flagged_empty(&self) -> usize {
        self.slots.values().filter(|slot| slot.empty_since.is_some()).count()
    }

    /// Number of stations currently flagged full
    pub fn flagged_full(&self) -> usize {
        self.slots.values().filter(|slot| slot.full_since.is_some()).count()
    }

    /// `(station, count, capacity)` in station order
    pub fn iter(&self) -> impl Iterator<Item = (StationId, u32, u32)> + '_ {
        self.slots.iter().map(|(id, slot)| (*id, slot.count, slot.capacity))
    }

    /// Bikes docked across the network
    pub fn total_bikes(&self) -> u64 {
        self.slots.values().map(|slot| slot.count as u64).sum()
    }

    /// Copy of every station's count
    pub fn snapshot(&self) -> BTreeMap<StationId, u32> {
        self.slots.iter().map(|(id, slot)| (*id, slot.count)).collect()
    }

    /// Verify every count is within its capacity
    pub fn check_bounds(&self) -> EngineResult<()> {
        match self.slots.iter().find(|(_, slot)| slot.count > slot.capacity) {
            Some((id, slot)) => Err(SimulationError::invariant_violation(format!(
                "{} holds {} bikes with capacity {}",
                id, slot.count, slot.capacity
            ))),
            None => Ok(()),
        }
    }
}
