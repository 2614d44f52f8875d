//! Fitted demand distributions
//!
//! Trip generation reads three kinds of fitted data:
//!
//! - a departure rate per station, hour of day and weekday flag, optionally
//!   specific to a year and month
//! - a gamma duration model per origin/destination pair
//! - a destination probability vector per station, hour and weekday flag
//!
//! [`FittedDistributions`] holds them in composite-key hash tables loaded once
//! for a run window. Generators only see the [`DistributionProvider`] trait.

pub mod sampling;

pub use sampling::*;

use crate::network::StationCatalog;
use crate::types::StationId;
use chrono::{DateTime, Datelike, Duration, DurationRound, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::info;

/// Calendar bucket used to key fitted data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    /// Hour of day, 0-23
    pub hour: u8,
    /// Monday to Friday
    pub is_weekday: bool,
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
}

impl TimeSlot {
    /// Slot containing the given instant
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            hour: time.hour() as u8,
            is_weekday: !matches!(time.weekday(), Weekday::Sat | Weekday::Sun),
            year: time.year(),
            month: time.month(),
        }
    }

    /// Every distinct slot touched by `[start, end]`, at least the start slot
    pub fn covering(start: DateTime<Utc>, end: DateTime<Utc>) -> HashSet<TimeSlot> {
        let mut slots = HashSet::new();
        let mut cursor = start.duration_trunc(Duration::hours(1)).unwrap_or(start);
        slots.insert(TimeSlot::at(start));
        while cursor <= end {
            slots.insert(TimeSlot::at(cursor));
            cursor += Duration::hours(1);
        }
        slots
    }
}

/// Source of fitted rates, durations and destinations
pub trait DistributionProvider: Send + Sync + fmt::Debug {
    /// Expected departures per hour from `origin` during `slot`
    fn departure_rate(&self, origin: StationId, slot: &TimeSlot) -> Option<f64>;

    /// Duration model for a trip from `origin` to `destination`
    fn trip_duration(&self, origin: StationId, destination: StationId) -> Option<DurationModel>;

    /// Destination probabilities for trips leaving `origin` during `slot`
    fn destinations(&self, origin: StationId, slot: &TimeSlot) -> Option<&DestinationDistribution>;

    /// Whether data was loaded for the whole of `[start, end]`
    fn covers(&self, _start: DateTime<Utc>, _end: DateTime<Utc>) -> bool {
        true
    }
}

/// One fitted departure rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Origin station
    pub station: StationId,
    /// Hour of day, 0-23
    pub hour: u8,
    /// Whether the rate applies Monday to Friday
    pub is_weekday: bool,
    /// Year the rate was fitted for; absent for all years
    #[serde(default)]
    pub year: Option<i32>,
    /// Month the rate was fitted for; absent for all months
    #[serde(default)]
    pub month: Option<u32>,
    /// Departures per hour
    pub rate: f64,
}

/// One fitted trip duration model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRecord {
    /// Origin station
    pub origin: StationId,
    /// Destination station
    pub destination: StationId,
    /// Gamma shape
    pub shape: f64,
    /// Gamma scale in seconds
    pub scale: f64,
}

/// One destination weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    /// Origin station
    pub origin: StationId,
    /// Hour of day, 0-23
    pub hour: u8,
    /// Whether the weight applies Monday to Friday
    pub is_weekday: bool,
    /// Destination station
    pub destination: StationId,
    /// Relative probability
    pub probability: f64,
}

/// All fitted records as stored in a scenario file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecords {
    /// Departure rates
    #[serde(default)]
    pub rates: Vec<RateRecord>,
    /// Duration models
    #[serde(default)]
    pub durations: Vec<DurationRecord>,
    /// Destination weights
    #[serde(default)]
    pub destinations: Vec<DestinationRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RateKey {
    station: StationId,
    hour: u8,
    is_weekday: bool,
    period: Option<(i32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    station: StationId,
    hour: u8,
    is_weekday: bool,
}

/// Fitted distributions restricted to one run window and station set
#[derive(Debug, Clone, Default)]
pub struct FittedDistributions {
    rates: HashMap<RateKey, f64>,
    durations: HashMap<(StationId, StationId), DurationModel>,
    destinations: HashMap<SlotKey, DestinationDistribution>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl FittedDistributions {
    /// Keep the records relevant to `[start, end]` and to stations in `catalog`
    ///
    /// Destination weights pointing at stations outside the catalog are
    /// removed and the remaining weights renormalised.
    pub fn load(
        records: &DistributionRecords,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        catalog: &StationCatalog,
    ) -> Self {
        let slots = TimeSlot::covering(start, end);
        let hours: HashSet<(u8, bool)> =
            slots.iter().map(|slot| (slot.hour, slot.is_weekday)).collect();
        let periods: HashSet<(i32, u32)> = slots.iter().map(|slot| (slot.year, slot.month)).collect();

        let rates: HashMap<RateKey, f64> = records
            .rates
            .iter()
            .filter(|record| catalog.contains(record.station))
            .filter(|record| hours.contains(&(record.hour, record.is_weekday)))
            .filter_map(|record| {
                let period = match (record.year, record.month) {
                    (Some(year), Some(month)) => Some((year, month)),
                    _ => None,
                };
                if matches!(period, Some(p) if !periods.contains(&p)) {
                    return None;
                }
                let key = RateKey {
                    station: record.station,
                    hour: record.hour,
                    is_weekday: record.is_weekday,
                    period,
                };
                Some((key, record.rate))
            })
            .collect();

        let durations: HashMap<(StationId, StationId), DurationModel> = records
            .durations
            .iter()
            .filter(|record| catalog.contains(record.origin) && catalog.contains(record.destination))
            .map(|record| {
                ((record.origin, record.destination), DurationModel::new(record.shape, record.scale))
            })
            .collect();

        let mut weights: HashMap<SlotKey, Vec<(StationId, f64)>> = HashMap::new();
        for record in &records.destinations {
            if !catalog.contains(record.origin)
                || !catalog.contains(record.destination)
                || !hours.contains(&(record.hour, record.is_weekday))
            {
                continue;
            }
            let key =
                SlotKey { station: record.origin, hour: record.hour, is_weekday: record.is_weekday };
            weights.entry(key).or_default().push((record.destination, record.probability));
        }
        let destinations: HashMap<SlotKey, DestinationDistribution> = weights
            .into_iter()
            .filter_map(|(key, mut pairs)| {
                pairs.sort_by_key(|(station, _)| *station);
                DestinationDistribution::from_weights(pairs).map(|distribution| (key, distribution))
            })
            .collect();

        info!(
            rates = rates.len(),
            durations = durations.len(),
            destinations = destinations.len(),
            "Loaded fitted distributions for run window"
        );

        Self { rates, durations, destinations, window: Some((start, end)) }
    }

    /// Number of rate entries held
    pub fn rate_count(&self) -> usize {
        self.rates.len()
    }

    /// Number of duration models held
    pub fn duration_count(&self) -> usize {
        self.durations.len()
    }

    /// Number of destination vectors held
    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// Window the records were loaded for, if any
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window
    }
}

impl DistributionProvider for FittedDistributions {
    fn departure_rate(&self, origin: StationId, slot: &TimeSlot) -> Option<f64> {
        let mut key = RateKey {
            station: origin,
            hour: slot.hour,
            is_weekday: slot.is_weekday,
            period: Some((slot.year, slot.month)),
        };
        if let Some(rate) = self.rates.get(&key) {
            return Some(*rate);
        }
        key.period = None;
        self.rates.get(&key).copied()
    }

    fn trip_duration(&self, origin: StationId, destination: StationId) -> Option<DurationModel> {
        self.durations.get(&(origin, destination)).copied()
    }

    fn destinations(&self, origin: StationId, slot: &TimeSlot) -> Option<&DestinationDistribution> {
        self.destinations.get(&SlotKey {
            station: origin,
            hour: slot.hour,
            is_weekday: slot.is_weekday,
        })
    }

    fn covers(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.window {
            Some((loaded_start, loaded_end)) => start >= loaded_start && end <= loaded_end,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Station;
    use chrono::TimeZone;

    fn monday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 4, 2, hour, 0, 0).unwrap()
    }

    fn catalog() -> StationCatalog {
        StationCatalog::new([Station::new(1, 10), Station::new(2, 10)])
    }

    fn rate(station: u32, hour: u8, is_weekday: bool, period: Option<(i32, u32)>, rate: f64) -> RateRecord {
        RateRecord {
            station: StationId(station),
            hour,
            is_weekday,
            year: period.map(|(year, _)| year),
            month: period.map(|(_, month)| month),
            rate,
        }
    }

    #[test]
    fn test_time_slot_classification() {
        let slot = TimeSlot::at(monday(8));
        assert_eq!(slot.hour, 8);
        assert!(slot.is_weekday);
        assert_eq!((slot.year, slot.month), (2012, 4));

        let saturday = Utc.with_ymd_and_hms(2012, 4, 7, 23, 30, 0).unwrap();
        assert!(!TimeSlot::at(saturday).is_weekday);
    }

    #[test]
    fn test_covering_includes_partial_hours() {
        let start = Utc.with_ymd_and_hms(2012, 4, 2, 8, 30, 0).unwrap();
        let slots = TimeSlot::covering(start, start);
        assert_eq!(slots.len(), 1);

        let slots = TimeSlot::covering(start, monday(10));
        let hours: HashSet<u8> = slots.iter().map(|slot| slot.hour).collect();
        assert_eq!(hours, HashSet::from([8, 9, 10]));
    }

    #[test]
    fn test_rate_lookup_prefers_period_specific_entry() {
        let records = DistributionRecords {
            rates: vec![rate(1, 8, true, None, 2.0), rate(1, 8, true, Some((2012, 4)), 5.0)],
            ..Default::default()
        };
        let fitted = FittedDistributions::load(&records, monday(8), monday(9), &catalog());

        assert_eq!(fitted.departure_rate(StationId(1), &TimeSlot::at(monday(8))), Some(5.0));

        let may = TimeSlot { month: 5, ..TimeSlot::at(monday(8)) };
        assert_eq!(fitted.departure_rate(StationId(1), &may), Some(2.0));
        assert_eq!(fitted.departure_rate(StationId(2), &may), None);
    }

    #[test]
    fn test_load_filters_to_window_and_catalog() {
        let records = DistributionRecords {
            rates: vec![
                rate(1, 8, true, None, 1.0),
                rate(1, 20, true, None, 1.0),
                rate(1, 8, false, None, 1.0),
                rate(1, 8, true, Some((2011, 4)), 1.0),
                rate(9, 8, true, None, 1.0),
            ],
            durations: vec![
                DurationRecord { origin: StationId(1), destination: StationId(2), shape: 2.0, scale: 300.0 },
                DurationRecord { origin: StationId(1), destination: StationId(9), shape: 2.0, scale: 300.0 },
            ],
            ..Default::default()
        };
        let fitted = FittedDistributions::load(&records, monday(8), monday(8), &catalog());

        assert_eq!(fitted.rate_count(), 1);
        assert_eq!(fitted.duration_count(), 1);
        assert_eq!(
            fitted.trip_duration(StationId(1), StationId(2)),
            Some(DurationModel::new(2.0, 300.0))
        );
    }

    #[test]
    fn test_destinations_drop_unknown_stations_and_renormalise() {
        let destination = |to: u32, probability: f64| DestinationRecord {
            origin: StationId(1),
            hour: 8,
            is_weekday: true,
            destination: StationId(to),
            probability,
        };
        let records = DistributionRecords {
            destinations: vec![destination(2, 0.2), destination(9, 0.8)],
            ..Default::default()
        };
        let fitted = FittedDistributions::load(&records, monday(8), monday(8), &catalog());

        let distribution = fitted.destinations(StationId(1), &TimeSlot::at(monday(8))).unwrap();
        assert_eq!(distribution.stations(), &[StationId(2)]);
        assert!((distribution.probability(StationId(2)) - 1.0).abs() < 1e-9);
        assert!(fitted.destinations(StationId(1), &TimeSlot::at(monday(9))).is_none());
    }

    #[test]
    fn test_covers_only_the_loaded_window() {
        let fitted = FittedDistributions::load(&DistributionRecords::default(), monday(6), monday(12), &catalog());

        assert_eq!(fitted.window(), Some((monday(6), monday(12))));
        assert!(fitted.covers(monday(6), monday(12)));
        assert!(fitted.covers(monday(8), monday(9)));
        assert!(!fitted.covers(monday(5), monday(9)));
        assert!(!fitted.covers(monday(8), monday(13)));

        // Nothing loaded means nothing to fall outside of
        assert!(FittedDistributions::default().covers(monday(0), monday(23)));
    }
}
