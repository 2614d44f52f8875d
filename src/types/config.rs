//! Configuration structures for the bike-share simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the behavior and parameters of a simulation run.

use super::GeneratorKind;
use crate::analysis::SweepRange;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default values shared by the config file, the CLI and `Default`
pub mod defaults {
    /// Monday 2012-04-02 00:00:00 UTC
    pub const START_TIMESTAMP: i64 = 1_333_324_800;

    /// Tuesday 2012-04-03 00:00:00 UTC
    pub const END_TIMESTAMP: i64 = 1_333_411_200;

    /// One hour ticks
    pub const TIMESTEP_SECS: u64 = 3600;

    /// Seed used when none is given
    pub const SEED: u64 = 23526;

    /// A station must stay empty or full this long before trucks react
    pub const REBALANCING_TIME_SECS: u64 = 3600;

    /// Collect bikes until the pool holds this many per needy station
    pub const REBALANCE_POOL_FACTOR: u32 = 5;

    /// Nearest alternatives kept per station for rerouting
    pub const MAX_REROUTE_CANDIDATES: usize = 8;

    /// Upper bound for uniformly drawn trip durations
    pub const MAX_TRIP_MINUTES: u32 = 120;
}

/// Parse a timestamp given as RFC 3339 or as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("Invalid timestamp '{}': {}", value, e))
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bikeshare-sim",
    version = "0.1.0",
    about = "Bike-share simulator - replays rider demand against a dock-based network",
    long_about = "Simulates riders taking and returning bikes across a network of docking stations, tracking disappointed riders, rerouted returns and truck rebalancing.

EXAMPLES:
    # Run a scenario with default settings
    bikeshare-sim --scenario network.json

    # Use a configuration file
    bikeshare-sim --scenario network.json --config config.json

    # Override specific settings
    bikeshare-sim --scenario network.json --generator inter-arrival --seed 7

    # Sweep the fleet size and report profit per total
    bikeshare-sim --scenario network.json --sweep 100:2000:100

    # Generate configuration template
    bikeshare-sim --print-config > my-config.json

    # Validate configuration without running
    bikeshare-sim --scenario network.json --config my-config.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)

    Use --print-config to generate a template configuration file."
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Scenario file path (JSON format)
    #[arg(
        short,
        long,
        help = "Scenario file with stations and fitted distributions",
        long_help = "Path to a JSON scenario file describing the station catalog, capacity overrides, dropped stations, nearest-station rankings, initial occupancy and fitted distributions."
    )]
    pub scenario: Option<String>,

    /// Start of the simulated window
    #[arg(
        long,
        value_parser = parse_timestamp,
        help = "Simulation start (RFC 3339 or 'YYYY-MM-DD HH:MM:SS')"
    )]
    pub start: Option<DateTime<Utc>>,

    /// End of the simulated window
    #[arg(
        long,
        value_parser = parse_timestamp,
        help = "Simulation end (RFC 3339 or 'YYYY-MM-DD HH:MM:SS')"
    )]
    pub end: Option<DateTime<Utc>>,

    /// Tick length in seconds
    #[arg(
        long,
        help = "Tick length in seconds",
        long_help = "Length of one simulation tick in seconds. Must be greater than 0. Default: 3600"
    )]
    pub timestep_secs: Option<u64>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Trip generation strategy
    #[arg(
        short,
        long,
        help = "Trip generator (baseline, count-based, inter-arrival)",
        long_help = "Trip generation strategy. 'baseline' draws uniform counts and durations, 'count-based' draws Poisson counts from fitted rates, 'inter-arrival' runs one exponential stream per station. Default: count-based"
    )]
    pub generator: Option<GeneratorKind>,

    /// Disable truck rebalancing
    #[arg(long, help = "Disable truck rebalancing")]
    pub no_rebalancing: bool,

    /// Seconds a station must stay empty or full before rebalancing reacts
    #[arg(long, help = "Seconds before an empty or full station is rebalanced")]
    pub rebalancing_time_secs: Option<u64>,

    /// Total number of bikes to place at the start
    #[arg(
        long,
        help = "Total bikes placed at the start",
        long_help = "Total number of bikes in the system at the start of the run. Initial counts are scaled proportionally to reach this total."
    )]
    pub bike_total: Option<u32>,

    /// Multiplier applied to fitted departure rates
    #[arg(long, help = "Multiplier applied to fitted departure rates")]
    pub rate_scale: Option<f64>,

    /// Run a bike-count sweep instead of a single run
    #[arg(
        long,
        help = "Sweep fleet sizes MIN:MAX:STEP and report profit per total",
        long_help = "Runs one independent simulation per fleet size in MIN..=MAX (by STEP) in parallel and reports the cost breakdown of each, followed by a hill-climbed optimum."
    )]
    pub sweep: Option<SweepRange>,

    /// Print the run summary as JSON on stdout
    #[arg(long, help = "Print the run summary as JSON on stdout")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Start of the simulated window
    pub start_time: Option<DateTime<Utc>>,

    /// End of the simulated window
    pub end_time: Option<DateTime<Utc>>,

    /// Tick length in seconds
    pub timestep_secs: Option<u64>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Trip generation strategy
    pub generator: Option<GeneratorKind>,

    /// Whether truck rebalancing runs
    pub rebalancing: Option<bool>,

    /// Seconds before an empty or full station is rebalanced
    pub rebalancing_time_secs: Option<u64>,

    /// Pool target per needy station
    pub rebalance_pool_factor: Option<u32>,

    /// Nearest alternatives tried per failed return
    pub max_reroute_candidates: Option<usize>,

    /// Multiplier applied to fitted departure rates
    pub rate_scale: Option<f64>,

    /// Upper bound for uniformly drawn trip durations
    pub max_trip_minutes: Option<u32>,

    /// Share of generated trips taken by registered members (0.0-1.0)
    pub registered_rider_share: Option<f64>,

    /// Total number of bikes to place at the start
    pub bike_total: Option<u32>,
}

/// Configuration for a bike-share simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Start of the simulated window
    pub start_time: DateTime<Utc>,

    /// End of the simulated window
    pub end_time: DateTime<Utc>,

    /// Tick length in seconds
    pub timestep_secs: u64,

    /// Random seed; every draw in a run comes from a generator seeded with it
    pub seed: u64,

    /// Trip generation strategy
    pub generator: GeneratorKind,

    /// Whether truck rebalancing runs at the start of each tick
    pub rebalancing: bool,

    /// Seconds a station must stay empty or full before rebalancing reacts
    pub rebalancing_time_secs: u64,

    /// Bikes are collected until the pool holds this many per needy station
    pub rebalance_pool_factor: u32,

    /// Nearest alternatives tried per failed return
    pub max_reroute_candidates: usize,

    /// Multiplier applied to fitted departure rates
    pub rate_scale: f64,

    /// Upper bound for uniformly drawn trip durations
    pub max_trip_minutes: u32,

    /// Share of generated trips taken by registered members (0.0-1.0)
    pub registered_rider_share: f64,

    /// Total number of bikes to place at the start, if overriding the scenario
    pub bike_total: Option<u32>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// The window ends before it starts
    #[error("Simulation window ends ({end}) before it starts ({start})")]
    InvalidTimeWindow {
        /// Configured start
        start: DateTime<Utc>,
        /// Configured end
        end: DateTime<Utc>,
    },

    /// Tick length is invalid
    #[error("Timestep must be greater than 0 seconds, got {0}")]
    InvalidTimestep(u64),

    /// Rebalancing threshold is invalid
    #[error("Rebalancing time must be greater than 0 seconds when rebalancing is enabled, got {0}")]
    InvalidRebalancingTime(u64),

    /// Pool factor is invalid
    #[error("Rebalance pool factor must be greater than 0, got {0}")]
    InvalidPoolFactor(u32),

    /// Reroute bound is invalid
    #[error("Reroute candidate limit must be greater than 0, got {0}")]
    InvalidRerouteLimit(usize),

    /// Rate scale is invalid
    #[error("Rate scale must be a positive finite number, got {0}")]
    InvalidRateScale(f64),

    /// Trip length bound is invalid
    #[error("Maximum trip length must be greater than 0 minutes, got {0}")]
    InvalidTripLength(u32),

    /// Percentage value is out of range
    #[error("Invalid percentage for {field}: {value} (must be between 0.0 and 1.0)")]
    InvalidPercentage {
        /// Name of the field with invalid percentage
        field: String,
        /// The invalid percentage value
        value: f64,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: Utc
                .timestamp_opt(defaults::START_TIMESTAMP, 0)
                .single()
                .unwrap_or_default(),
            end_time: Utc.timestamp_opt(defaults::END_TIMESTAMP, 0).single().unwrap_or_default(),
            timestep_secs: defaults::TIMESTEP_SECS,
            seed: defaults::SEED,
            generator: GeneratorKind::CountBased,
            rebalancing: true,
            rebalancing_time_secs: defaults::REBALANCING_TIME_SECS,
            rebalance_pool_factor: defaults::REBALANCE_POOL_FACTOR,
            max_reroute_candidates: defaults::MAX_REROUTE_CANDIDATES,
            rate_scale: 1.0,
            max_trip_minutes: defaults::MAX_TRIP_MINUTES,
            registered_rider_share: 0.0,
            bike_total: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file, merging it over the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            start_time: config_file.start_time.unwrap_or(defaults.start_time),
            end_time: config_file.end_time.unwrap_or(defaults.end_time),
            timestep_secs: config_file.timestep_secs.unwrap_or(defaults.timestep_secs),
            seed: config_file.seed.unwrap_or(defaults.seed),
            generator: config_file.generator.unwrap_or(defaults.generator),
            rebalancing: config_file.rebalancing.unwrap_or(defaults.rebalancing),
            rebalancing_time_secs: config_file
                .rebalancing_time_secs
                .unwrap_or(defaults.rebalancing_time_secs),
            rebalance_pool_factor: config_file
                .rebalance_pool_factor
                .unwrap_or(defaults.rebalance_pool_factor),
            max_reroute_candidates: config_file
                .max_reroute_candidates
                .unwrap_or(defaults.max_reroute_candidates),
            rate_scale: config_file.rate_scale.unwrap_or(defaults.rate_scale),
            max_trip_minutes: config_file.max_trip_minutes.unwrap_or(defaults.max_trip_minutes),
            registered_rider_share: config_file
                .registered_rider_share
                .unwrap_or(defaults.registered_rider_share),
            bike_total: config_file.bike_total.or(defaults.bike_total),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.start {
            config.start_time = value;
        }
        if let Some(value) = args.end {
            config.end_time = value;
        }
        if let Some(value) = args.timestep_secs {
            config.timestep_secs = value;
        }
        if let Some(value) = args.seed {
            config.seed = value;
        }
        if let Some(value) = args.generator {
            config.generator = value;
        }
        if args.no_rebalancing {
            config.rebalancing = false;
        }
        if let Some(value) = args.rebalancing_time_secs {
            config.rebalancing_time_secs = value;
        }
        if let Some(value) = args.bike_total {
            config.bike_total = Some(value);
        }
        if let Some(value) = args.rate_scale {
            config.rate_scale = value;
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        // A zero-length window is a valid, empty run
        if self.end_time < self.start_time {
            return Err(ConfigValidationError::InvalidTimeWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }

        if self.timestep_secs == 0 {
            return Err(ConfigValidationError::InvalidTimestep(self.timestep_secs));
        }

        if self.rebalancing && self.rebalancing_time_secs == 0 {
            return Err(ConfigValidationError::InvalidRebalancingTime(self.rebalancing_time_secs));
        }

        if self.rebalance_pool_factor == 0 {
            return Err(ConfigValidationError::InvalidPoolFactor(self.rebalance_pool_factor));
        }

        if self.max_reroute_candidates == 0 {
            return Err(ConfigValidationError::InvalidRerouteLimit(self.max_reroute_candidates));
        }

        if !self.rate_scale.is_finite() || self.rate_scale <= 0.0 {
            return Err(ConfigValidationError::InvalidRateScale(self.rate_scale));
        }

        if self.max_trip_minutes == 0 {
            return Err(ConfigValidationError::InvalidTripLength(self.max_trip_minutes));
        }

        self.validate_percentage("registered_rider_share", self.registered_rider_share)?;

        Ok(())
    }

    /// Helper method to validate percentage values
    fn validate_percentage(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigValidationError::InvalidPercentage {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Tick length as a duration
    pub fn timestep(&self) -> Duration {
        Duration::seconds(self.timestep_secs as i64)
    }

    /// How long a station must stay empty or full before rebalancing reacts
    pub fn rebalancing_threshold(&self) -> Duration {
        Duration::seconds(self.rebalancing_time_secs as i64)
    }

    /// Upper bound for uniformly drawn trip durations
    pub fn max_trip_duration(&self) -> Duration {
        Duration::minutes(self.max_trip_minutes as i64)
    }

    /// Number of ticks a run over the configured window executes
    pub fn tick_count(&self) -> u64 {
        let window = (self.end_time - self.start_time).num_seconds().max(0) as u64;
        if self.timestep_secs == 0 {
            return 0;
        }
        window.div_ceil(self.timestep_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.start_time.to_rfc3339(), "2012-04-02T00:00:00+00:00");
        assert_eq!(config.end_time.to_rfc3339(), "2012-04-03T00:00:00+00:00");
        assert_eq!(config.timestep_secs, 3600);
        assert_eq!(config.seed, 23526);
        assert_eq!(config.generator, GeneratorKind::CountBased);
        assert!(config.rebalancing);
        assert_eq!(config.rebalancing_time_secs, 3600);
        assert_eq!(config.rebalance_pool_factor, 5);
        assert_eq!(config.max_reroute_candidates, 8);
        assert_eq!(config.rate_scale, 1.0);
        assert!(config.bike_total.is_none());
        assert_eq!(config.tick_count(), 24);
    }

    #[test]
    fn test_simulation_config_validation_success() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_length_window_is_valid() {
        let mut config = SimulationConfig::default();
        config.end_time = config.start_time;
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_count(), 0);
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let mut config = SimulationConfig::default();
        config.end_time = config.start_time - Duration::hours(1);
        match config.validate() {
            Err(ConfigValidationError::InvalidTimeWindow { .. }) => {}
            _ => panic!("Expected InvalidTimeWindow error"),
        }
    }

    #[test]
    fn test_zero_timestep_is_rejected() {
        let config = SimulationConfig { timestep_secs: 0, ..Default::default() };
        match config.validate() {
            Err(ConfigValidationError::InvalidTimestep(0)) => {}
            _ => panic!("Expected InvalidTimestep error"),
        }
    }

    #[test]
    fn test_rebalancing_threshold_only_checked_when_enabled() {
        let mut config = SimulationConfig { rebalancing_time_secs: 0, ..Default::default() };
        assert!(config.validate().is_err());

        config.rebalancing = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_scale_validation() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig { rate_scale: bad, ..Default::default() };
            match config.validate() {
                Err(ConfigValidationError::InvalidRateScale(_)) => {}
                _ => panic!("Expected InvalidRateScale error for {}", bad),
            }
        }
    }

    #[test]
    fn test_simulation_config_validation_percentage() {
        let config = SimulationConfig { registered_rider_share: 1.5, ..Default::default() };
        match config.validate() {
            Err(ConfigValidationError::InvalidPercentage { field, .. }) => {
                assert_eq!(field, "registered_rider_share");
            }
            _ => panic!("Expected InvalidPercentage error"),
        }
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "start_time": "2012-06-04T06:00:00Z",
            "timestep_secs": 900,
            "generator": "inter-arrival",
            "rebalancing": false
        }"#;
        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SimulationConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.start_time.to_rfc3339(), "2012-06-04T06:00:00+00:00");
        assert_eq!(config.timestep_secs, 900);
        assert_eq!(config.generator, GeneratorKind::InterArrival);
        assert!(!config.rebalancing);
        // Untouched fields keep their defaults
        assert_eq!(config.seed, defaults::SEED);
        assert_eq!(config.max_reroute_candidates, defaults::MAX_REROUTE_CANDIDATES);
    }

    #[test]
    fn test_config_file_errors() {
        use tempfile::Builder;

        match SimulationConfig::from_file("/definitely/not/here.json") {
            Err(ConfigError::FileNotFound(_)) => {}
            _ => panic!("Expected FileNotFound error"),
        }

        let temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        match SimulationConfig::from_file(temp_file.path()) {
            Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
            _ => panic!("Expected UnsupportedFormat error"),
        }
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "test",
            "--start",
            "2012-05-01 08:00:00",
            "--end",
            "2012-05-01T12:00:00Z",
            "--timestep-secs",
            "600",
            "--seed",
            "99",
            "--generator",
            "baseline",
            "--no-rebalancing",
            "--bike-total",
            "1200",
        ])
        .unwrap();

        let config = SimulationConfig::from_cli_args(args).unwrap();
        assert_eq!(config.start_time.to_rfc3339(), "2012-05-01T08:00:00+00:00");
        assert_eq!(config.end_time.to_rfc3339(), "2012-05-01T12:00:00+00:00");
        assert_eq!(config.timestep_secs, 600);
        assert_eq!(config.seed, 99);
        assert_eq!(config.generator, GeneratorKind::Baseline);
        assert!(!config.rebalancing);
        assert_eq!(config.bike_total, Some(1200));
        assert_eq!(config.tick_count(), 24);
    }

    #[test]
    fn test_cli_without_flags_uses_defaults() {
        let config = SimulationConfig::from_cli_args(base_args()).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_invalid_timestamp_is_rejected_by_parser() {
        assert!(CliArgs::try_parse_from(["test", "--start", "yesterday"]).is_err());
        assert!(parse_timestamp("2012-04-02T00:00:00+02:00").is_ok());
    }

    #[test]
    fn test_simulation_config_serialization() {
        let config = SimulationConfig::default();
        let json = config.print_json().unwrap();
        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_save_to_file_round_trips_through_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let config = SimulationConfig { seed: 5, bike_total: Some(40), ..Default::default() };

        config.save_to_file(&path).unwrap();
        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
