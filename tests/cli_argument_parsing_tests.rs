//! Tests for CLI argument parsing functionality
//!
//! These tests verify that command line arguments are properly parsed and
//! merged over the configuration file and the defaults.

use bikeshare_sim::analysis::SweepRange;
use bikeshare_sim::types::config::{CliArgs, SimulationConfig};
use bikeshare_sim::types::GeneratorKind;
use chrono::{TimeZone, Utc};
use clap::Parser;
use std::io::Write;

/// Test parsing with no arguments keeps every override unset
#[test]
fn test_default_arguments() {
    let cli_args = CliArgs::try_parse_from(["test"]).unwrap();

    assert!(cli_args.scenario.is_none());
    assert!(cli_args.generator.is_none());
    assert!(cli_args.sweep.is_none());
    assert!(!cli_args.no_rebalancing);
    assert!(!cli_args.json);

    let config = SimulationConfig::from_cli_args(cli_args).unwrap();
    assert_eq!(config, SimulationConfig::default());
}

/// Test parsing of the scenario, generator and seed arguments
#[test]
fn test_scenario_generator_and_seed_parsing() {
    let args = ["test", "--scenario", "network.json", "--generator", "inter-arrival", "--seed", "7"];
    let cli_args = CliArgs::try_parse_from(args).unwrap();

    assert_eq!(cli_args.scenario.as_deref(), Some("network.json"));
    assert_eq!(cli_args.generator, Some(GeneratorKind::InterArrival));
    assert_eq!(cli_args.seed, Some(7));

    // Short forms and aliases
    let cli_args = CliArgs::try_parse_from(["test", "-s", "other.json", "-g", "poisson"]).unwrap();
    assert_eq!(cli_args.scenario.as_deref(), Some("other.json"));
    assert_eq!(cli_args.generator, Some(GeneratorKind::CountBased));
}

/// Test that an unknown generator is rejected at parse time
#[test]
fn test_invalid_generator_argument() {
    assert!(CliArgs::try_parse_from(["test", "--generator", "random-walk"]).is_err());
}

/// Test parsing of the sweep range
#[test]
fn test_sweep_argument_parsing() {
    let cli_args = CliArgs::try_parse_from(["test", "--sweep", "100:2000:100"]).unwrap();
    assert_eq!(cli_args.sweep, Some(SweepRange { min: 100, max: 2000, step: 100 }));

    assert!(CliArgs::try_parse_from(["test", "--sweep", "100:2000"]).is_err());
    assert!(CliArgs::try_parse_from(["test", "--sweep", "100:2000:0"]).is_err());
    assert!(CliArgs::try_parse_from(["test", "--sweep", "2000:100:100"]).is_err());
}

/// Test parsing of the simulated window in both accepted formats
#[test]
fn test_window_argument_parsing() {
    let args = ["test", "--start", "2012-04-02 06:00:00", "--end", "2012-04-02T18:00:00Z", "--timestep-secs", "900"];
    let cli_args = CliArgs::try_parse_from(args).unwrap();
    let config = SimulationConfig::from_cli_args(cli_args).unwrap();

    assert_eq!(config.start_time, Utc.with_ymd_and_hms(2012, 4, 2, 6, 0, 0).unwrap());
    assert_eq!(config.end_time, Utc.with_ymd_and_hms(2012, 4, 2, 18, 0, 0).unwrap());
    assert_eq!(config.timestep_secs, 900);
    assert_eq!(config.tick_count(), 48);
    config.validate().unwrap();

    assert!(CliArgs::try_parse_from(["test", "--start", "yesterday"]).is_err());
}

/// Test that a reversed window parses but fails validation
#[test]
fn test_reversed_window_fails_validation() {
    let args = ["test", "--start", "2012-04-03 00:00:00", "--end", "2012-04-02 00:00:00"];
    let cli_args = CliArgs::try_parse_from(args).unwrap();
    let config = SimulationConfig::from_cli_args(cli_args).unwrap();
    assert!(config.validate().is_err());
}

/// Test the rebalancing and fleet arguments
#[test]
fn test_rebalancing_and_fleet_arguments() {
    let args = ["test", "--no-rebalancing", "--bike-total", "1500", "--rate-scale", "1.5"];
    let config = SimulationConfig::from_cli_args(CliArgs::try_parse_from(args).unwrap()).unwrap();

    assert!(!config.rebalancing);
    assert_eq!(config.bike_total, Some(1500));
    assert_eq!(config.rate_scale, 1.5);
    config.validate().unwrap();

    let args = ["test", "--rebalancing-time-secs", "0"];
    let config = SimulationConfig::from_cli_args(CliArgs::try_parse_from(args).unwrap()).unwrap();
    assert!(config.validate().is_err());
}

/// Test that CLI arguments take precedence over the configuration file
#[test]
fn test_cli_overrides_config_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"seed": 11, "generator": "baseline", "max_reroute_candidates": 3}}"#).unwrap();
    let path = file.path().to_str().unwrap();

    let args = ["test", "--config", path, "--seed", "42"];
    let config = SimulationConfig::from_cli_args(CliArgs::try_parse_from(args).unwrap()).unwrap();

    assert_eq!(config.seed, 42);
    assert_eq!(config.generator, GeneratorKind::Baseline);
    assert_eq!(config.max_reroute_candidates, 3);
    assert_eq!(config.timestep_secs, SimulationConfig::default().timestep_secs);
}

/// Test that a missing configuration file is reported
#[test]
fn test_missing_config_file() {
    let args = ["test", "--config", "/nonexistent/config.json"];
    let cli_args = CliArgs::try_parse_from(args).unwrap();
    assert!(SimulationConfig::from_cli_args(cli_args).is_err());
}

/// Test the flag arguments
#[test]
fn test_flag_arguments() {
    let args = ["test", "--json", "--verbose", "--dry-run", "--print-config"];
    let cli_args = CliArgs::try_parse_from(args).unwrap();

    assert!(cli_args.json);
    assert!(cli_args.verbose);
    assert!(cli_args.dry_run);
    assert!(cli_args.print_config);
    assert!(!cli_args.debug);
}
