// Bike-Share Network Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/bikeshare-sim --scenario network.json
// ```
//
// Or with a fleet-size sweep:
//
// ```console
// $ ./target/release/bikeshare-sim --scenario network.json --sweep 100:2000:100 --verbose
// ```

use anyhow::{bail, Context};
use bikeshare_sim::analysis::{
    optimize_bike_total, sweep_bike_totals, CostModel, OptimizerSettings, SweepPoint, SweepRange,
};
use bikeshare_sim::scenario::ScenarioFile;
use bikeshare_sim::simulation::{LoggingConfig, Simulation, SimulationResult};
use bikeshare_sim::types::config::CliArgs;
use bikeshare_sim::types::SimulationConfig;
use clap::Parser;
use std::process;
use std::time::Instant;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        let default_config = SimulationConfig::default();
        match default_config.print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // Initialize logging based on CLI flags
    let logging_result = if args.debug {
        LoggingConfig::init_debug()
    } else if args.verbose {
        LoggingConfig::init_verbose()
    } else {
        LoggingConfig::new().with_level(tracing::Level::WARN).init()
    };

    if let Err(e) = logging_result {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Starting bike-share simulator");

    // Load configuration from CLI arguments and optional config file
    let config = match SimulationConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    let simulation = match load_simulation(args.scenario.as_deref(), &config) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("Failed to load scenario: {:#}", e);
            process::exit(1);
        }
    };

    info!("Configuration and scenario loaded successfully");

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config, &simulation);
        return;
    }

    print_configuration_summary(&config, &simulation);

    let outcome = match args.sweep {
        Some(range) => run_sweep(&simulation, range, args.json),
        None => run_single(&simulation, args.json),
    };

    if let Err(e) = outcome {
        error!("Simulation failed: {:#}", e);
        process::exit(1);
    }

    info!("Bike-share simulator completed successfully");
}

/// Build the simulation described by the scenario file
fn load_simulation(scenario: Option<&str>, config: &SimulationConfig) -> anyhow::Result<Simulation> {
    let Some(path) = scenario else {
        bail!("No scenario given, pass one with --scenario");
    };
    let scenario = ScenarioFile::from_file(path).with_context(|| format!("Reading scenario '{}'", path))?;
    let simulation = scenario
        .into_simulation(config)
        .with_context(|| format!("Building simulation from '{}'", path))?;
    Ok(simulation)
}

/// Run the configured window once and report it
fn run_single(simulation: &Simulation, json: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    let result = simulation.run_configured().context("Simulation run aborted")?;
    let elapsed = started.elapsed();

    print_result(&result, elapsed);
    if json {
        let summary = serde_json::to_string_pretty(&result.summary()).context("Serializing run summary")?;
        println!("{}", summary);
    }
    Ok(())
}

/// Sweep fleet sizes, then climb from the most profitable one
fn run_sweep(simulation: &Simulation, range: SweepRange, json: bool) -> anyhow::Result<()> {
    let model = CostModel::default();
    let started = Instant::now();

    eprintln!("Sweeping fleet sizes {}...", range);
    let points = sweep_bike_totals(simulation, range, &model).context("Fleet-size sweep aborted")?;
    print_sweep(&points);

    let Some(best) = points.iter().max_by(|a, b| a.profit().total_cmp(&b.profit())) else {
        bail!("Sweep range {} contains no fleet sizes", range);
    };

    eprintln!("Refining around {} bikes...", best.bike_total);
    let optimum = optimize_bike_total(simulation, best.bike_total, &model, OptimizerSettings::default())
        .context("Fleet-size optimisation aborted")?;

    eprintln!();
    eprintln!("Best fleet size: {} bikes", optimum.best.bike_total);
    eprintln!("  Profit: ${:.2}", optimum.best.profit());
    eprintln!("  Missed revenue: ${:.2}", optimum.best.costs.missed_revenue);
    eprintln!("  Runs evaluated: {}", points.len() + optimum.evaluated.len());
    eprintln!("  Elapsed: {:.2} seconds", started.elapsed().as_secs_f64());

    if json {
        let report = serde_json::json!({ "sweep": points, "optimum": optimum });
        println!("{}", serde_json::to_string_pretty(&report).context("Serializing sweep report")?);
    }
    Ok(())
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig, simulation: &Simulation) {
    eprintln!("Bike-Share Network Simulator");
    eprintln!("============================");
    eprintln!("Configuration:");
    eprintln!("  Window: {} to {}", config.start_time, config.end_time);
    eprintln!("  Timestep: {}s ({} ticks)", config.timestep_secs, config.tick_count());
    eprintln!("  Generator: {}", config.generator);
    eprintln!("  Seed: {}", config.seed);
    if config.rebalancing {
        eprintln!("  Rebalancing: after {}s", config.rebalancing_time_secs);
    } else {
        eprintln!("  Rebalancing: disabled");
    }
    eprintln!("  Reroute candidates: {}", config.max_reroute_candidates);
    if let Some(total) = config.bike_total {
        eprintln!("  Bike total: {}", total);
    }
    eprintln!("Network:");
    eprintln!("  Stations: {}", simulation.catalog().len());
    eprintln!("  Docks: {}", simulation.catalog().total_capacity());
    eprintln!();
}

/// Print the report of a single run
fn print_result(result: &SimulationResult, elapsed: std::time::Duration) {
    eprintln!("{}", result);
    eprintln!("Performance:");
    eprintln!("  Runtime: {:.2} seconds", elapsed.as_secs_f64());
    if elapsed.as_secs_f64() > 0.0 {
        eprintln!("  Ticks per second: {:.0}", result.ticks as f64 / elapsed.as_secs_f64());
    }
    eprintln!();
    eprintln!("Summary: {}", result.generate_compact_summary());
}

/// Print one line per fleet size
fn print_sweep(points: &[SweepPoint]) {
    eprintln!("{:>8} {:>8} {:>8} {:>8} {:>10} {:>10}", "bikes", "trips", "empty", "full", "rebalanced", "profit");
    for point in points {
        eprintln!(
            "{:>8} {:>8} {:>8} {:>8} {:>10} {:>10.2}",
            point.summary.total_bikes,
            point.summary.completed_trips,
            point.summary.empty_disappointments,
            point.summary.full_disappointments,
            point.summary.bikes_rebalanced,
            point.profit()
        );
    }
}
