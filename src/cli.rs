//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_date, parse_double, validate_simulation_config};
use crate::domain::costs::DEFAULT_DAYS_IN_YEAR;
use crate::domain::error::RebalanceError;
use crate::domain::returns::PriceMatrix;
use crate::domain::schedule::RebalanceSchedule;
use crate::domain::simulation::{
    SimulationConfig, SimulationResult, simulate_balance, validate_inputs,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rebalsim", about = "Rebalanced portfolio balance simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate the balance of a rebalancing schedule
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] prices
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Overrides [data] portfolios
        #[arg(long)]
        portfolios: Option<PathBuf>,
        /// Balance report path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show price coverage and the rebalance schedule
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        portfolios: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Run {
            config,
            prices,
            portfolios,
            output,
            dry_run,
        } => run_simulation(
            &config,
            prices.as_deref(),
            portfolios.as_deref(),
            output.as_deref(),
            dry_run,
        ),
        Command::Info {
            config,
            prices,
            portfolios,
        } => run_info(&config, prices.as_deref(), portfolios.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RebalanceError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| RebalanceError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_simulation_config(adapter: &dyn ConfigPort) -> Result<SimulationConfig, RebalanceError> {
    let end_date = parse_date(
        adapter.get_string("simulation", "end_date").as_deref(),
        "end_date",
    )?;
    Ok(SimulationConfig {
        starting_balance: parse_double(adapter, "simulation", "starting_balance", 0.0)?,
        end_date,
        transaction_cost: parse_double(adapter, "simulation", "transaction_cost", 0.0)?,
        annual_cost_of_debt: parse_double(adapter, "simulation", "annual_cost_of_debt", 0.0)?,
        days_in_year: parse_double(adapter, "simulation", "days_in_year", DEFAULT_DAYS_IN_YEAR)?,
    })
}

/// Command-line paths win over the `[data]` section.
pub fn resolve_data_paths(
    prices_override: Option<&Path>,
    portfolios_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<(PathBuf, PathBuf), RebalanceError> {
    let resolve = |over: Option<&Path>, key: &str| -> Result<PathBuf, RebalanceError> {
        if let Some(p) = over {
            return Ok(p.to_path_buf());
        }
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => Ok(PathBuf::from(s.trim())),
            _ => Err(RebalanceError::ConfigMissing {
                section: "data".into(),
                key: key.into(),
            }),
        }
    };
    Ok((
        resolve(prices_override, "prices")?,
        resolve(portfolios_override, "portfolios")?,
    ))
}

/// Loads the schedule and the prices it needs, from the first rebalance date
/// to the end date.
pub fn load_inputs(
    data_port: &dyn DataPort,
    config: &SimulationConfig,
) -> Result<(RebalanceSchedule, PriceMatrix), RebalanceError> {
    let schedule = data_port.fetch_schedule()?;
    let start = schedule
        .first_date()
        .ok_or_else(|| RebalanceError::invalid_input("rebalance schedule is empty"))?;
    let prices = data_port.fetch_prices(start, config.end_date)?;
    info!(
        rebalances = schedule.len(),
        assets = prices.assets().len(),
        price_rows = prices.dates().len(),
        "inputs loaded"
    );
    Ok((schedule, prices))
}

/// Runs the simulation and writes the balance report to `out`.
pub fn run_simulation_pipeline(
    data_port: &dyn DataPort,
    config: &SimulationConfig,
    out: &mut dyn Write,
) -> Result<SimulationResult, RebalanceError> {
    let (schedule, prices) = load_inputs(data_port, config)?;
    let result = simulate_balance(&schedule, &prices, config)?;
    CsvReportAdapter.write(&result, out)?;
    log_summary(&result, config.starting_balance);
    Ok(result)
}

fn log_summary(result: &SimulationResult, starting_balance: f64) {
    let Some(final_balance) = result.final_balance() else {
        warn!("no periods simulated");
        return;
    };
    let total_return = result.total_return(starting_balance).unwrap_or(0.0);
    info!(
        periods = result.len(),
        final_balance = %format!("{:.2}", final_balance),
        total_return = %format!("{:.2}%", total_return * 100.0),
        ruined = result.is_ruined(),
        "summary"
    );
}

fn run_simulation(
    config_path: &Path,
    prices: Option<&Path>,
    portfolios: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<(), RebalanceError> {
    let adapter = load_config(config_path)?;
    validate_simulation_config(&adapter)?;
    let sim_config = build_simulation_config(&adapter)?;
    let (prices_path, portfolios_path) = resolve_data_paths(prices, portfolios, &adapter)?;
    let data_port = CsvAdapter::new(prices_path, portfolios_path);

    if dry_run {
        let (schedule, prices) = load_inputs(&data_port, &sim_config)?;
        validate_inputs(&schedule, &prices, &sim_config)?;
        info!("dry run complete: configuration and data are valid");
        return Ok(());
    }

    match output {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            run_simulation_pipeline(&data_port, &sim_config, &mut file)?;
            file.flush()?;
            info!("report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            run_simulation_pipeline(&data_port, &sim_config, &mut lock)?;
        }
    }
    Ok(())
}

fn run_info(
    config_path: &Path,
    prices: Option<&Path>,
    portfolios: Option<&Path>,
) -> Result<(), RebalanceError> {
    let adapter = load_config(config_path)?;
    let (prices_path, portfolios_path) = resolve_data_paths(prices, portfolios, &adapter)?;
    let data_port = CsvAdapter::new(prices_path, portfolios_path);

    match data_port.get_data_range()? {
        Some((first, last, count)) => println!("prices: {} rows, {} to {}", count, first, last),
        None => println!("prices: no data"),
    }

    let schedule = data_port.fetch_schedule()?;
    let held = schedule.held_assets();
    println!(
        "rebalances: {}, assets held: {}",
        schedule.len(),
        held.into_iter().collect::<Vec<_>>().join(", ")
    );
    for entry in schedule.entries() {
        let weights = entry.weights.held();
        println!(
            "  {}: {} assets, gross {:.4}, net {:.4}",
            entry.date,
            weights.len(),
            weights.gross(),
            weights.net()
        );
    }
    Ok(())
}
