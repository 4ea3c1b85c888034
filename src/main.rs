mod logger;

use clap::{Parser, Subcommand};
use ehyd::{Ehyd, EhydError, PipelineConfig, StationId};
use log::{error, info, LevelFilter};
use logger::LOGGER;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ehyd", author, version, about = "Forecast eHYD groundwater levels with SARIMA", long_about = None)]
struct Cli {
    /// JSON pipeline config; missing fields take their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset root, overrides the config
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Work directory, overrides the config
    #[arg(short, long, global = true)]
    work_dir: Option<PathBuf>,

    /// More output, repeat for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the exports, associate neighbours, impute and persist the stores
    Prepare,
    /// Build frames, select features and forecast from prepared stores
    Forecast {
        /// Only forecast these groundwater stations
        #[arg(short, long)]
        station: Vec<StationId>,
    },
    /// Prepare, then forecast every station
    Run,
    /// Log data quality checks without writing anything
    Diagnostics,
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, EhydError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(data) = &cli.data {
        config.dataset_root = data.clone();
    }
    if let Some(work_dir) = &cli.work_dir {
        config.work_dir = Some(work_dir.clone());
    }
    Ok(config)
}

fn execute(cli: Cli) -> Result<(), EhydError> {
    let pipeline = Ehyd::new(load_config(&cli)?)?;
    info!("Work directory: {}", pipeline.work_dir().display());

    match cli.command {
        Commands::Prepare => {
            let prepared = pipeline.prepare()?;
            info!("Prepared {} groundwater targets", prepared.targets().len());
        }
        Commands::Forecast { station } => {
            let prepared = pipeline.load_prepared()?;
            let stations = (!station.is_empty()).then_some(station);
            pipeline
                .forecast()
                .prepared(&prepared)
                .maybe_stations(stations)
                .call()?;
        }
        Commands::Run => {
            pipeline.run()?;
        }
        Commands::Diagnostics => {
            pipeline.diagnostics()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
