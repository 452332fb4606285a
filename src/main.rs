//! CLI entry point for the port analytics tool.
//!
//! Each subcommand loads one or more CSV datasets, runs a calculator or
//! renderer, and logs the result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use port_analytics::{
    config::AnalysisConfig,
    metrics::{
        dwell::analyze_dwell_times,
        eoq::summarize_eoq,
        occupancy::{compute_berth_occupancy, compute_merged_berth_occupancy},
        turnaround::{compute_turnaround_time, turnaround_by_vessel_type},
    },
    output::{append_summary_row, print_json, print_pretty, write_json},
    parser::{load_container_dwell, load_route_segments, load_vessel_movements},
    render::{
        histogram::{DEFAULT_HISTOGRAM_PATH, render_histogram},
        route_map::{DEFAULT_ROUTE_MAP_PATH, render_route_map},
    },
    report::{EoqInputs, PortReport, ReportInputs},
    telemetry::{LogSettings, init_tracing},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "port_analytics")]
#[command(about = "Descriptive metrics and charts for port operations data", long_about = None)]
struct Cli {
    /// JSON file with analysis settings
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mean vessel turnaround time in hours
    Turnaround {
        /// CSV with Arrival_Time and Departure_Time columns
        vessels: PathBuf,
    },
    /// Median, mean and spread of container dwell times
    Dwell {
        /// CSV with a dwell_time column
        containers: PathBuf,
    },
    /// Berth occupancy as a percentage of the observation window
    Occupancy {
        vessels: PathBuf,

        /// Count overlapping stays once instead of summing them
        #[arg(long, default_value_t = false)]
        merged: bool,
    },
    /// Economic order quantity
    Eoq {
        #[arg(short, long)]
        demand_rate: f64,

        /// Cost per order; defaults to the configured value
        #[arg(long)]
        ordering_cost: Option<f64>,

        /// Holding cost per unit; defaults to the configured value
        #[arg(long)]
        holding_cost: Option<f64>,
    },
    /// Render a PNG histogram of turnaround times
    Histogram {
        vessels: PathBuf,

        #[arg(short, long, default_value = DEFAULT_HISTOGRAM_PATH)]
        output: PathBuf,

        /// Number of bins; defaults to the configured value
        #[arg(short, long)]
        bins: Option<usize>,
    },
    /// Render an interactive HTML map of shipping routes
    RouteMap {
        /// CSV with start_lat, start_lon, end_lat, end_lon columns
        routes: PathBuf,

        #[arg(short, long, default_value = DEFAULT_ROUTE_MAP_PATH)]
        output: PathBuf,

        /// Initial zoom level; defaults to the configured value
        #[arg(short, long)]
        zoom: Option<u8>,
    },
    /// Run every calculator and evaluate alert thresholds
    Report {
        vessels: PathBuf,

        #[arg(long)]
        containers: Option<PathBuf>,

        /// Include an EOQ section using the configured costs
        #[arg(long)]
        demand_rate: Option<f64>,

        /// Write the report as JSON to this file
        #[arg(long)]
        json_output: Option<PathBuf>,

        /// Append a summary row to this CSV file
        #[arg(long)]
        csv_output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing(&LogSettings::from_env()).context("failed to set up logging")?;

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Turnaround { vessels } => {
            let movements = load_vessel_movements(&vessels)
                .with_context(|| format!("failed to load {}", vessels.display()))?;
            let mean = compute_turnaround_time(&movements)?;
            let by_type = turnaround_by_vessel_type(&movements)?;

            info!(mean_hours = mean, "Average turnaround time");
            for (vessel_type, hours) in &by_type {
                info!(vessel_type = %vessel_type, mean_hours = hours, "Turnaround by vessel type");
            }
            println!("{mean:.2}");
        }
        Commands::Dwell { containers } => {
            let records = load_container_dwell(&containers)
                .with_context(|| format!("failed to load {}", containers.display()))?;
            let stats = analyze_dwell_times(&records)?;

            info!(
                median = stats.median,
                mean = stats.mean,
                std_dev = stats.std_dev,
                "Dwell time statistics"
            );
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Occupancy { vessels, merged } => {
            let movements = load_vessel_movements(&vessels)
                .with_context(|| format!("failed to load {}", vessels.display()))?;
            let percent = if merged {
                compute_merged_berth_occupancy(&movements)?
            } else {
                compute_berth_occupancy(&movements)?
            };

            info!(percent, merged, "Berth occupancy");
            println!("{percent:.2}");
        }
        Commands::Eoq {
            demand_rate,
            ordering_cost,
            holding_cost,
        } => {
            let ordering_cost = ordering_cost.unwrap_or(config.eoq_defaults.ordering_cost);
            let holding_cost = holding_cost.unwrap_or(config.eoq_defaults.holding_cost);
            let summary = summarize_eoq(demand_rate, ordering_cost, holding_cost)?;

            info!(
                order_quantity = summary.order_quantity,
                total_cost = summary.total_cost,
                "Economic order quantity"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Histogram {
            vessels,
            output,
            bins,
        } => {
            let movements = load_vessel_movements(&vessels)
                .with_context(|| format!("failed to load {}", vessels.display()))?;
            let mut options = config.histogram_options();
            if let Some(bins) = bins {
                options.bin_count = bins;
            }

            render_histogram(&movements, &output, &options)
                .with_context(|| format!("failed to render {}", output.display()))?;
            info!(path = %output.display(), "Histogram saved");
        }
        Commands::RouteMap {
            routes,
            output,
            zoom,
        } => {
            let segments = load_route_segments(&routes)
                .with_context(|| format!("failed to load {}", routes.display()))?;
            let mut options = config.route_map_options();
            if let Some(zoom) = zoom {
                options.zoom_level = zoom;
            }

            render_route_map(&segments, &output, &options)
                .with_context(|| format!("failed to render {}", output.display()))?;
            info!(path = %output.display(), "Route map saved");
        }
        Commands::Report {
            vessels,
            containers,
            demand_rate,
            json_output,
            csv_output,
        } => {
            let movements = load_vessel_movements(&vessels)
                .with_context(|| format!("failed to load {}", vessels.display()))?;
            let container_records = containers
                .as_ref()
                .map(|path| {
                    load_container_dwell(path)
                        .with_context(|| format!("failed to load {}", path.display()))
                })
                .transpose()?;

            let inputs = ReportInputs {
                movements: &movements,
                containers: container_records.as_deref(),
                eoq: demand_rate.map(|demand_rate| EoqInputs {
                    demand_rate,
                    ordering_cost: config.eoq_defaults.ordering_cost,
                    holding_cost: config.eoq_defaults.holding_cost,
                }),
            };
            let report = PortReport::build(&inputs, &config.thresholds)?;

            print_pretty(&report);
            print_json(&report)?;
            if let Some(path) = json_output {
                write_json(&path, &report)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            if let Some(path) = csv_output {
                append_summary_row(&path, &report.summary_row())
                    .with_context(|| format!("failed to append to {}", path.display()))?;
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}
