//! Cutting stock optimizer CLI

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use u_cutstock_core::{
    is_milp_available, solve_batch, solve_request_with, validate_instance, CuttingRequest,
    CuttingResponse, Objective, OptimizerConfig, PatternCatalog, ResponseStatus,
};

#[derive(Parser)]
#[command(name = "cutstock")]
#[command(about = "One-dimensional cutting stock optimizer")]
#[command(version)]
struct Cli {
    /// Enable debug logging and solver output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single request file
    Solve {
        /// Path to the JSON request
        file: PathBuf,

        /// Output file for the response (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Allow producing more pieces than demanded
        #[arg(long)]
        allow_overproduction: bool,

        /// Solver time limit in seconds
        #[arg(short, long)]
        time_limit: Option<f64>,

        /// Objective to minimise
        #[arg(long, value_enum)]
        objective: Option<ObjectiveArg>,
    },

    /// Solve a JSON map of profile name to request, in parallel
    Batch {
        /// Path to the JSON batch file
        file: PathBuf,

        /// Output file for the responses (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the cutting patterns generated for a request, without solving
    Patterns {
        /// Path to the JSON request
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    /// Total stock cost
    Cost,
    /// Number of bars
    Bars,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::Cost => Objective::StockCost,
            ObjectiveArg::Bars => Objective::BarCount,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !is_milp_available() {
        log::warn!("Built without a MILP backend; every solve will report no solution");
    }
    let base = OptimizerConfig::new().with_verbose(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            output,
            allow_overproduction,
            time_limit,
            objective,
        } => {
            let mut request: CuttingRequest = read_json(&file)?;
            request.options.allow_overproduction |= allow_overproduction;
            if let Some(secs) = time_limit {
                request.options.time_limit_seconds = Some(secs);
            }
            if let Some(objective) = objective {
                request.options.objective = Some(objective.into());
            }

            let response = solve_request_with(&request, &base)
                .with_context(|| format!("Invalid request {}", file.display()))?;

            match output {
                Some(path) => {
                    write_json(&path, &response)?;
                    print_response(&response);
                    println!("Response saved to: {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&response)?),
            }
        }

        Commands::Batch { file, output } => {
            let requests: BTreeMap<String, CuttingRequest> = read_json(&file)?;
            let results = solve_batch(&requests, &base);

            let mut document = serde_json::Map::new();
            for (profile, result) in results {
                let value = match result {
                    Ok(response) => {
                        println!("[{}]", profile);
                        print_response(&response);
                        serde_json::to_value(&response)?
                    }
                    Err(e) => {
                        eprintln!("[{}] rejected: {}", profile, e);
                        serde_json::json!({ "status": "error", "message": e.to_string() })
                    }
                };
                document.insert(profile, value);
            }

            let document = serde_json::Value::Object(document);
            match output {
                Some(path) => {
                    write_json(&path, &document)?;
                    println!("Responses saved to: {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&document)?),
            }
        }

        Commands::Patterns { file } => {
            let request: CuttingRequest = read_json(&file)?;
            let stocks = request.stocks();
            let parts = request.parts();
            validate_instance(&stocks, &parts, request.saw_kerf)?;

            let catalog = PatternCatalog::build_with_tolerance(
                &stocks,
                &parts,
                request.saw_kerf,
                base.offcut_tolerance,
            );
            for stock in &stocks {
                println!("{} ({} mm)", stock.id, stock.length);
                println!("{:-<72}", "");
                for pattern in catalog.for_stock(&stock.id) {
                    let layout: Vec<&str> =
                        pattern.layout.iter().map(|p| p.part_id.as_str()).collect();
                    println!(
                        "  {:<12} [{}] waste={:.2} kerf={:.2} cuts={}",
                        pattern.id,
                        layout.join(" "),
                        pattern.metrics.waste,
                        pattern.metrics.kerf_length,
                        pattern.metrics.cuts
                    );
                }
                println!();
            }
            println!("Total patterns: {}", catalog.len());
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_response(response: &CuttingResponse) {
    let report = &response.report;
    match (&response.status, &response.summary) {
        (ResponseStatus::Success, Some(summary)) => {
            println!(
                "  {} ({}): {} bars, cost {:.2}, yield {:.2}%",
                report.solver_status,
                report.solver,
                summary.total_bars(),
                summary.total_stock_cost,
                summary.yield_percentage
            );
            println!(
                "  waste {:.1} mm, kerf {:.1} mm, {} cuts",
                summary.total_waste_length_mm,
                summary.total_kerf_length_mm,
                summary.total_number_of_cuts
            );
            for (stock_id, usage) in &summary.stock_usage {
                println!(
                    "    {:<12} bars={:<4} cost={:.2} weight={:.2}kg",
                    stock_id, usage.bars_used, usage.cost, usage.weight_kg
                );
            }
        }
        _ => {
            println!(
                "  no solution: {}",
                response.message.as_deref().unwrap_or("unknown reason")
            );
        }
    }
    println!(
        "  {} patterns, {} ms total ({} ms solving)",
        report.total_patterns, report.total_ms, report.solve_ms
    );
}
