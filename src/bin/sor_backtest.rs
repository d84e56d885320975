//! Smart Order Router Backtest CLI
//!
//! Sweeps router penalty configurations over a top-of-book CSV dump,
//! benchmarks the winner against naive/TWAP/VWAP execution and prints a
//! JSON report on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin sor_backtest -- \
//!   --data l1_day.csv \
//!   --config sor_backtest.toml \
//!   --order-size 5000 \
//!   --output report.json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Report written
//! - 1: Pipeline failed; `{"error": ...}` written instead

use anyhow::{Context, Result};
use clap::Parser;
use sor_backtest::router::{
    run_pipeline, BacktestReport, BacktestSettings, ErrorReport, PipelineInputs, Qty,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sor_backtest")]
#[command(about = "Backtest a cost-minimizing smart order router over venue quotes")]
struct Args {
    /// Top-of-book CSV file
    #[arg(long, env = "SOR_DATA_PATH", default_value = "l1_day.csv")]
    data: PathBuf,

    /// TOML settings file (defaults to SOR_CONFIG_PATH or sor_backtest.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override order size (shares)
    #[arg(long)]
    order_size: Option<Qty>,

    /// Override lot step (shares)
    #[arg(long)]
    lot_step: Option<Qty>,

    /// Evaluate sweep points on a single thread
    #[arg(long, default_value = "false")]
    sequential: bool,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the effective settings as TOML and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sor_backtest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rendered = match run(&args) {
        Ok(Some(report)) => report.to_json_pretty().context("Failed to serialize report"),
        Ok(None) => return,
        Err(err) => Err(err),
    };

    let (body, code) = match rendered {
        Ok(json) => (json, 0),
        Err(err) => {
            error!("backtest failed: {:#}", err);
            let report = ErrorReport::from_error(&err);
            let json = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", report.error));
            (json, 1)
        }
    };

    if let Err(err) = emit(&body, args.output.as_ref()) {
        eprintln!("failed to write report: {:#}", err);
        std::process::exit(1);
    }
    std::process::exit(code);
}

fn run(args: &Args) -> Result<Option<BacktestReport>> {
    let mut settings = match &args.config {
        Some(path) => BacktestSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => BacktestSettings::from_env(),
    };
    if let Some(order_size) = args.order_size {
        settings.order_size = order_size;
    }
    if let Some(lot_step) = args.lot_step {
        settings.lot_step = lot_step;
    }
    if args.sequential {
        settings.parallel = false;
    }

    if let Some(path) = &args.dump_config {
        settings
            .save(path)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        info!(path = %path.display(), "settings written");
        return Ok(None);
    }

    info!(
        data = %args.data.display(),
        order_size = settings.order_size,
        lot_step = settings.lot_step,
        grid_points = settings.grid.len(),
        "starting backtest"
    );

    let inputs = PipelineInputs {
        data_path: args.data.clone(),
        settings,
    };
    run_pipeline(&inputs).map(Some)
}

fn emit(body: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{}\n", body))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", body);
            Ok(())
        }
    }
}
