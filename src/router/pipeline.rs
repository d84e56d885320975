//! Backtest Pipeline
//!
//! load → sweep → baselines → report. Every failure is returned to the
//! caller; the binary decides how to render it.

use crate::router::allocator::AllocationSearch;
use crate::router::baselines::standard_baselines;
use crate::router::config::BacktestSettings;
use crate::router::feed::{load_snapshots_csv, FeeSchedule};
use crate::router::report::BacktestReport;
use crate::router::sweep::ParameterSweep;
use crate::router::venue::Snapshot;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Everything needed for one end-to-end run.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub data_path: PathBuf,
    pub settings: BacktestSettings,
}

/// Run the full pipeline against a CSV file.
pub fn run_pipeline(inputs: &PipelineInputs) -> Result<BacktestReport> {
    let fees = FeeSchedule {
        fee: inputs.settings.fee,
        rebate: inputs.settings.rebate,
    };
    let feed = load_snapshots_csv(&inputs.data_path, &fees)?;
    run_on_snapshots(&feed.snapshots, &inputs.settings)
}

/// Sweep and benchmark an already loaded tape.
pub fn run_on_snapshots(snapshots: &[Snapshot], settings: &BacktestSettings) -> Result<BacktestReport> {
    let search = AllocationSearch::new(settings.lot_step).context("Invalid lot step")?;
    let outcome = ParameterSweep::new(settings.order_size, search)
        .parallel(settings.parallel)
        .run(&settings.grid, snapshots)
        .context("Parameter sweep failed")?;

    let baselines: Vec<_> = standard_baselines(settings.twap_bucket_secs)
        .iter()
        .map(|baseline| baseline.execute(snapshots, settings.order_size))
        .collect();
    for baseline in &baselines {
        info!(
            strategy = %baseline.strategy,
            total_cost = baseline.total_cost,
            avg_price = baseline.avg_price,
            filled = baseline.filled_shares,
            "baseline evaluated"
        );
    }

    Ok(BacktestReport::build(&outcome.best, &baselines))
}
