//! Parameter Sweep
//!
//! Replays the same snapshot tape once per penalty configuration and keeps
//! the cheapest run that filled anything.
//!
//! Runs are independent: each gets a fresh `RouterSession` and shares only
//! the read-only tape. They may execute on the rayon pool, but the winner is
//! always chosen by walking results in grid order with a strict `<`, so the
//! first of equally cheap configurations wins regardless of scheduling.

use crate::router::allocator::AllocationSearch;
use crate::router::config::{ParamGrid, RouterConfig};
use crate::router::error::RouterResult;
use crate::router::session::{BacktestResult, RouterSession};
use crate::router::venue::{Qty, Snapshot};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Winning configuration and its realized metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub config: RouterConfig,
    pub total_cost: f64,
    pub filled_shares: Qty,
    pub avg_price: f64,
}

impl SweepResult {
    /// Returned when no configuration filled any quantity.
    pub fn sentinel() -> Self {
        Self {
            config: RouterConfig::zero(),
            total_cost: f64::INFINITY,
            filled_shares: 0,
            avg_price: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.filled_shares == 0 && self.total_cost == f64::INFINITY
    }

    fn from_run(config: RouterConfig, result: &BacktestResult) -> Self {
        Self {
            config,
            total_cost: result.total_cost,
            filled_shares: result.filled_shares,
            avg_price: result.avg_price,
        }
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Position in grid enumeration order.
    pub index: usize,
    pub config: RouterConfig,
    pub result: BacktestResult,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub best: SweepResult,
    /// Grid index of `best`, `None` for the sentinel.
    pub best_index: Option<usize>,
    pub points: Vec<SweepPoint>,
}

/// Grid search over router penalty configurations.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSweep {
    order_size: Qty,
    search: AllocationSearch,
    parallel: bool,
}

impl ParameterSweep {
    pub fn new(order_size: Qty, search: AllocationSearch) -> Self {
        Self {
            order_size,
            search,
            parallel: true,
        }
    }

    /// Toggle rayon evaluation. Results are identical either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, grid: &ParamGrid, snapshots: &[Snapshot]) -> RouterResult<SweepOutcome> {
        self.run_configs(&grid.combinations(), snapshots)
    }

    /// Evaluate `configs` in the given order.
    pub fn run_configs(
        &self,
        configs: &[RouterConfig],
        snapshots: &[Snapshot],
    ) -> RouterResult<SweepOutcome> {
        if configs.is_empty() {
            tracing::warn!("empty parameter grid; returning sentinel result");
            return Ok(SweepOutcome {
                best: SweepResult::sentinel(),
                best_index: None,
                points: Vec::new(),
            });
        }

        tracing::info!(
            configs = configs.len(),
            snapshots = snapshots.len(),
            order_size = self.order_size,
            parallel = self.parallel,
            "starting parameter sweep"
        );

        let evaluate = |(index, config): (usize, &RouterConfig)| {
            RouterSession::replay(self.order_size, *config, self.search, snapshots).map(|result| {
                tracing::debug!(
                    index,
                    lambda_over = config.lambda_over,
                    lambda_under = config.lambda_under,
                    theta_queue = config.theta_queue,
                    total_cost = result.total_cost,
                    filled = result.filled_shares,
                    "sweep point evaluated"
                );
                SweepPoint {
                    index,
                    config: *config,
                    result,
                }
            })
        };

        // Collected in grid order, so the first error in grid order wins too.
        let evaluated: Vec<RouterResult<SweepPoint>> = if self.parallel {
            configs.par_iter().enumerate().map(evaluate).collect()
        } else {
            configs.iter().enumerate().map(evaluate).collect()
        };
        let points = evaluated.into_iter().collect::<RouterResult<Vec<_>>>()?;

        let (best, best_index) = select_best(&points);
        match best_index {
            Some(index) => tracing::info!(
                index,
                lambda_over = best.config.lambda_over,
                lambda_under = best.config.lambda_under,
                theta_queue = best.config.theta_queue,
                total_cost = best.total_cost,
                filled = best.filled_shares,
                "sweep selected configuration"
            ),
            None => tracing::warn!("no configuration filled any quantity; returning sentinel result"),
        }

        Ok(SweepOutcome {
            best,
            best_index,
            points,
        })
    }
}

/// Strictly cheapest filled run, scanning in grid order.
fn select_best(points: &[SweepPoint]) -> (SweepResult, Option<usize>) {
    let mut best: Option<&SweepPoint> = None;
    for point in points {
        if point.result.filled_shares <= 0 {
            continue;
        }
        let better = match best {
            Some(current) => point.result.total_cost < current.result.total_cost,
            None => point.result.total_cost < f64::INFINITY,
        };
        if better {
            best = Some(point);
        }
    }
    match best {
        Some(point) => (SweepResult::from_run(point.config, &point.result), Some(point.index)),
        None => (SweepResult::sentinel(), None),
    }
}
