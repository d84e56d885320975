//! Backtest Report
//!
//! JSON-serializable summary of a sweep plus its baselines.

use crate::router::baselines::BaselineResult;
use crate::router::config::RouterConfig;
use crate::router::sweep::SweepResult;
use crate::router::venue::Qty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Improvement of `optimal_avg` over `baseline_avg` in basis points.
/// Zero when the baseline never traded.
pub fn savings_bps(baseline_avg: f64, optimal_avg: f64) -> f64 {
    if baseline_avg == 0.0 {
        return 0.0;
    }
    10_000.0 * (baseline_avg - optimal_avg) / baseline_avg
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalMetrics {
    /// Serialized as `null` for the no-fill sentinel.
    pub total_cost: f64,
    pub avg_price: f64,
    pub filled_shares: Qty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub total_cost: f64,
    pub avg_price: f64,
}

/// Successful pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub optimal_parameters: RouterConfig,
    pub optimal_results: OptimalMetrics,
    pub baselines: BTreeMap<String, BaselineMetrics>,
    pub savings_bps: BTreeMap<String, f64>,
}

impl BacktestReport {
    pub fn build(best: &SweepResult, baselines: &[BaselineResult]) -> Self {
        let mut baseline_metrics = BTreeMap::new();
        let mut savings = BTreeMap::new();
        for baseline in baselines {
            baseline_metrics.insert(
                baseline.strategy.clone(),
                BaselineMetrics {
                    total_cost: baseline.total_cost,
                    avg_price: baseline.avg_price,
                },
            );
            savings.insert(
                baseline.strategy.clone(),
                savings_bps(baseline.avg_price, best.avg_price),
            );
        }

        Self {
            optimal_parameters: best.config,
            optimal_results: OptimalMetrics {
                total_cost: best.total_cost,
                avg_price: best.avg_price,
                filled_shares: best.filled_shares,
            },
            baselines: baseline_metrics,
            savings_bps: savings,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Pipeline failure, reported in place of a `BacktestReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
}

impl ErrorReport {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            error: format!("{:#}", err),
        }
    }
}
