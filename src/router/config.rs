//! Router and Backtest Configuration
//!
//! `RouterConfig` is the immutable penalty triple handed to every cost and
//! allocation call. `BacktestSettings` carries the run-level knobs and is
//! loadable from TOML.

use crate::router::error::{InputField, RouterError, RouterResult};
use crate::router::venue::Qty;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Risk-penalty coefficients for one router run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Per-share penalty for executing more than requested.
    pub lambda_over: f64,
    /// Per-share penalty for executing less than requested.
    pub lambda_under: f64,
    /// Symmetric per-share penalty on any fill-size deviation.
    pub theta_queue: f64,
}

impl RouterConfig {
    pub fn new(lambda_over: f64, lambda_under: f64, theta_queue: f64) -> Self {
        Self {
            lambda_over,
            lambda_under,
            theta_queue,
        }
    }

    /// All-zero coefficients; also the sweep's "no result" marker.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> RouterResult<()> {
        let checks = [
            (InputField::LambdaOver, self.lambda_over),
            (InputField::LambdaUnder, self.lambda_under),
            (InputField::ThetaQueue, self.theta_queue),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(RouterError::invalid(field, value));
            }
        }
        Ok(())
    }
}

/// Candidate values for each penalty coefficient. Axes left out of a
/// settings file keep their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub lambda_over: Vec<f64>,
    pub lambda_under: Vec<f64>,
    pub theta_queue: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            lambda_over: vec![0.0005, 0.001, 0.002],
            lambda_under: vec![0.0005, 0.001, 0.002],
            theta_queue: vec![0.00005, 0.0001, 0.0002],
        }
    }
}

impl ParamGrid {
    pub fn len(&self) -> usize {
        self.lambda_over.len() * self.lambda_under.len() * self.theta_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product, `lambda_over` outermost and `theta_queue` innermost.
    pub fn combinations(&self) -> Vec<RouterConfig> {
        let mut out = Vec::with_capacity(self.len());
        for &lo in &self.lambda_over {
            for &lu in &self.lambda_under {
                for &tq in &self.theta_queue {
                    out.push(RouterConfig::new(lo, lu, tq));
                }
            }
        }
        out
    }
}

/// Run-level settings for the backtest binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Shares to buy over the replay.
    #[serde(default = "default_order_size")]
    pub order_size: Qty,

    /// Allocation granularity in shares.
    #[serde(default = "default_lot_step")]
    pub lot_step: Qty,

    /// Static per-share fee applied to every venue.
    #[serde(default = "default_fee")]
    pub fee: f64,

    /// Static per-share rebate applied to every venue.
    #[serde(default = "default_rebate")]
    pub rebate: f64,

    /// Evaluate sweep points on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// TWAP bucket length in seconds.
    #[serde(default = "default_twap_bucket_secs")]
    pub twap_bucket_secs: u64,

    /// Penalty grid searched by the sweep.
    #[serde(default)]
    pub grid: ParamGrid,
}

fn default_order_size() -> Qty {
    5000
}

fn default_lot_step() -> Qty {
    100
}

fn default_fee() -> f64 {
    0.003
}

fn default_rebate() -> f64 {
    0.002
}

fn default_parallel() -> bool {
    true
}

fn default_twap_bucket_secs() -> u64 {
    60
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            order_size: default_order_size(),
            lot_step: default_lot_step(),
            fee: default_fee(),
            rebate: default_rebate(),
            parallel: default_parallel(),
            twap_bucket_secs: default_twap_bucket_secs(),
            grid: ParamGrid::default(),
        }
    }
}

impl BacktestSettings {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Load from `SOR_CONFIG_PATH` or `sor_backtest.toml`, else defaults.
    pub fn from_env() -> Self {
        let path = std::env::var("SOR_CONFIG_PATH")
            .unwrap_or_else(|_| "sor_backtest.toml".to_string());

        Self::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Using default backtest settings ({}): {}", path, e);
            Self::default()
        })
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
