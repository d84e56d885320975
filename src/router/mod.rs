//! Smart Order Routing Backtest
//!
//! Splits a parent buy order across competing venues at each replay
//! timestamp and measures realized execution cost per penalty configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ParameterSweep                           │
//! │  (one fresh session per grid point, grid-order reduction)       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────┐        ┌─────────────────┐        ┌─────────────┐
//! │ SnapshotFeed│───────▶│  RouterSession  │───────▶│  Ledger     │
//! │ (CSV, dedup)│        │  (sequential)   │        │  (cash)     │
//! └─────────────┘        └─────────────────┘        └─────────────┘
//!                                │
//!                                ▼
//!                        ┌─────────────────┐
//!                        │ AllocationSearch│
//!                        │ (lot DP)        │
//!                        └────────┬────────┘
//!                                 ▼
//!                        ┌─────────────────┐
//!                        │   CostModel     │
//!                        └─────────────────┘
//! ```
//!
//! # Determinism Guarantees
//!
//! - **Clock**: all time comes from snapshot timestamps
//! - **Allocation**: equal-cost splits resolve lexicographically
//! - **Sweep**: winner chosen in grid order regardless of thread scheduling

pub mod allocator;
pub mod baselines;
pub mod clock;
pub mod config;
pub mod cost;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod sweep;
pub mod venue;
#[cfg(test)]
mod session_tests;

// Re-exports for convenience
pub use allocator::{Allocation, AllocationSearch, DEFAULT_LOT_STEP, MAX_ORDER_LOTS};
pub use baselines::{standard_baselines, BaselineResult, BaselineStrategy, NaiveBestAsk, Twap, Vwap};
pub use clock::{format_nanos, parse_timestamp, Nanos, NANOS_PER_SEC};
pub use config::{BacktestSettings, ParamGrid, RouterConfig};
pub use cost::{cost, cost_breakdown, CostBreakdown};
pub use error::{InputField, RouterError, RouterResult};
pub use feed::{load_snapshots_csv, snapshots_from_reader, FeeSchedule, FeedStats, LoadedFeed};
pub use pipeline::{run_on_snapshots, run_pipeline, PipelineInputs};
pub use report::{savings_bps, BacktestReport, BaselineMetrics, ErrorReport, OptimalMetrics};
pub use session::{
    average_price, BacktestLedger, BacktestResult, FillRecord, RouterSession, SessionState,
};
pub use sweep::{ParameterSweep, SweepOutcome, SweepPoint, SweepResult};
pub use venue::{Qty, Snapshot, VenueQuote};
