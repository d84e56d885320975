//! Smart Order Router Backtest Library
//!
//! Exposes the routing core for the CLI binary and integration tests.

pub mod router;
