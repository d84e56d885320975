//! Router Session
//!
//! Sequential replay of one parent order against time-ordered snapshots.
//!
//! # State Machine
//!
//! ```text
//!            step() while remaining > 0
//!          ┌────────────┐
//!          ▼            │
//!      ┌─────────┐──────┘   remaining ≤ 0    ┌────────┐
//!      │ Running │──────────────────────────▶│ Filled │
//!      └─────────┘                           └────────┘
//!          │ finish() with remaining > 0     ┌───────────┐
//!          └────────────────────────────────▶│ Exhausted │
//!                                            └───────────┘
//! ```
//!
//! Each snapshot is processed with only its own quotes; nothing from later
//! snapshots is visible. Snapshots are trusted to be deduplicated and in
//! chronological order.
//!
//! The ledger records realized spend only (`executed·(ask + fee)`). The
//! deviation penalties steer the allocator but are never booked.

use crate::router::allocator::AllocationSearch;
use crate::router::clock::Nanos;
use crate::router::config::RouterConfig;
use crate::router::error::{InputField, RouterError, RouterResult};
use crate::router::venue::{Qty, Snapshot};
use serde::{Deserialize, Serialize};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Running,
    /// Whole order executed.
    Filled,
    /// Replay ran out with quantity left.
    Exhausted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Run-local accounting; owned by exactly one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestLedger {
    pub remaining_quantity: Qty,
    pub filled_shares: Qty,
    pub total_cost: f64,
}

impl BacktestLedger {
    fn new(order_size: Qty) -> Self {
        Self {
            remaining_quantity: order_size,
            filled_shares: 0,
            total_cost: 0.0,
        }
    }
}

/// One child execution at one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    pub timestamp: Nanos,
    pub venue_index: usize,
    pub venue: String,
    pub quantity: Qty,
    pub ask: f64,
    pub fee: f64,
}

impl FillRecord {
    pub fn cash(&self) -> f64 {
        self.quantity as f64 * (self.ask + self.fee)
    }
}

/// Read-only outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub state: SessionState,
    pub total_cost: f64,
    pub filled_shares: Qty,
    /// `total_cost / filled_shares`, or 0 when nothing filled.
    pub avg_price: f64,
    pub snapshots_processed: usize,
}

/// Average execution price with the "nothing filled" sentinel.
#[inline]
pub fn average_price(total_cost: f64, filled_shares: Qty) -> f64 {
    if filled_shares > 0 {
        total_cost / filled_shares as f64
    } else {
        0.0
    }
}

/// Backtest driver for one configuration.
#[derive(Debug, Clone)]
pub struct RouterSession {
    config: RouterConfig,
    search: AllocationSearch,
    order_size: Qty,
    state: SessionState,
    ledger: BacktestLedger,
    fills: Vec<FillRecord>,
    snapshots_processed: usize,
}

impl RouterSession {
    pub fn new(order_size: Qty, config: RouterConfig, search: AllocationSearch) -> RouterResult<Self> {
        if order_size < 0 {
            return Err(RouterError::invalid(InputField::OrderSize, order_size));
        }
        config.validate()?;
        Ok(Self {
            config,
            search,
            order_size,
            state: SessionState::Running,
            ledger: BacktestLedger::new(order_size),
            fills: Vec::new(),
            snapshots_processed: 0,
        })
    }

    /// Build a session and replay `snapshots` to completion.
    pub fn replay(
        order_size: Qty,
        config: RouterConfig,
        search: AllocationSearch,
        snapshots: &[Snapshot],
    ) -> RouterResult<BacktestResult> {
        Self::new(order_size, config, search)?.run(snapshots)
    }

    /// Step through `snapshots` until terminal, then finish.
    pub fn run(mut self, snapshots: &[Snapshot]) -> RouterResult<BacktestResult> {
        for snapshot in snapshots {
            if self.step(snapshot)?.is_terminal() {
                break;
            }
        }
        Ok(self.finish())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn order_size(&self) -> Qty {
        self.order_size
    }

    pub fn ledger(&self) -> &BacktestLedger {
        &self.ledger
    }

    pub fn fills(&self) -> &[FillRecord] {
        &self.fills
    }

    /// Route the remaining quantity against one snapshot and book the fills.
    /// No-op once the session is terminal.
    pub fn step(&mut self, snapshot: &Snapshot) -> RouterResult<SessionState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let allocation =
            self.search
                .allocate(self.ledger.remaining_quantity, &snapshot.venues, &self.config)?;

        let mut executed_total: Qty = 0;
        let mut cash = 0.0;
        for (index, (&qty, venue)) in allocation.quantities.iter().zip(&snapshot.venues).enumerate() {
            let executed = qty.min(venue.ask_size);
            if executed <= 0 {
                continue;
            }
            let fill = FillRecord {
                timestamp: snapshot.timestamp,
                venue_index: index,
                venue: venue.venue.clone(),
                quantity: executed,
                ask: venue.ask,
                fee: venue.fee,
            };
            cash += fill.cash();
            executed_total += executed;
            self.fills.push(fill);
        }

        self.ledger.total_cost += cash;
        self.ledger.filled_shares += executed_total;
        self.ledger.remaining_quantity -= executed_total;
        self.snapshots_processed += 1;

        tracing::debug!(
            timestamp = snapshot.timestamp,
            venues = snapshot.venues.len(),
            executed = executed_total,
            remaining = self.ledger.remaining_quantity,
            objective = allocation.cost,
            "snapshot routed"
        );

        if self.ledger.remaining_quantity <= 0 {
            self.state = SessionState::Filled;
        }
        Ok(self.state)
    }

    /// Close the session, resolving `Running` into a terminal state.
    pub fn finish(mut self) -> BacktestResult {
        if self.state == SessionState::Running {
            self.state = if self.ledger.remaining_quantity <= 0 {
                SessionState::Filled
            } else {
                SessionState::Exhausted
            };
        }
        if self.snapshots_processed == 0 && self.order_size > 0 {
            tracing::warn!(order_size = self.order_size, "no snapshot data; session exhausted without fills");
        }

        BacktestResult {
            state: self.state,
            total_cost: self.ledger.total_cost,
            filled_shares: self.ledger.filled_shares,
            avg_price: average_price(self.ledger.total_cost, self.ledger.filled_shares),
            snapshots_processed: self.snapshots_processed,
        }
    }
}
