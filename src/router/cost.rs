//! Execution Cost Model
//!
//! Scores a venue split as realized cash plus penalties on the deviation
//! between executed and requested quantity:
//!
//! ```text
//! cash  = Σ executed_i·(ask_i + fee_i) − Σ (alloc_i − executed_i)·rebate_i
//! total = cash + θ·(under + over) + λ_under·under + λ_over·over
//! ```
//!
//! The rebate term only fires when a split asks for more than a venue
//! displays. `AllocationSearch` never proposes such a split, so under normal
//! operation the term is always zero; it is kept so externally built splits
//! are scored the same way.

use crate::router::config::RouterConfig;
use crate::router::error::{InputField, RouterError, RouterResult};
use crate::router::venue::{validate_quotes, Qty, VenueQuote};
use serde::{Deserialize, Serialize};

/// Components of a scored split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub executed: Qty,
    pub cash: f64,
    pub underfill: Qty,
    pub overfill: Qty,
    /// θ·(underfill + overfill)
    pub risk_penalty: f64,
    /// λ_under·underfill + λ_over·overfill
    pub cost_penalty: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.cash + self.risk_penalty + self.cost_penalty
    }
}

/// Penalty terms for an executed total. Also scores candidate totals in the
/// allocator.
#[inline]
pub(crate) fn deviation_penalty(order_size: Qty, executed: Qty, config: &RouterConfig) -> (f64, f64) {
    let underfill = (order_size - executed).max(0) as f64;
    let overfill = (executed - order_size).max(0) as f64;
    let risk = config.theta_queue * (underfill + overfill);
    let cost = config.lambda_under * underfill + config.lambda_over * overfill;
    (risk, cost)
}

/// Score `allocation` against `venues`, returning every component.
pub fn cost_breakdown(
    allocation: &[Qty],
    venues: &[VenueQuote],
    order_size: Qty,
    config: &RouterConfig,
) -> RouterResult<CostBreakdown> {
    if allocation.len() != venues.len() {
        return Err(RouterError::AllocationMismatch {
            allocation_len: allocation.len(),
            venue_count: venues.len(),
        });
    }
    if order_size < 0 {
        return Err(RouterError::invalid(InputField::OrderSize, order_size));
    }
    validate_quotes(venues)?;
    config.validate()?;

    let mut executed_total: Qty = 0;
    let mut cash = 0.0;
    for (&qty, venue) in allocation.iter().zip(venues) {
        if qty < 0 {
            return Err(RouterError::invalid_quote(InputField::Allocation, &venue.venue, qty));
        }
        let executed = qty.min(venue.ask_size);
        executed_total += executed;
        cash += executed as f64 * venue.unit_cost();
        cash -= (qty - executed).max(0) as f64 * venue.rebate;
    }

    let (risk_penalty, cost_penalty) = deviation_penalty(order_size, executed_total, config);
    Ok(CostBreakdown {
        executed: executed_total,
        cash,
        underfill: (order_size - executed_total).max(0),
        overfill: (executed_total - order_size).max(0),
        risk_penalty,
        cost_penalty,
    })
}

/// Risk-adjusted cost of `allocation`.
pub fn cost(
    allocation: &[Qty],
    venues: &[VenueQuote],
    order_size: Qty,
    config: &RouterConfig,
) -> RouterResult<f64> {
    cost_breakdown(allocation, venues, order_size, config).map(|b| b.total())
}
