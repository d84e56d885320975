//! Allocation Search
//!
//! Exact search for the cheapest lot-quantized split of an order across
//! venues at one snapshot.
//!
//! # Approach
//!
//! The penalty terms of the cost model depend only on the executed total,
//! and the cash term is a sum of per-venue legs. The search therefore runs a
//! dynamic program over "lots placed so far" instead of enumerating the
//! Cartesian product of venue quantities:
//!
//! ```text
//! suffix[k][r] = min over u ≤ cap_k, u ≤ r of  leg_k(u) + suffix[k+1][r − u]
//! ```
//!
//! where `suffix[k][r]` is the cheapest cash cost of placing exactly `r`
//! lots on venues `k..n`. Work is `O(venues · lots²)` in the worst case.
//!
//! # Target total
//!
//! When some split reaches the order exactly, that total is taken. Otherwise
//! every reachable total `r` is scored as
//!
//! ```text
//! suffix[0][r] + θ·|order − r| + λ_under·under + λ_over·over
//! ```
//!
//! and the lowest score wins, ties going to the smaller total. With light
//! penalties this routes nothing until the book can absorb the whole
//! remainder; a large `λ_under` makes partial fills worthwhile.
//!
//! # Ties
//!
//! The split is rebuilt front to back, taking the smallest quantity at each
//! venue that still attains the optimum. Equal-cost splits therefore
//! resolve to the lexicographically smallest vector: lower venue indices
//! receive the lowest quantities.

use crate::router::config::RouterConfig;
use crate::router::cost::{cost, deviation_penalty};
use crate::router::error::{InputField, RouterError, RouterResult};
use crate::router::venue::{validate_quotes, Qty, VenueQuote};
use serde::{Deserialize, Serialize};

/// Default lot size in shares.
pub const DEFAULT_LOT_STEP: Qty = 100;

/// Relative tolerance under which two costs count as tied.
const TIE_EPSILON: f64 = 1e-12;

/// Upper bound on `order_size / lot_step` accepted by one search.
pub const MAX_ORDER_LOTS: Qty = 100_000;

/// A chosen split and its risk-adjusted cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Shares per venue, in snapshot venue order.
    pub quantities: Vec<Qty>,
    /// Cost-model score of `quantities` (cash + penalties).
    pub cost: f64,
}

impl Allocation {
    pub fn total(&self) -> Qty {
        self.quantities.iter().sum()
    }
}

/// Lot-quantized split optimizer. Holds no per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationSearch {
    lot_step: Qty,
}

impl Default for AllocationSearch {
    fn default() -> Self {
        Self {
            lot_step: DEFAULT_LOT_STEP,
        }
    }
}

impl AllocationSearch {
    pub fn new(lot_step: Qty) -> RouterResult<Self> {
        if lot_step <= 0 {
            return Err(RouterError::invalid(InputField::LotStep, lot_step));
        }
        Ok(Self { lot_step })
    }

    pub fn lot_step(&self) -> Qty {
        self.lot_step
    }

    /// Cheapest split of `order_size` shares across `venues`.
    pub fn allocate(
        &self,
        order_size: Qty,
        venues: &[VenueQuote],
        config: &RouterConfig,
    ) -> RouterResult<Allocation> {
        if order_size < 0 {
            return Err(RouterError::invalid(InputField::OrderSize, order_size));
        }
        validate_quotes(venues)?;
        config.validate()?;

        let step = self.lot_step;
        if order_size / step > MAX_ORDER_LOTS {
            return Err(RouterError::invalid(InputField::OrderSize, order_size));
        }
        let lots = (order_size / step) as usize;
        let caps: Vec<usize> = venues
            .iter()
            .map(|v| (v.ask_size.min(order_size) / step) as usize)
            .collect();
        let leg = |k: usize, units: usize| (units as Qty * step) as f64 * venues[k].unit_cost();

        let n = venues.len();
        let width = lots + 1;
        let mut suffix = vec![f64::INFINITY; (n + 1) * width];
        suffix[n * width] = 0.0;

        for k in (0..n).rev() {
            for r in 0..=lots {
                let mut best = f64::INFINITY;
                for u in 0..=caps[k].min(r) {
                    let tail = suffix[(k + 1) * width + r - u];
                    if tail.is_finite() {
                        let candidate = leg(k, u) + tail;
                        if candidate < best {
                            best = candidate;
                        }
                    }
                }
                suffix[k * width + r] = best;
            }
        }

        let target = if lots as Qty * step == order_size && suffix[lots].is_finite() {
            lots
        } else {
            self.best_partial_total(&suffix[..width], order_size, config)
        };

        let mut quantities = Vec::with_capacity(n);
        let mut remaining = target;
        for k in 0..n {
            let optimum = suffix[k * width + remaining];
            let tolerance = TIE_EPSILON * optimum.abs().max(1.0);
            let chosen = (0..=caps[k].min(remaining))
                .find(|&u| {
                    let tail = suffix[(k + 1) * width + remaining - u];
                    tail.is_finite() && leg(k, u) + tail <= optimum + tolerance
                })
                .unwrap_or(0);
            quantities.push(chosen as Qty * step);
            remaining -= chosen;
        }

        let cost = cost(&quantities, venues, order_size, config)?;
        tracing::trace!(
            order_size,
            venues = n,
            filled = target as Qty * step,
            cost,
            "allocation search complete"
        );
        Ok(Allocation { quantities, cost })
    }

    /// Lot count minimizing cash plus deviation penalties over the reachable
    /// totals in `cash_by_lots`. Zero lots is always reachable.
    fn best_partial_total(&self, cash_by_lots: &[f64], order_size: Qty, config: &RouterConfig) -> usize {
        let mut best = 0;
        let mut best_score = f64::INFINITY;
        for (r, &cash) in cash_by_lots.iter().enumerate() {
            if !cash.is_finite() {
                continue;
            }
            let (risk, penalty) = deviation_penalty(order_size, r as Qty * self.lot_step, config);
            let score = cash + risk + penalty;
            let tolerance = TIE_EPSILON * best_score.abs().max(1.0);
            if !best_score.is_finite() || score < best_score - tolerance {
                best = r;
                best_score = score;
            }
        }
        best
    }
}
