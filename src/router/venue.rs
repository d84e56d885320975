//! Venue Quotes and Snapshots
//!
//! Top-of-book ask quotes from competing venues, grouped by replay
//! timestamp. Both types are read-only once built by the feed.

use crate::router::clock::Nanos;
use crate::router::error::{InputField, RouterError, RouterResult};
use serde::{Deserialize, Serialize};

/// Share quantity. Signed so that negative inputs can be rejected
/// explicitly instead of wrapping.
pub type Qty = i64;

/// Best ask at one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueQuote {
    pub venue: String,
    pub ask: f64,
    pub ask_size: Qty,
    /// Per-share fee paid on executed quantity.
    pub fee: f64,
    /// Per-share credit on allocated-but-unexecuted quantity.
    pub rebate: f64,
}

impl VenueQuote {
    pub fn new(venue: impl Into<String>, ask: f64, ask_size: Qty, fee: f64, rebate: f64) -> Self {
        Self {
            venue: venue.into(),
            ask,
            ask_size,
            fee,
            rebate,
        }
    }

    /// All-in price of one executed share.
    #[inline]
    pub fn unit_cost(&self) -> f64 {
        self.ask + self.fee
    }

    pub fn validate(&self) -> RouterResult<()> {
        let checks = [
            (InputField::AskPrice, self.ask),
            (InputField::Fee, self.fee),
            (InputField::Rebate, self.rebate),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(RouterError::invalid_quote(field, &self.venue, value));
            }
        }
        if self.ask_size < 0 {
            return Err(RouterError::invalid_quote(
                InputField::AskSize,
                &self.venue,
                self.ask_size,
            ));
        }
        Ok(())
    }
}

/// Validate every quote in a venue set.
pub fn validate_quotes(venues: &[VenueQuote]) -> RouterResult<()> {
    venues.iter().try_for_each(VenueQuote::validate)
}

/// All venue quotes observed at one replay timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: Nanos,
    pub venues: Vec<VenueQuote>,
}

impl Snapshot {
    pub fn new(timestamp: Nanos, venues: Vec<VenueQuote>) -> Self {
        Self { timestamp, venues }
    }

    /// Total displayed ask size across venues.
    pub fn displayed_size(&self) -> Qty {
        self.venues.iter().map(|v| v.ask_size.max(0)).sum()
    }

    /// Venue indices ordered by all-in unit cost, ties by venue index.
    pub fn cheapest_first(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.venues.len()).collect();
        order.sort_by(|&a, &b| {
            self.venues[a]
                .unit_cost()
                .total_cmp(&self.venues[b].unit_cost())
                .then(a.cmp(&b))
        });
        order
    }
}
