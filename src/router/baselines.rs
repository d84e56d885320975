//! Baseline Execution Strategies
//!
//! Reference strategies the router is compared against. Each sees the same
//! snapshot tape and order size and pays `ask + fee` per share, like the
//! router's ledger. None of them is lot-constrained.
//!
//! - `naive`: best venue only, as much as it shows, every snapshot.
//! - `twap`: equal slices per fixed-length time bucket.
//! - `vwap`: schedule follows the tape's displayed-size profile. The profile
//!   is computed over the whole tape up front, so this is an ex-post
//!   benchmark rather than a tradable schedule.

use crate::router::clock::{Nanos, NANOS_PER_SEC};
use crate::router::session::average_price;
use crate::router::venue::{Qty, Snapshot};
use serde::{Deserialize, Serialize};

/// Metrics a baseline reports for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineResult {
    pub strategy: String,
    pub total_cost: f64,
    pub filled_shares: Qty,
    pub avg_price: f64,
}

/// A reference execution strategy.
pub trait BaselineStrategy: Send + Sync {
    /// Name used as the report key.
    fn name(&self) -> &str;

    fn execute(&self, snapshots: &[Snapshot], order_size: Qty) -> BaselineResult;
}

/// Running totals shared by the baselines.
#[derive(Debug, Default)]
struct Fills {
    filled: Qty,
    cash: f64,
}

impl Fills {
    /// Lift displayed liquidity cheapest-first until `want` more shares are
    /// bought or the snapshot is empty.
    fn sweep(&mut self, snapshot: &Snapshot, want: Qty) {
        let mut want = want;
        for index in snapshot.cheapest_first() {
            if want <= 0 {
                break;
            }
            let venue = &snapshot.venues[index];
            let take = venue.ask_size.max(0).min(want);
            self.filled += take;
            self.cash += take as f64 * venue.unit_cost();
            want -= take;
        }
    }

    fn into_result(self, strategy: &str) -> BaselineResult {
        BaselineResult {
            strategy: strategy.to_string(),
            total_cost: self.cash,
            filled_shares: self.filled,
            avg_price: average_price(self.cash, self.filled),
        }
    }
}

/// Buy at the single cheapest venue each snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBestAsk;

impl BaselineStrategy for NaiveBestAsk {
    fn name(&self) -> &str {
        "naive"
    }

    fn execute(&self, snapshots: &[Snapshot], order_size: Qty) -> BaselineResult {
        let mut fills = Fills::default();
        for snapshot in snapshots {
            let remaining = order_size - fills.filled;
            if remaining <= 0 {
                break;
            }
            let best = snapshot
                .cheapest_first()
                .into_iter()
                .find(|&i| snapshot.venues[i].ask_size > 0);
            if let Some(index) = best {
                let venue = &snapshot.venues[index];
                let take = venue.ask_size.min(remaining);
                fills.filled += take;
                fills.cash += take as f64 * venue.unit_cost();
            }
        }
        fills.into_result(self.name())
    }
}

/// Time-weighted schedule over fixed-length buckets.
#[derive(Debug, Clone, Copy)]
pub struct Twap {
    bucket_ns: Nanos,
}

impl Twap {
    pub fn new(bucket_ns: Nanos) -> Self {
        Self {
            bucket_ns: bucket_ns.max(1),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new((secs as Nanos).saturating_mul(NANOS_PER_SEC))
    }
}

impl Default for Twap {
    fn default() -> Self {
        Self::from_secs(60)
    }
}

impl BaselineStrategy for Twap {
    fn name(&self) -> &str {
        "twap"
    }

    fn execute(&self, snapshots: &[Snapshot], order_size: Qty) -> BaselineResult {
        let mut fills = Fills::default();
        let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
            return fills.into_result(self.name());
        };

        let start = first.timestamp;
        let buckets = ((last.timestamp - start) / self.bucket_ns + 1) as i128;
        for snapshot in snapshots {
            if fills.filled >= order_size {
                break;
            }
            let bucket = ((snapshot.timestamp - start) / self.bucket_ns) as i128;
            let target = (order_size as i128 * (bucket + 1) / buckets) as Qty;
            fills.sweep(snapshot, target - fills.filled);
        }
        fills.into_result(self.name())
    }
}

/// Schedule proportional to cumulative displayed ask size.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vwap;

impl BaselineStrategy for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn execute(&self, snapshots: &[Snapshot], order_size: Qty) -> BaselineResult {
        let mut fills = Fills::default();
        let total_displayed: i128 = snapshots.iter().map(|s| s.displayed_size() as i128).sum();
        if total_displayed == 0 {
            return fills.into_result(self.name());
        }

        let mut cumulative: i128 = 0;
        for snapshot in snapshots {
            if fills.filled >= order_size {
                break;
            }
            cumulative += snapshot.displayed_size() as i128;
            let target = (order_size as i128 * cumulative / total_displayed) as Qty;
            fills.sweep(snapshot, target - fills.filled);
        }
        fills.into_result(self.name())
    }
}

/// The three standard baselines, in report order.
pub fn standard_baselines(twap_bucket_secs: u64) -> Vec<Box<dyn BaselineStrategy>> {
    vec![
        Box::new(NaiveBestAsk),
        Box::new(Twap::from_secs(twap_bucket_secs)),
        Box::new(Vwap),
    ]
}
