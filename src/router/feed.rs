//! Snapshot Feed
//!
//! Loads top-of-book CSV dumps into replay snapshots.
//!
//! Expected columns (others are ignored): `ts_event` (integer nanoseconds or
//! RFC3339), `publisher_id`, `ask_px_00`, `ask_sz_00`. Rows are stably sorted
//! by `(ts_event, publisher_id)` and only the first row per pair is kept, so
//! the earliest-observed quote wins. Venues inside a snapshot are ordered by
//! publisher id, which is the venue order the allocator tie-breaks on.

use crate::router::clock::{format_nanos, parse_timestamp, Nanos};
use crate::router::venue::{Qty, Snapshot, VenueQuote};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Static per-share fee and rebate applied to every venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub fee: f64,
    pub rebate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee: 0.003,
            rebate: 0.002,
        }
    }
}

/// One CSV row as written by the market data vendor.
#[derive(Debug, Clone, Deserialize)]
struct RawQuoteRow {
    ts_event: String,
    publisher_id: u64,
    #[serde(default)]
    ask_px_00: Option<f64>,
    #[serde(default)]
    ask_sz_00: Option<f64>,
}

/// Counters from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    pub rows_read: usize,
    /// Rows without a usable ask price or size.
    pub rows_skipped: usize,
    /// Later rows for an already-seen (timestamp, venue) pair.
    pub duplicates_dropped: usize,
    pub snapshots: usize,
}

/// Snapshots ready for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFeed {
    pub snapshots: Vec<Snapshot>,
    pub stats: FeedStats,
}

impl LoadedFeed {
    /// First and last replay timestamps.
    pub fn window(&self) -> Option<(Nanos, Nanos)> {
        match (self.snapshots.first(), self.snapshots.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

/// Load a CSV file from disk.
pub fn load_snapshots_csv(path: impl AsRef<Path>, fees: &FeeSchedule) -> Result<LoadedFeed> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open market data file {}", path.display()))?;
    snapshots_from_reader(file, fees)
        .with_context(|| format!("Failed to load market data from {}", path.display()))
}

/// Parse CSV rows from any reader into deduplicated, time-ordered snapshots.
pub fn snapshots_from_reader<R: Read>(reader: R, fees: &FeeSchedule) -> Result<LoadedFeed> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut stats = FeedStats::default();
    let mut rows: Vec<(Nanos, u64, f64, Qty)> = Vec::new();

    for (line, record) in csv_reader.deserialize::<RawQuoteRow>().enumerate() {
        // Header is line 1
        let row = record.with_context(|| format!("Malformed CSV row at line {}", line + 2))?;
        stats.rows_read += 1;

        let ts = parse_timestamp(&row.ts_event)
            .ok_or_else(|| anyhow!("Invalid ts_event {:?} at line {}", row.ts_event, line + 2))?;
        match (row.ask_px_00, row.ask_sz_00) {
            (Some(ask), Some(size)) if ask.is_finite() && size.is_finite() => {
                rows.push((ts, row.publisher_id, ask, size.floor() as Qty));
            }
            _ => {
                stats.rows_skipped += 1;
                debug!(line = line + 2, publisher = row.publisher_id, "row without ask skipped");
            }
        }
    }

    // Stable: equal keys keep file order, so dedup keeps the first observed.
    rows.sort_by_key(|&(ts, publisher, _, _)| (ts, publisher));
    let before = rows.len();
    rows.dedup_by_key(|row| (row.0, row.1));
    stats.duplicates_dropped = before - rows.len();

    let mut snapshots: Vec<Snapshot> = Vec::new();
    for (ts, publisher, ask, size) in rows {
        let quote = VenueQuote::new(publisher.to_string(), ask, size, fees.fee, fees.rebate);
        match snapshots.last_mut() {
            Some(snapshot) if snapshot.timestamp == ts => snapshot.venues.push(quote),
            _ => snapshots.push(Snapshot::new(ts, vec![quote])),
        }
    }
    stats.snapshots = snapshots.len();

    let feed = LoadedFeed { snapshots, stats };
    match feed.window() {
        Some((start, end)) => info!(
            rows = stats.rows_read,
            skipped = stats.rows_skipped,
            duplicates = stats.duplicates_dropped,
            snapshots = stats.snapshots,
            start = %format_nanos(start),
            end = %format_nanos(end),
            "market data loaded"
        ),
        None => info!(rows = stats.rows_read, "market data loaded; no usable quotes"),
    }
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,bid_px_00,ask_px_00,bid_sz_00,ask_sz_00
x,2000,1,2,9,A,B,0,1,1,10.0,10.05,100,300
x,1000,1,2,9,A,B,0,1,1,10.0,10.02,100,200
x,1000,1,1,9,A,B,0,1,1,10.0,10.03,100,400
x,1000,1,2,9,A,B,0,1,1,10.0,99.99,100,999
x,2000,1,3,9,A,B,0,1,1,10.0,,100,
";

    #[test]
    fn test_groups_and_orders_snapshots() {
        let feed = snapshots_from_reader(SAMPLE.as_bytes(), &FeeSchedule::default()).unwrap();
        assert_eq!(feed.snapshots.len(), 2);

        let first = &feed.snapshots[0];
        assert_eq!(first.timestamp, 1000);
        let venues: Vec<&str> = first.venues.iter().map(|v| v.venue.as_str()).collect();
        assert_eq!(venues, vec!["1", "2"]);
        assert_eq!(first.venues[0].ask_size, 400);
        assert!((first.venues[0].fee - 0.003).abs() < 1e-12);
        assert!((first.venues[0].rebate - 0.002).abs() < 1e-12);

        assert_eq!(feed.window(), Some((1000, 2000)));
    }

    #[test]
    fn test_first_observed_quote_wins() {
        let feed = snapshots_from_reader(SAMPLE.as_bytes(), &FeeSchedule::default()).unwrap();
        let venue_2 = &feed.snapshots[0].venues[1];
        assert!((venue_2.ask - 10.02).abs() < 1e-12);
        assert_eq!(venue_2.ask_size, 200);
        assert_eq!(feed.stats.duplicates_dropped, 1);
    }

    #[test]
    fn test_rows_without_ask_are_skipped() {
        let feed = snapshots_from_reader(SAMPLE.as_bytes(), &FeeSchedule::default()).unwrap();
        assert_eq!(feed.stats.rows_read, 5);
        assert_eq!(feed.stats.rows_skipped, 1);
        assert_eq!(feed.snapshots[1].venues.len(), 1);
    }

    #[test]
    fn test_rfc3339_timestamps() {
        let csv = "ts_event,publisher_id,ask_px_00,ask_sz_00\n\
                   2024-08-01T13:36:32.000000002Z,1,10.0,100\n\
                   2024-08-01T13:36:32.000000001Z,1,10.1,100\n";
        let feed = snapshots_from_reader(csv.as_bytes(), &FeeSchedule::default()).unwrap();
        assert_eq!(feed.snapshots.len(), 2);
        assert!(feed.snapshots[0].timestamp < feed.snapshots[1].timestamp);
        assert!((feed.snapshots[0].venues[0].ask - 10.1).abs() < 1e-12);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let csv = "ts_event,publisher_id,ask_px_00,ask_sz_00\nnot-a-time,1,10.0,100\n";
        assert!(snapshots_from_reader(csv.as_bytes(), &FeeSchedule::default()).is_err());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "ts_event,ask_px_00,ask_sz_00\n1,10.0,100\n";
        assert!(snapshots_from_reader(csv.as_bytes(), &FeeSchedule::default()).is_err());
    }

    #[test]
    fn test_custom_fees() {
        let fees = FeeSchedule { fee: 0.001, rebate: 0.0 };
        let feed = snapshots_from_reader(SAMPLE.as_bytes(), &fees).unwrap();
        assert!(feed.snapshots.iter().flat_map(|s| &s.venues).all(|v| v.fee == 0.001 && v.rebate == 0.0));
    }
}
