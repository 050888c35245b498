//! Eviction policy.
//!
//! When the grid is full, the oldest fraction of displayed photos is dropped
//! before the next admission. The fraction scales with the admission backlog
//! so a bursty feed drains faster. Ordering is by server timestamp, falling
//! back to insertion order for records whose timestamp did not parse.

use crate::wall::PhotoRecord;

/// Default share of the wall removed on a full grid.
pub const BASE_FRACTION: f64 = 0.3;

/// Eviction fraction for the current admission backlog: remove more when
/// more messages are waiting, to drain faster under load.
pub fn fraction_for_backlog(queued: usize) -> f64 {
    if queued > 20 {
        0.5
    } else if queued > 10 {
        0.4
    } else {
        BASE_FRACTION
    }
}

/// Split `records` into `(kept, evicted)`, keeping the newest
/// `total_cells - floor(total_cells * fraction)` records.
///
/// Also handles the shrunk-grid case where `records.len()` already exceeds
/// `total_cells`: everything beyond the keep target is evicted.
pub fn evict(
    mut records: Vec<PhotoRecord>,
    total_cells: usize,
    fraction: f64,
) -> (Vec<PhotoRecord>, Vec<PhotoRecord>) {
    let remove_target = (total_cells as f64 * fraction).floor() as usize;
    let keep_target = total_cells.saturating_sub(remove_target);
    if records.len() <= keep_target {
        return (records, Vec::new());
    }

    sort_oldest_first(&mut records);
    let evicted: Vec<PhotoRecord> = records.drain(..records.len() - keep_target).collect();
    (records, evicted)
}

/// Ascending by parsed server timestamp; unparsable timestamps sort by
/// insertion order before everything parsed (they are the oldest unknowns).
/// `seq` tiebreaks equal timestamps so the sort is total.
fn sort_oldest_first(records: &mut [PhotoRecord]) {
    records.sort_by_key(|r| match r.ts_millis {
        Some(millis) => (1_u8, millis, r.seq),
        None => (0_u8, 0, r.seq),
    });
}
