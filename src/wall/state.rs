//! Photo wall state aggregate.
//!
//! The single mutation point for the displayed photo set. Every inbound
//! event flows through `admit`: dedup check, capacity check (evicting the
//! oldest fraction when full), cell allocation, then commit. The engine
//! serializes calls, so no interior locking is needed here.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::wall::grid::{self, GridConfig, Viewport};
use crate::wall::{alloc, dedup, evict, AnimationVariant, PhotoFrame, PhotoRecord};

/// Outcome of one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new record was committed into the given cell.
    Admitted { cell_index: usize },
    /// Duplicate delivery of an already-seen event; no mutation.
    Duplicate,
    /// No valid grid (degenerate viewport); event skipped.
    NoGrid,
    /// No free cell even after eviction; event dropped.
    Dropped,
}

/// Admission result plus any records evicted to make room. The caller owns
/// notifying the backing store about the evicted timestamps.
#[derive(Debug)]
pub struct AdmitOutcome {
    pub admission: Admission,
    pub evicted: Vec<PhotoRecord>,
}

/// The aggregate wall state: live records, current grid shape, dedup cache
/// and the RNG feeding cell/animation selection.
pub struct WallState {
    records: Vec<PhotoRecord>,
    grid: Option<GridConfig>,
    dedup: dedup::DedupCache,
    rng: StdRng,
    cell_fraction_percent: f64,
    gap_percent: f64,
    next_seq: u64,
}

impl WallState {
    pub fn new(viewport: Viewport, cell_fraction_percent: f64, gap_percent: f64) -> Self {
        Self::with_rng(
            viewport,
            cell_fraction_percent,
            gap_percent,
            StdRng::from_os_rng(),
        )
    }

    /// Construct with a seeded RNG for deterministic tests.
    pub fn with_rng(
        viewport: Viewport,
        cell_fraction_percent: f64,
        gap_percent: f64,
        rng: StdRng,
    ) -> Self {
        Self {
            records: Vec::new(),
            grid: grid::compute(viewport, cell_fraction_percent, gap_percent),
            dedup: dedup::DedupCache::new(),
            rng,
            cell_fraction_percent,
            gap_percent,
            next_seq: 0,
        }
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn grid(&self) -> Option<&GridConfig> {
        self.grid.as_ref()
    }

    /// Set of cell indices currently in use. Derived, never stored.
    pub fn occupied_cells(&self) -> HashSet<usize> {
        self.records.iter().map(|r| r.cell_index).collect()
    }

    /// Run the full admission pipeline for one inbound frame.
    ///
    /// `backlog` is the number of frames still queued behind this one; it
    /// scales the eviction fraction so the wall drains faster under load.
    pub fn admit(&mut self, frame: PhotoFrame, backlog: usize) -> AdmitOutcome {
        let Some(grid) = self.grid else {
            tracing::debug!("no grid (degenerate viewport), skipping admission");
            return AdmitOutcome {
                admission: Admission::NoGrid,
                evicted: Vec::new(),
            };
        };

        let fp = dedup::fingerprint(&frame.timestamp, &frame.image_data);
        if !self.dedup.admit(fp) {
            tracing::debug!(timestamp = %frame.timestamp, "duplicate photo event, skipping");
            return AdmitOutcome {
                admission: Admission::Duplicate,
                evicted: Vec::new(),
            };
        }

        let total = grid.total_cells();
        let mut evicted = Vec::new();
        if self.records.len() >= total {
            let fraction = evict::fraction_for_backlog(backlog);
            let (kept, dropped) =
                evict::evict(std::mem::take(&mut self.records), total, fraction);
            self.records = kept;
            tracing::info!(
                evicted = dropped.len(),
                kept = self.records.len(),
                fraction,
                "grid full, evicted oldest photos"
            );
            evicted = dropped;
        }

        let occupied = self.occupied_cells();
        let pinned = match (frame.x, frame.y) {
            (Some(x), Some(y)) => alloc::allocate_pinned(x, y, &grid, &occupied),
            _ => None,
        };
        let is_popup = pinned.is_some();
        let cell_index = match pinned.or_else(|| alloc::allocate(&occupied, total, &mut self.rng)) {
            Some(cell) => cell,
            None => {
                tracing::warn!("no free cell after eviction, dropping photo");
                return AdmitOutcome {
                    admission: Admission::Dropped,
                    evicted,
                };
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let record = PhotoRecord {
            id: Uuid::new_v4().to_string(),
            ts_millis: super::parse_timestamp_millis(&frame.timestamp),
            server_timestamp: frame.timestamp,
            image_data: frame.image_data,
            seq,
            cell_index,
            animation: AnimationVariant::random(&mut self.rng),
            is_popup,
        };
        tracing::debug!(cell = cell_index, id = %record.id, "photo admitted");
        self.records.push(record);

        AdmitOutcome {
            admission: Admission::Admitted { cell_index },
            evicted,
        }
    }

    /// Apply a viewport change.
    ///
    /// Reconciliation policy: full reassignment. The grid is recomputed; if
    /// the live set exceeds the new capacity the overflow is evicted oldest
    /// first (returned for cleanup notification), then every surviving
    /// record gets a fresh uniformly random cell. This preserves
    /// collision-freedom unconditionally.
    pub fn resize(&mut self, viewport: Viewport) -> Vec<PhotoRecord> {
        self.grid = grid::compute(viewport, self.cell_fraction_percent, self.gap_percent);
        let Some(grid) = self.grid else {
            tracing::warn!("viewport degenerate after resize, wall frozen until next resize");
            return Vec::new();
        };

        let total = grid.total_cells();
        let mut evicted = Vec::new();
        if self.records.len() > total {
            // Fraction 0 keeps exactly `total`: shed the overflow only.
            let (kept, dropped) = evict::evict(std::mem::take(&mut self.records), total, 0.0);
            self.records = kept;
            evicted = dropped;
        }

        let mut free: Vec<usize> = (0..total).collect();
        for record in &mut self.records {
            let slot = self.rng.random_range(0..free.len());
            record.cell_index = free.swap_remove(slot);
            record.is_popup = false;
        }
        tracing::info!(
            cols = grid.cols,
            rows = grid.rows,
            live = self.records.len(),
            evicted = evicted.len(),
            "grid resized, cells reassigned"
        );
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn wall_4x4() -> WallState {
        // 400x400 viewport at 25% yields a 4x4 grid of 16 cells.
        WallState::with_rng(
            Viewport::new(400.0, 400.0),
            25.0,
            0.0,
            StdRng::seed_from_u64(42),
        )
    }

    fn frame(n: u32) -> PhotoFrame {
        PhotoFrame {
            image_data: format!("base64-photo-{n}"),
            timestamp: format!("2024-01-01T00:00:{n:02}"),
            x: None,
            y: None,
        }
    }

    fn assert_no_collisions(state: &WallState) {
        let total = state.grid().unwrap().total_cells();
        let cells = state.occupied_cells();
        assert_eq!(cells.len(), state.records().len(), "cell collision");
        assert!(cells.iter().all(|&c| c < total), "cell out of range");
    }

    #[test]
    fn fills_grid_without_collisions() {
        let mut wall = wall_4x4();
        for n in 0..16 {
            let outcome = wall.admit(frame(n), 0);
            assert!(matches!(outcome.admission, Admission::Admitted { .. }));
            assert!(outcome.evicted.is_empty());
        }
        assert_eq!(wall.records().len(), 16);
        assert_no_collisions(&wall);
    }

    #[test]
    fn seventeenth_photo_evicts_the_four_oldest() {
        let mut wall = wall_4x4();
        for n in 0..16 {
            wall.admit(frame(n), 0);
        }
        let outcome = wall.admit(frame(16), 0);
        assert!(matches!(outcome.admission, Admission::Admitted { .. }));
        // floor(16 * 0.3) = 4 oldest evicted, 12 kept, plus the new one.
        assert_eq!(outcome.evicted.len(), 4);
        let evicted_ts: Vec<&str> = outcome
            .evicted
            .iter()
            .map(|r| r.server_timestamp.as_str())
            .collect();
        assert_eq!(
            evicted_ts,
            vec![
                "2024-01-01T00:00:00",
                "2024-01-01T00:00:01",
                "2024-01-01T00:00:02",
                "2024-01-01T00:00:03"
            ]
        );
        assert_eq!(wall.records().len(), 13);
        assert_no_collisions(&wall);
    }

    #[test]
    fn duplicate_event_is_admitted_once() {
        let mut wall = wall_4x4();
        let outcome = wall.admit(frame(1), 0);
        assert!(matches!(outcome.admission, Admission::Admitted { .. }));
        let outcome = wall.admit(frame(1), 0);
        assert!(matches!(outcome.admission, Admission::Duplicate));
        assert_eq!(wall.records().len(), 1);
    }

    #[test]
    fn large_backlog_raises_the_eviction_fraction() {
        let mut wall = wall_4x4();
        for n in 0..16 {
            wall.admit(frame(n), 0);
        }
        let outcome = wall.admit(frame(16), 25);
        // floor(16 * 0.5) = 8 evicted under heavy backlog.
        assert_eq!(outcome.evicted.len(), 8);
        assert_eq!(wall.records().len(), 9);
    }

    #[test]
    fn degenerate_viewport_skips_admission() {
        let mut wall = WallState::with_rng(
            Viewport::new(0.0, 0.0),
            25.0,
            0.0,
            StdRng::seed_from_u64(1),
        );
        let outcome = wall.admit(frame(1), 0);
        assert!(matches!(outcome.admission, Admission::NoGrid));
        assert!(wall.records().is_empty());
    }

    #[test]
    fn pinned_cell_is_honored_when_free() {
        let mut wall = wall_4x4();
        let pinned = PhotoFrame {
            x: Some(2),
            y: Some(1),
            ..frame(1)
        };
        let outcome = wall.admit(pinned, 0);
        assert!(matches!(
            outcome.admission,
            Admission::Admitted { cell_index: 6 }
        ));
        assert!(wall.records()[0].is_popup);

        // Same pin again (different payload): falls back to random placement.
        let pinned = PhotoFrame {
            x: Some(2),
            y: Some(1),
            ..frame(2)
        };
        let outcome = wall.admit(pinned, 0);
        match outcome.admission {
            Admission::Admitted { cell_index } => assert_ne!(cell_index, 6),
            other => panic!("expected admission, got {other:?}"),
        }
        assert!(!wall.records()[1].is_popup);
    }

    #[test]
    fn shrinking_resize_evicts_overflow_and_reassigns() {
        // 800x600 at 25% -> 5x4 grid (20 cells).
        let mut wall = WallState::with_rng(
            Viewport::new(800.0, 600.0),
            25.0,
            0.0,
            StdRng::seed_from_u64(7),
        );
        assert_eq!(wall.grid().unwrap().total_cells(), 20);
        for n in 0..20 {
            wall.admit(frame(n), 0);
        }

        // 300x300 at 25% -> 4x4 grid: four oldest must go.
        let evicted = wall.resize(Viewport::new(300.0, 300.0));
        assert_eq!(wall.grid().unwrap().total_cells(), 16);
        assert_eq!(evicted.len(), 4);
        assert_eq!(wall.records().len(), 16);
        assert_no_collisions(&wall);
    }

    #[test]
    fn proportional_resize_keeps_all_records_collision_free() {
        // 800x600 -> 400x300 keeps the same cell counts at a fixed
        // fraction; reassignment must still leave a valid layout.
        let mut wall = WallState::with_rng(
            Viewport::new(800.0, 600.0),
            25.0,
            0.0,
            StdRng::seed_from_u64(9),
        );
        for n in 0..10 {
            wall.admit(frame(n), 0);
        }
        let evicted = wall.resize(Viewport::new(400.0, 300.0));
        assert!(evicted.is_empty());
        assert_eq!(wall.records().len(), 10);
        assert_no_collisions(&wall);
    }

    #[test]
    fn capacity_bound_holds_over_a_long_feed() {
        let mut wall = wall_4x4();
        for n in 0..200 {
            let f = PhotoFrame {
                image_data: format!("photo-{n}"),
                timestamp: format!("2024-01-01T00:{:02}:{:02}", n / 60, n % 60),
                x: None,
                y: None,
            };
            wall.admit(f, 0);
            assert!(wall.records().len() <= 16);
            assert_no_collisions(&wall);
        }
    }
}
