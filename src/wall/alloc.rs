//! Cell allocator.
//!
//! Picks a uniformly random free cell so the wall fills in no predictable
//! pattern. Pure functions over an injectable RNG, O(total_cells).

use std::collections::HashSet;

use rand::Rng;

use crate::wall::grid::GridConfig;

/// Pick a uniformly random free cell index in `[0, total_cells)`.
/// Returns `None` when every cell is occupied (the grid is full).
pub fn allocate<R: Rng + ?Sized>(
    occupied: &HashSet<usize>,
    total_cells: usize,
    rng: &mut R,
) -> Option<usize> {
    let free: Vec<usize> = (0..total_cells).filter(|i| !occupied.contains(i)).collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}

/// Honor an explicitly requested `(col, row)` cell if it is in bounds and
/// currently free. Callers fall back to [`allocate`] when this fails.
pub fn allocate_pinned(
    col: u32,
    row: u32,
    grid: &GridConfig,
    occupied: &HashSet<usize>,
) -> Option<usize> {
    let index = grid.index_of(col as usize, row as usize)?;
    if occupied.contains(&index) {
        None
    } else {
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wall::grid::{compute, Viewport};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn only_free_cells_are_returned() {
        let mut rng = StdRng::seed_from_u64(1);
        let occupied: HashSet<usize> = [0, 1, 2, 5, 7].into_iter().collect();
        for _ in 0..100 {
            let cell = allocate(&occupied, 8, &mut rng).unwrap();
            assert!(cell < 8);
            assert!(!occupied.contains(&cell));
        }
    }

    #[test]
    fn full_grid_reports_none() {
        let mut rng = StdRng::seed_from_u64(2);
        let occupied: HashSet<usize> = (0..4).collect();
        assert_eq!(allocate(&occupied, 4, &mut rng), None);
        assert_eq!(allocate(&HashSet::new(), 0, &mut rng), None);
    }

    #[test]
    fn selection_covers_all_free_cells() {
        // Uniform selection should hit every free cell over enough draws.
        let mut rng = StdRng::seed_from_u64(3);
        let occupied: HashSet<usize> = [3].into_iter().collect();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            seen.insert(allocate(&occupied, 6, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn pinned_allocation_respects_bounds_and_occupancy() {
        let grid = compute(Viewport::new(400.0, 400.0), 25.0, 0.0).unwrap();
        let mut occupied = HashSet::new();
        assert_eq!(allocate_pinned(2, 1, &grid, &occupied), Some(6));
        occupied.insert(6);
        assert_eq!(allocate_pinned(2, 1, &grid, &occupied), None);
        assert_eq!(allocate_pinned(9, 0, &grid, &occupied), None);
    }
}
