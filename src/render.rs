//! Render boundary.
//!
//! The engine publishes the wall as a list of positioned tiles; the view
//! layer only paints pixels. Positions and sizes are derived from the grid
//! shape and each record's cell index.

use crate::wall::grid::GridConfig;
use crate::wall::PhotoRecord;

/// One render-ready photo: pixel position/size plus the animation tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoTile {
    pub id: String,
    pub image_data: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub animation: &'static str,
    pub is_popup: bool,
}

/// Project the live records onto the grid. Records are returned in
/// admission order; the view keys on `id` for animation continuity.
pub fn tiles(records: &[PhotoRecord], grid: &GridConfig) -> Vec<PhotoTile> {
    records
        .iter()
        .map(|record| {
            let col = record.cell_index % grid.cols;
            let row = record.cell_index / grid.cols;
            PhotoTile {
                id: record.id.clone(),
                image_data: record.image_data.clone(),
                x: col as f64 * (grid.cell_width + grid.gap_x),
                y: row as f64 * (grid.cell_height + grid.gap_y),
                width: grid.cell_width,
                height: grid.cell_height,
                animation: record.animation.as_str(),
                is_popup: record.is_popup,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wall::grid::{compute, Viewport};
    use crate::wall::AnimationVariant;

    fn record(cell_index: usize) -> PhotoRecord {
        PhotoRecord {
            id: format!("id-{cell_index}"),
            image_data: "img".into(),
            server_timestamp: "2024-01-01T00:00:00".into(),
            ts_millis: None,
            seq: cell_index as u64,
            cell_index,
            animation: AnimationVariant::Zoom,
            is_popup: false,
        }
    }

    #[test]
    fn tiles_land_inside_the_viewport() {
        let viewport = Viewport::new(800.0, 600.0);
        let grid = compute(viewport, 25.0, 10.0).unwrap();
        let records: Vec<PhotoRecord> = (0..grid.total_cells()).map(record).collect();
        for tile in tiles(&records, &grid) {
            assert!(tile.x >= 0.0 && tile.x + tile.width <= viewport.width + 1e-6);
            assert!(tile.y >= 0.0 && tile.y + tile.height <= viewport.height + 1e-6);
        }
    }

    #[test]
    fn cell_index_maps_row_major() {
        let grid = compute(Viewport::new(400.0, 400.0), 25.0, 0.0).unwrap();
        let out = tiles(&[record(5)], &grid);
        // Cell 5 in a 4-wide grid is col 1, row 1.
        assert_eq!(out[0].x, grid.cell_width);
        assert_eq!(out[0].y, grid.cell_height);
        assert_eq!(out[0].animation, "zoom");
    }
}
