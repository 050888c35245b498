//! Grid layout calculator.
//!
//! Pure viewport -> grid shape derivation. Cell size starts as a configured
//! fraction of the smaller viewport dimension; column/row counts are floored
//! from that, then the actual cell dimensions are back-solved so the grid
//! tiles the viewport exactly, gaps included.

/// Current viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Computed grid shape. Invariant:
/// `cols * cell_width + (cols - 1) * gap_x == viewport.width` (within float
/// rounding), and the analogous identity for rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub cols: usize,
    pub rows: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap_x: f64,
    pub gap_y: f64,
}

impl GridConfig {
    pub fn total_cells(&self) -> usize {
        self.cols * self.rows
    }

    /// Convert a `(col, row)` pair into a linear cell index, if in bounds.
    pub fn index_of(&self, col: usize, row: usize) -> Option<usize> {
        if col < self.cols && row < self.rows {
            Some(row * self.cols + col)
        } else {
            None
        }
    }
}

/// Derive the grid shape for a viewport.
///
/// `cell_fraction_percent` sizes the nominal cell as a percentage of the
/// smaller viewport dimension; `gap_percent` sizes the inter-cell gap as a
/// percentage of that nominal cell. Returns `None` for degenerate viewports
/// (zero or negative in either axis) — admission is skipped in that state.
pub fn compute(
    viewport: Viewport,
    cell_fraction_percent: f64,
    gap_percent: f64,
) -> Option<GridConfig> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 || cell_fraction_percent <= 0.0 {
        return None;
    }

    let smaller = viewport.width.min(viewport.height);
    let nominal_cell = smaller * cell_fraction_percent / 100.0;
    let gap = nominal_cell * gap_percent.max(0.0) / 100.0;

    let cols = ((viewport.width / (nominal_cell + gap)).floor() as usize).max(1);
    let rows = ((viewport.height / (nominal_cell + gap)).floor() as usize).max(1);

    // Back-solve cell dimensions so the grid covers the viewport exactly:
    // cols * cell_width + (cols - 1) * gap_x == width.
    let cell_width = (viewport.width - (cols as f64 - 1.0) * gap) / cols as f64;
    let cell_height = (viewport.height - (rows as f64 - 1.0) * gap) / rows as f64;

    Some(GridConfig {
        cols,
        rows,
        cell_width,
        cell_height,
        gap_x: gap,
        gap_y: gap,
    })
}
