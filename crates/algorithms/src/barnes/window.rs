//! Neighbour search window around a target cell

use csvgrid_core::GridIndex;

/// Per-axis search radius, in cells, around a target cell.
///
/// Columns wrap around the longitude axis; rows outside the grid are
/// skipped. A column or row is never visited twice for the same target,
/// even when the window is wider than the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub radius_x: usize,
    pub radius_y: usize,
}

impl SearchWindow {
    /// `ceil(length_scale / step)` along each axis, capped at the grid size.
    pub fn new(index: &GridIndex, length_scale: f64) -> Self {
        Self {
            radius_x: radius(length_scale, index.lon_step(), index.width()),
            radius_y: radius(length_scale, index.lat_step(), index.height()),
        }
    }

    /// Neighbour column indices for target column `x`.
    pub fn columns(&self, index: &GridIndex, x: usize) -> impl Iterator<Item = usize> {
        let width = index.width();
        let span = 2 * self.radius_x + 1;
        let (start, len) = if span >= width {
            (0, width)
        } else {
            (x as isize - self.radius_x as isize, span)
        };
        let index = *index;
        (0..len).map(move |k| index.wrap_x(start + k as isize))
    }

    /// Neighbour row indices for target row `y`.
    pub fn rows(&self, index: &GridIndex, y: usize) -> impl Iterator<Item = usize> {
        let r = self.radius_y as isize;
        let y = y as isize;
        let index = *index;
        (y - r..=y + r).filter_map(move |ny| index.clamp_y(ny))
    }
}

fn radius(length_scale: f64, step: f64, cells: usize) -> usize {
    let r = (length_scale / step).ceil();
    if r.is_finite() && r > 0.0 {
        (r as usize).min(cells)
    } else {
        0
    }
}
