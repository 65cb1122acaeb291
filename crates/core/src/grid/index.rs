//! Grid geometry: continuous coordinates to cell coordinates and back.

use crate::config::{snapped_floor, CellAnchor, GridSpec};
use crate::error::Result;

/// Geometry authority for a regular lat/lon grid.
///
/// Cells are addressed as `(x, y)` with `x` along longitude and `y` along
/// latitude. Cell `k` on an axis covers the half-open interval
/// `[start + k * step, start + (k + 1) * step)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndex {
    lat_start: f64,
    lon_start: f64,
    lat_step: f64,
    lon_step: f64,
    width: usize,
    height: usize,
    anchor: CellAnchor,
}

impl GridIndex {
    /// Build the index from a validated spec.
    pub fn new(spec: &GridSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            lat_start: spec.lat_start,
            lon_start: spec.lon_start,
            lat_step: spec.lat_step,
            lon_step: spec.lon_step,
            width: spec.width(),
            height: spec.height(),
            anchor: spec.anchor,
        })
    }

    /// Cells along longitude
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cells along latitude
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lat_step(&self) -> f64 {
        self.lat_step
    }

    pub fn lon_step(&self) -> f64 {
        self.lon_step
    }

    pub fn anchor(&self) -> CellAnchor {
        self.anchor
    }

    /// Row-major position of cell `(x, y)`: `y * width + x`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Inverse of [`GridIndex::index`].
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Cell containing `(lat, lon)`, or `None` when the point lies outside
    /// the grid (or is not a finite coordinate).
    pub fn cell_of(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let x = axis_cell(lon, self.lon_start, self.lon_step, self.width)?;
        let y = axis_cell(lat, self.lat_start, self.lat_step, self.height)?;
        Some((x, y))
    }

    /// Grid point `(lat, lon)` of cell `(x, y)`, used as the interpolation
    /// target and as the output coordinate.
    pub fn grid_point(&self, x: usize, y: usize) -> (f64, f64) {
        let offset = self.anchor.offset();
        let lat = self.lat_start + (y as f64 + offset) * self.lat_step;
        let lon = self.lon_start + (x as f64 + offset) * self.lon_step;
        (lat, lon)
    }

    /// Column index for a possibly negative or overflowing x, wrapped
    /// around the longitude axis.
    #[inline]
    pub fn wrap_x(&self, x: isize) -> usize {
        x.rem_euclid(self.width as isize) as usize
    }

    /// Row index for `y` if it lies inside the grid. Latitude never wraps.
    #[inline]
    pub fn clamp_y(&self, y: isize) -> Option<usize> {
        if y >= 0 && (y as usize) < self.height {
            Some(y as usize)
        } else {
            None
        }
    }

    /// Iterate all cells in row-major order (every x of a row, then the next y).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }
}

fn axis_cell(value: f64, start: f64, step: f64, cells: usize) -> Option<usize> {
    let k = snapped_floor((value - start) / step);
    if k.is_finite() && k >= 0.0 && k < cells as f64 {
        Some(k as usize)
    } else {
        None
    }
}

/// Absolute longitude difference along the shorter arc, in degrees.
#[inline]
pub fn lon_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Absolute latitude difference. Latitude never wraps.
#[inline]
pub fn lat_distance(a: f64, b: f64) -> f64 {
    (a - b).abs()
}
