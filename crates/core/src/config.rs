//! Immutable run configuration: grid geometry and input column layout.
//!
//! Both values are built once (normally from command-line arguments) and
//! passed by reference into the grid, the variable axis and the ingestion
//! routines. Nothing here is mutated after construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on `width × height` accepted by [`GridSpec::validate`].
pub const MAX_CELLS: usize = 1 << 30;

/// Which point of a cell is reported as its grid point.
///
/// The grid point is used both as the interpolation target and as the
/// coordinate written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellAnchor {
    /// `start + k * step`, the lower-left corner of the cell
    #[default]
    Corner,
    /// `start + (k + 0.5) * step`
    Center,
}

impl CellAnchor {
    pub(crate) fn offset(self) -> f64 {
        match self {
            CellAnchor::Corner => 0.0,
            CellAnchor::Center => 0.5,
        }
    }
}

/// Geometry of a regular latitude/longitude grid, in degrees.
///
/// Longitude maps to the grid's x axis (width), latitude to its y axis
/// (height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_start: f64,
    pub lat_end: f64,
    pub lon_start: f64,
    pub lon_end: f64,
    pub lat_step: f64,
    pub lon_step: f64,
    #[serde(default)]
    pub anchor: CellAnchor,
}

impl GridSpec {
    /// Create a spec with the default [`CellAnchor::Corner`] anchor.
    pub fn new(
        lat_start: f64,
        lat_end: f64,
        lon_start: f64,
        lon_end: f64,
        lat_step: f64,
        lon_step: f64,
    ) -> Self {
        Self {
            lat_start,
            lat_end,
            lon_start,
            lon_end,
            lat_step,
            lon_step,
            anchor: CellAnchor::Corner,
        }
    }

    /// Same geometry with a different anchor.
    pub fn with_anchor(mut self, anchor: CellAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Number of cells along the longitude axis: `floor((lon_end - lon_start) / lon_step)`
    pub fn width(&self) -> usize {
        cell_span(self.lon_start, self.lon_end, self.lon_step)
    }

    /// Number of cells along the latitude axis: `floor((lat_end - lat_start) / lat_step)`
    pub fn height(&self) -> usize {
        cell_span(self.lat_start, self.lat_end, self.lat_step)
    }

    /// Check that every bound is finite and steps are positive, and that the
    /// grid holds between one and [`MAX_CELLS`] cells.
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("lat_start", self.lat_start),
            ("lat_end", self.lat_end),
            ("lon_start", self.lon_start),
            ("lon_end", self.lon_end),
            ("lat_step", self.lat_step),
            ("lon_step", self.lon_step),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(Error::invalid(name, value, "must be a finite number"));
            }
        }
        if self.lat_step <= 0.0 {
            return Err(Error::invalid("lat_step", self.lat_step, "must be > 0"));
        }
        if self.lon_step <= 0.0 {
            return Err(Error::invalid("lon_step", self.lon_step, "must be > 0"));
        }
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        match width.checked_mul(height) {
            Some(cells) if cells <= MAX_CELLS => Ok(()),
            _ => Err(Error::InvalidDimensions { width, height }),
        }
    }
}

/// `floor(value)`, except that values within rounding noise of an integer
/// snap to it, so `0.3 / 0.1` counts as 3 rather than 2.
pub(crate) fn snapped_floor(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < 1e-9 {
        nearest
    } else {
        value.floor()
    }
}

fn cell_span(start: f64, end: f64, step: f64) -> usize {
    let cells = snapped_floor((end - start) / step);
    if cells.is_finite() && cells > 0.0 {
        cells as usize
    } else {
        0
    }
}

/// Where the fields a row contributes live, counted from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnLayout {
    /// Every row carries all value slots, one column each.
    Direct {
        lat: usize,
        lon: usize,
        values: Vec<usize>,
    },
    /// Every row carries one value; the pair of tag columns selects its slot.
    Tagged {
        lat: usize,
        lon: usize,
        tag: (usize, usize),
        value: usize,
    },
}

impl ColumnLayout {
    /// Latitude and longitude column indices.
    pub fn coordinate_columns(&self) -> (usize, usize) {
        match self {
            ColumnLayout::Direct { lat, lon, .. } | ColumnLayout::Tagged { lat, lon, .. } => {
                (*lat, *lon)
            }
        }
    }

    /// Highest column index the layout reads.
    pub fn max_column(&self) -> usize {
        match self {
            ColumnLayout::Direct { lat, lon, values } => values
                .iter()
                .copied()
                .chain([*lat, *lon])
                .max()
                .unwrap_or(0),
            ColumnLayout::Tagged {
                lat,
                lon,
                tag,
                value,
            } => [*lat, *lon, tag.0, tag.1, *value]
                .into_iter()
                .max()
                .unwrap_or(0),
        }
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, ColumnLayout::Tagged { .. })
    }

    /// A direct layout needs at least one value column; a tagged layout
    /// must read each of its five fields from a different column.
    pub fn validate(&self) -> Result<()> {
        match self {
            ColumnLayout::Direct { values, .. } if values.is_empty() => Err(Error::invalid(
                "value_columns",
                "",
                "at least one value column is required",
            )),
            ColumnLayout::Direct { .. } => Ok(()),
            ColumnLayout::Tagged {
                lat,
                lon,
                tag,
                value,
            } => {
                let columns = [*lat, *lon, tag.0, tag.1, *value];
                for (i, column) in columns.iter().enumerate() {
                    if columns[i + 1..].contains(column) {
                        return Err(Error::invalid(
                            "columns",
                            column,
                            "latitude, longitude, tag and value columns must be distinct",
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}
