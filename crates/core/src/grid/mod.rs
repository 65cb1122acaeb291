//! The analysis grid: per-cell value buffers and observation buckets

mod index;
mod observation;

pub use index::{lat_distance, lon_distance, GridIndex};
pub use observation::{Observation, COORD_EPSILON};

use ndarray::{Array2, Array3, ArrayView1, ArrayView3};

use crate::config::GridSpec;
use crate::error::{Error, Result};

/// A regular lat/lon grid holding, for every cell, the current and previous
/// pass values of each variable slot plus the observations bucketed into it.
///
/// Value buffers are `height × width × num_values` arrays; row 0 is the
/// southernmost latitude band. `num_values` is fixed at construction.
#[derive(Debug, Clone)]
pub struct Grid {
    index: GridIndex,
    num_values: usize,
    current: Array3<f64>,
    previous: Array3<f64>,
    has_values: Array2<bool>,
    buckets: Vec<Vec<Observation>>,
}

impl Grid {
    /// Allocate a zeroed grid with `num_values` slots per cell.
    pub fn new(index: GridIndex, num_values: usize) -> Result<Self> {
        if num_values == 0 {
            return Err(Error::invalid(
                "num_values",
                num_values,
                "a grid needs at least one value slot",
            ));
        }
        let max_elements = isize::MAX as usize / std::mem::size_of::<f64>();
        let fits = index
            .len()
            .checked_mul(num_values)
            .is_some_and(|n| n <= max_elements);
        if !fits {
            return Err(Error::InvalidDimensions {
                width: index.width(),
                height: index.height(),
            });
        }
        let shape = (index.height(), index.width(), num_values);
        Ok(Self {
            index,
            num_values,
            current: Array3::zeros(shape),
            previous: Array3::zeros(shape),
            has_values: Array2::from_elem((index.height(), index.width()), false),
            buckets: vec![Vec::new(); index.len()],
        })
    }

    /// Validate `spec` and allocate the grid it describes.
    pub fn from_spec(spec: &GridSpec, num_values: usize) -> Result<Self> {
        Self::new(GridIndex::new(spec)?, num_values)
    }

    // Geometry

    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    pub fn width(&self) -> usize {
        self.index.width()
    }

    pub fn height(&self) -> usize {
        self.index.height()
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }

    // Observations

    /// Append an observation carrying every slot. Returns the cell it was
    /// bucketed into, or `None` if it lies outside the grid.
    pub fn add_observation(
        &mut self,
        lat: f64,
        lon: f64,
        values: &[f64],
    ) -> Result<Option<(usize, usize)>> {
        if values.len() != self.num_values {
            return Err(Error::invalid(
                "values",
                values.len(),
                format!("expected {} values per observation", self.num_values),
            ));
        }
        let Some((x, y)) = self.index.cell_of(lat, lon) else {
            return Ok(None);
        };
        let i = self.index.index(x, y);
        self.buckets[i].push(Observation::new(lat, lon, values.to_vec()));
        Ok(Some((x, y)))
    }

    /// Write `value` into `slot` of the observation at `(lat, lon)`,
    /// creating a zero-filled observation first if the cell has none there.
    pub fn merge_observation(
        &mut self,
        lat: f64,
        lon: f64,
        slot: usize,
        value: f64,
    ) -> Result<Option<(usize, usize)>> {
        self.check_slot(slot)?;
        let Some((x, y)) = self.index.cell_of(lat, lon) else {
            return Ok(None);
        };
        let num_values = self.num_values;
        let bucket = &mut self.buckets[self.index.index(x, y)];
        match bucket.iter_mut().find(|obs| obs.is_at(lat, lon)) {
            Some(obs) => obs.values[slot] = value,
            None => {
                let mut obs = Observation::zeroed(lat, lon, num_values);
                obs.values[slot] = value;
                bucket.push(obs);
            }
        }
        Ok(Some((x, y)))
    }

    /// Observations bucketed into cell `(x, y)`.
    pub fn observations(&self, x: usize, y: usize) -> &[Observation] {
        &self.buckets[self.index.index(x, y)]
    }

    /// Total number of observations held by the grid.
    pub fn observation_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    // Values

    /// Whether any pass has matched an observation for cell `(x, y)`.
    pub fn has_values(&self, x: usize, y: usize) -> bool {
        self.has_values[(y, x)]
    }

    /// Current values of cell `(x, y)`.
    pub fn values(&self, x: usize, y: usize) -> ArrayView1<'_, f64> {
        self.current.slice(ndarray::s![y, x, ..])
    }

    /// Values of cell `(x, y)` as of the start of the latest pass.
    pub fn previous_values(&self, x: usize, y: usize) -> ArrayView1<'_, f64> {
        self.previous.slice(ndarray::s![y, x, ..])
    }

    /// Value of `slot` at `(x, y)`, or `default` when the cell has none.
    pub fn value_or(&self, x: usize, y: usize, slot: usize, default: f64) -> f64 {
        if self.has_values(x, y) {
            self.current[(y, x, slot)]
        } else {
            default
        }
    }

    /// The whole current buffer (`height × width × num_values`).
    pub fn current(&self) -> ArrayView3<'_, f64> {
        self.current.view()
    }

    /// The whole previous-pass buffer.
    pub fn previous(&self) -> ArrayView3<'_, f64> {
        self.previous.view()
    }

    /// One slot as a `height × width` field, `NaN` where the cell has no values.
    pub fn field(&self, slot: usize) -> Result<Array2<f64>> {
        self.check_slot(slot)?;
        let mut field = Array2::from_elem((self.height(), self.width()), f64::NAN);
        for ((y, x), out) in field.indexed_iter_mut() {
            if self.has_values[(y, x)] {
                *out = self.current[(y, x, slot)];
            }
        }
        Ok(field)
    }

    /// Number of cells flagged as having values.
    pub fn filled_cells(&self) -> usize {
        self.has_values.iter().filter(|&&v| v).count()
    }

    // Pass lifecycle

    /// Copy every cell's current values into its previous buffer.
    pub fn snapshot(&mut self) {
        self.previous.assign(&self.current);
    }

    /// Install the result of a pass: `next` replaces the current buffer and
    /// every cell set in `matched` is flagged as having values. Flags are
    /// never cleared.
    pub fn commit_pass(&mut self, next: Array3<f64>, matched: &Array2<bool>) -> Result<()> {
        if next.dim() != self.current.dim() || matched.dim() != self.has_values.dim() {
            let (height, width, _) = next.dim();
            return Err(Error::InvalidDimensions { width, height });
        }
        self.current = next;
        self.has_values
            .zip_mut_with(matched, |flag, &hit| *flag = *flag || hit);
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot < self.num_values {
            Ok(())
        } else {
            Err(Error::SlotOutOfRange {
                slot,
                num_values: self.num_values,
            })
        }
    }
}
