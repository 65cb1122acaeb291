//! Source observations attached to grid cells

/// Coordinates closer than this (in degrees, per axis) are the same point.
pub const COORD_EPSILON: f64 = 1e-9;

/// A geo-tagged sample with one value per variable slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub lat: f64,
    pub lon: f64,
    pub values: Vec<f64>,
}

impl Observation {
    pub fn new(lat: f64, lon: f64, values: Vec<f64>) -> Self {
        Self { lat, lon, values }
    }

    /// An observation with every slot set to zero.
    pub fn zeroed(lat: f64, lon: f64, num_values: usize) -> Self {
        Self::new(lat, lon, vec![0.0; num_values])
    }

    /// Whether this observation sits at `(lat, lon)`.
    #[inline]
    pub fn is_at(&self, lat: f64, lon: f64) -> bool {
        (self.lat - lat).abs() <= COORD_EPSILON && (self.lon - lon).abs() <= COORD_EPSILON
    }
}
