//! Field-to-RGBA rendering using color schemes.

use ndarray::ArrayView2;

use crate::scheme::{evaluate, ColorScheme, Rgb};

/// Parameters for colormap rendering.
#[derive(Debug, Clone)]
pub struct ColormapParams {
    /// Color scheme to use.
    pub scheme: ColorScheme,
    /// Minimum value for normalization. Values below this are clamped.
    pub min: f64,
    /// Maximum value for normalization. Values above this are clamped.
    pub max: f64,
    /// Color for cells without a value (RGBA). Default: fully transparent.
    pub nodata_color: [u8; 4],
}

impl ColormapParams {
    /// Params over `[0, 1]`; use [`auto_params`] to fit the range to data.
    pub fn new(scheme: ColorScheme) -> Self {
        Self::with_range(scheme, 0.0, 1.0)
    }

    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
        }
    }
}

/// Fit min/max to the finite values of `field`.
///
/// An empty or all-`NaN` field gets `[0, 1]`; a constant field gets
/// `[v, v + 1]`.
pub fn auto_params(field: ArrayView2<'_, f64>, scheme: ColorScheme) -> ColormapParams {
    let (mut min, mut max) = field
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        min = 0.0;
        max = 1.0;
    } else if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }

    ColormapParams::with_range(scheme, min, max)
}

/// Convert a `height × width` field (row 0 = southernmost) to an RGBA
/// pixel buffer with north at the top.
///
/// Returns `height * width * 4` bytes in image row-major order. Non-finite
/// values are rendered with `params.nodata_color`.
pub fn field_to_rgba(field: ArrayView2<'_, f64>, params: &ColormapParams) -> Vec<u8> {
    let (height, width) = field.dim();
    let range = params.max - params.min;
    let inv_range = if range.abs() > f64::EPSILON {
        1.0 / range
    } else {
        1.0
    };

    let mut rgba = Vec::with_capacity(height * width * 4);
    for row in field.rows().into_iter().rev() {
        for &v in row.iter() {
            if v.is_finite() {
                let Rgb { r, g, b } = evaluate(params.scheme, (v - params.min) * inv_range);
                rgba.extend_from_slice(&[r, g, b, 255]);
            } else {
                rgba.extend_from_slice(&params.nodata_color);
            }
        }
    }
    rgba
}
