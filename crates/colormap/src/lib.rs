//! # csvgrid Colormap
//!
//! Color mapping and PNG rendering of gridded fields.
//!
//! The main entry point is [`field_to_rgba`], which turns one slot of a grid
//! (see `csvgrid_core::Grid::field`) into an RGBA buffer with north at the
//! top, ready for [`write_png`].
//!
//! ## Usage
//!
//! ```ignore
//! use csvgrid_colormap::{auto_params, field_to_rgba, write_png, ColorScheme};
//!
//! let field = grid.field(0)?;
//! let params = auto_params(field.view(), ColorScheme::Viridis);
//! let rgba = field_to_rgba(field.view(), &params);
//! write_png(&rgba, grid.width(), grid.height(), "out.png")?;
//! ```

mod output;
mod render;
mod scheme;

pub use output::{png_bytes, write_png};
pub use render::{auto_params, field_to_rgba, ColormapParams};
pub use scheme::{evaluate, ColorScheme, ColorStop, Rgb};
