//! # csvgrid Algorithms
//!
//! Objective analysis of scattered samples onto a `csvgrid_core::Grid`.
//!
//! ## Available algorithms
//!
//! - **barnes**: multi-pass Gaussian successive correction (Barnes 1964)

pub mod barnes;
pub(crate) mod maybe_rayon;

pub use barnes::{barnes, barnes_pass, barnes_with_progress, Barnes, BarnesParams, PassReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::barnes::{barnes, barnes_with_progress, Barnes, BarnesParams, PassReport};
    pub use csvgrid_core::prelude::*;
}
