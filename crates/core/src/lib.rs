//! # csvgrid Core
//!
//! Core types, configuration and I/O for gridding scattered lat/lon samples.
//!
//! This crate provides:
//! - `GridSpec` / `ColumnLayout`: immutable run configuration
//! - `GridIndex`: cell geometry with longitude wrap-around
//! - `Grid`: per-cell value buffers and observation buckets
//! - `VariableAxis`: tag-driven discovery of variable slots
//! - Row sources, ingestion and delimited grid output

pub mod axis;
pub mod config;
pub mod error;
pub mod grid;
pub mod io;

pub use axis::{TagKey, VariableAxis};
pub use config::{CellAnchor, ColumnLayout, GridSpec};
pub use error::{Error, Result};
pub use grid::{Grid, GridIndex, Observation};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::axis::{TagKey, VariableAxis};
    pub use crate::config::{CellAnchor, ColumnLayout, GridSpec};
    pub use crate::error::{Error, Result};
    pub use crate::grid::{Grid, GridIndex, Observation};
    pub use crate::io::{DelimitedFile, IngestStats, MemorySource, RowSource, WriteOptions};
    pub use crate::Algorithm;
}

/// Core trait for grid algorithms.
///
/// Algorithms take their input and a parameter value and produce an output;
/// parameters carry every tunable so a run is reproducible from them alone.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
