//! Row sources, ingestion and grid output

mod field;
mod ingest;
mod source;
mod writer;

pub use field::read_field;
pub use ingest::{ingest, scan_extent, IngestStats, SourceExtent};
pub use source::{tokenize, DelimitedFile, MemorySource, RowSource};
pub use writer::{write_grid, write_tagged_grid, WriteOptions};
