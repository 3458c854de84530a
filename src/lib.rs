//! Rectangular population queries over geocoded census blocks.
//!
//! Points are projected, enclosed in a bounding box, binned into a
//! `ydim x xdim` histogram and turned into a summed-area grid so a
//! rectangle of cells can be answered with four lookups.

pub mod census;
pub mod engine;
pub mod error;
pub mod grid;
pub mod parallel;
pub mod query;
pub mod runtime;

pub use census::{BoundingBox, Dataset, GeoPoint, TotalPopulationPolicy};
pub use engine::{PopulationIndex, Version};
pub use error::{PopulationError, Result};
pub use grid::{Grid, GridShape, HistogramBuilder, PartitionMerge, PrefixGrid, SequentialGrid, SharedLockedGrid};
pub use parallel::Cutoffs;
pub use query::{QueryAnswer, QueryEngine, QueryRect};
