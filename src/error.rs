use thiserror::Error;

use crate::engine::Version;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("dataset is empty; a bounding box needs at least one point")]
    EmptyDataset,
    #[error("grid dimensions must be positive (xdim={xdim}, ydim={ydim})")]
    InvalidDimensions { xdim: usize, ydim: usize },
    #[error("cutoffs must be at least 1 (points={points}, cells={cells})")]
    InvalidCutoff { points: usize, cells: usize },
    #[error("invalid version argument {0:?} (expected -v1 .. -v6)")]
    UnknownVersion(String),
    #[error("version {0} is reserved and not implemented")]
    NotImplemented(Version),
}

pub type Result<T> = std::result::Result<T, PopulationError>;
