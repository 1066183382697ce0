//! Error types for the simulation.

use crate::types::Coordinate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid coordinate {coordinate} for a {height}x{width} grid")]
    InvalidCoordinate {
        coordinate: Coordinate,
        height: u32,
        width: u32,
    },

    #[error("Cannot pick from an empty candidate set")]
    EmptyCandidateSet,

    #[error("Grid dimensions mismatch: expected {expected_height}x{expected_width}, got {height}x{width}")]
    DimensionMismatch {
        expected_height: u32,
        expected_width: u32,
        height: u32,
        width: u32,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
