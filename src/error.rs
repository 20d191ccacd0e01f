use std::fmt;

use reqwest::StatusCode;

/// Which half of a coordinate a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn limit(self) -> i32 {
        match self {
            Axis::Latitude => 90,
            Axis::Longitude => 180,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Axis::Latitude => write!(f, "latitude"),
            Axis::Longitude => write!(f, "longitude"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("{axis} incorrectly formatted: {token:?}")]
    Malformed { axis: Axis, token: String },
    #[error("{axis} out of range (-{limit} <= {axis} <= {limit}): {value}")]
    OutOfRange { axis: Axis, value: i64, limit: i32 },
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("no internet or feed unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
    #[error("malformed forecast: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed observation time {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
    #[error("forecast grid is empty")]
    EmptyGrid,
    #[error("forecast has no cell {index} (grid holds {len} cells)")]
    MissingCell { index: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}
