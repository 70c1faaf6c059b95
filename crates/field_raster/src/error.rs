//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, out-of-range grid access, size mismatches between rasters,
//! missing or duplicate channels, and malformed channel identifiers.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("coordinate ({x}, {y}) is outside raster bounds {size_x}x{size_y}")]
    OutOfRange {
        x: f64,
        y: f64,
        size_x: usize,
        size_y: usize,
    },

    #[error("raster size mismatch: expected {}x{}, found {}x{}", expected.0, expected.1, found.0, found.1)]
    SizeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("missing channel '{id}'")]
    MissingChannel { id: String },

    #[error("duplicate channel '{id}'")]
    DuplicateChannel { id: String },

    #[error("invalid channel identifier '{name}'")]
    InvalidIdentifier { name: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn out_of_range(x: f64, y: f64, size: (usize, usize)) -> Self {
        Error::OutOfRange {
            x,
            y,
            size_x: size.0,
            size_y: size.1,
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
