use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading geometries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid WKT at offset {offset}: {message}")]
    InvalidWkt { offset: usize, message: String },

    #[error("Unexpected trailing input at offset {0}")]
    TrailingInput(usize),
}
