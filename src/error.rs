//! Error types for the kohonen3d engine.

use thiserror::Error;

/// The main error type for kohonen3d operations.
#[derive(Error, Debug)]
pub enum KohonenError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset file did not match its expected binary layout.
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// The dataset is inconsistent (e.g. images without labels).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(String),

    /// Training error.
    #[error("Training error: {0}")]
    Training(String),

    /// Empty input.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Feature vector length does not match the lattice input size.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The lattice input size.
        expected: usize,
        /// The offending vector length.
        actual: usize,
    },
}

/// Result type alias for kohonen3d operations.
pub type Result<T> = std::result::Result<T, KohonenError>;

impl From<serde_json::Error> for KohonenError {
    fn from(err: serde_json::Error) -> Self {
        KohonenError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for KohonenError {
    fn from(err: image::ImageError) -> Self {
        KohonenError::Image(err.to_string())
    }
}
