//! Error types for reconciliation and tiling.

use thiserror::Error;

/// Errors produced by the reconciliation and tiling engines.
#[derive(Error, Debug)]
pub enum ModelError {
    /// WKT parsing error on a value tagged `@wkt`.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Geometry with no usable extent (e.g. `POLYGON EMPTY`).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Grid cell codec failure (encode/decode).
    #[error("Cell codec error: {0}")]
    Cell(String),

    /// Resource tree recursion exceeded the configured depth limit.
    /// Self-referential input is rejected rather than followed.
    #[error("Resource tree deeper than {max} levels")]
    DepthExceeded { max: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for reconciliation and tiling operations.
pub type Result<T> = std::result::Result<T, ModelError>;
