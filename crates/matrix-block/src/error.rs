//! Error types for matrix-block.

use thiserror::Error;

/// Error type for block geometry, block construction and output descriptors.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Matrix or block dimensions are not usable.
    #[error("Invalid dimensions: {rows}x{cols} with {rows_in_block}x{cols_in_block} blocks")]
    InvalidGeometry {
        rows: i64,
        cols: i64,
        rows_in_block: i64,
        cols_in_block: i64,
    },

    /// Blocking factors of an output descriptor are inconsistent.
    #[error("Invalid values for blocking dimensions: [{rows_in_block},{cols_in_block}]")]
    InvalidBlocking {
        rows_in_block: i64,
        cols_in_block: i64,
    },

    /// Dense input data does not match the requested block shape.
    #[error("Data length {actual} does not match block shape {rows}x{cols} (expected {expected})")]
    DataLength {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result type for matrix-block operations.
pub type Result<T> = std::result::Result<T, BlockError>;
