//! Error types for matrix-reblock.

use matrix_block::BlockError;
use thiserror::Error;

/// Errors raised while buffering or flushing cells.
#[derive(Debug, Error)]
pub enum ReblockError {
    /// Invalid construction parameters.
    #[error("Invalid reblock buffer configuration: {message}")]
    Configuration { message: String },

    /// A cell was appended to a full buffer.
    #[error("Reblock buffer is full ({capacity} entries); flush before appending")]
    CapacityExceeded { capacity: usize },

    /// A cell lies outside the matrix.
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} matrix")]
    CellOutOfBounds {
        row: i64,
        col: i64,
        rows: i64,
        cols: i64,
    },

    /// The output sink rejected a write.
    #[error("Failed to write to output sink: {0}")]
    SinkWrite(#[from] std::io::Error),
}

impl From<BlockError> for ReblockError {
    fn from(err: BlockError) -> Self {
        ReblockError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Result type for reblocking operations.
pub type Result<T> = std::result::Result<T, ReblockError>;
