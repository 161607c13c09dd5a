//! Regrouping of matrix cells into block-keyed output.
//!
//! Computation stages often produce a matrix cell by cell, or as sub-blocks
//! placed at arbitrary offsets, while the shuffle stage downstream expects
//! values keyed by their destination block on the global block grid. A
//! [`ReblockBuffer`] sits in between: it buffers a bounded number of cells and
//! on every flush
//!
//! 1. collects the distinct destination blocks of the buffered cells,
//! 2. picks blocked or cell output with a [`ReblockCostModel`],
//! 3. for blocked output, materializes one boundary-truncated
//!    [`MatrixBlock`](matrix_block::MatrixBlock) per destination block,
//! 4. writes `(block coordinate, tagged payload)` pairs to an [`OutputSink`].
//!
//! # Example
//!
//! ```
//! use matrix_block::MatrixBlock;
//! use matrix_reblock::{CountingSink, ReblockBuffer};
//!
//! // 6x6 matrix in 3x3 blocks, room for 4 cells
//! let mut buffer = ReblockBuffer::new(4, 6, 6, 3, 3).unwrap();
//! let mut sink = CountingSink::new(Vec::new());
//!
//! // a dense 2x3 block placed at rows 3..=4, cols 2..=4
//! let source = MatrixBlock::from_dense(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! buffer.append_block(2, 1, &source, 0, &mut sink).unwrap();
//! buffer.flush(0, &mut sink).unwrap();
//!
//! assert_eq!(buffer.size(), 0);
//! assert_eq!(sink.values(), 6);
//! ```

mod buffer;
mod error;
mod materialize;
mod payload;
mod selector;
mod sink;

pub use buffer::{FlushStats, ReblockBuffer, DEFAULT_BUFFER_SIZE};
pub use error::{ReblockError, Result};
pub use materialize::{materialize_blocks, CellSlices};
pub use payload::{AdaptivePartialBlock, PartialCell, TaggedPartialBlock};
pub use selector::{distinct_blocks, select_representation, ReblockCostModel, Representation};
pub use sink::{absolute_values, CountingSink, OutputSink};
