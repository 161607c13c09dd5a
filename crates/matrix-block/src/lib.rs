//! Matrix blocks on a global block grid.
//!
//! Large matrices are stored as a grid of fixed-size blocks. This crate holds
//! the pieces shared by every stage that produces or consumes such blocks:
//!
//! - [`BlockCoord`] and [`BlockGeometry`]: 1-based block coordinates, in-block
//!   offsets and boundary-truncated block shapes
//! - [`MatrixBlock`]: a block with dense (mdarray) or sparse (per-row) storage
//! - [`SparsityRule`]: the dense/sparse storage decision, shared engine-wide
//! - [`BlockSource`]: read access to a block feeding values elsewhere
//! - [`OutputParameters`]: the output descriptor of a computation
//!
//! # Example
//!
//! ```
//! use matrix_block::{BlockCoord, BlockGeometry, MatrixBlock};
//!
//! // 10x10 matrix in 4x4 blocks: the last block row is only 2 rows high
//! let geometry = BlockGeometry::new(10, 10, 4, 4).unwrap();
//! let coord = geometry.block_coord(9, 1);
//! assert_eq!(coord, BlockCoord::new(3, 1));
//! assert_eq!(geometry.block_shape(coord), [2, 4]);
//!
//! let mut block = MatrixBlock::new(2, 4, false);
//! let (i, j) = geometry.local_offset(9, 1);
//! block.append_value(i, j, 1.5);
//! assert_eq!(block.get(0, 0), 1.5);
//! ```

mod block;
mod error;
mod indexing;
mod params;
mod source;
mod sparsity;

pub use block::{DenseBlock, MatrixBlock, SparseRow};
pub use error::{BlockError, Result};
pub use indexing::{block_extent, block_index, index_in_block, num_blocks, BlockCoord, BlockGeometry};
pub use params::{Format, OutputParameters};
pub use source::BlockSource;
pub use sparsity::{SparsityRule, TurnPointRule};
