//! Block-grid arithmetic for 1-based global cell indices.
//!
//! A matrix of `rows x cols` cells is cut into a grid of blocks of
//! `rows_in_block x cols_in_block` cells. Global indices and block indices
//! are 1-based, offsets inside a block are 0-based. The last block along an
//! axis is truncated when the axis length is not a multiple of the block size.

use std::fmt;

use crate::error::{BlockError, Result};

/// Block index (1-based) that contains the global index `index` (1-based).
#[inline]
pub fn block_index(index: i64, block_len: i64) -> i64 {
    (index - 1) / block_len + 1
}

/// Zero-based offset of the global index `index` inside its block.
#[inline]
pub fn index_in_block(index: i64, block_len: i64) -> usize {
    ((index - 1) % block_len) as usize
}

/// Extent of block `block_idx` along an axis of length `total`.
///
/// Equal to `block_len` except for the trailing block, which holds the remainder.
#[inline]
pub fn block_extent(total: i64, block_idx: i64, block_len: i64) -> usize {
    block_len.min(total - (block_idx - 1) * block_len).max(0) as usize
}

/// Number of blocks needed to cover an axis of length `total`.
#[inline]
pub fn num_blocks(total: i64, block_len: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + block_len - 1) / block_len
    }
}

/// Destination coordinate of a block in the global block grid (1-based).
///
/// Plain value type: equality, hashing and ordering are by `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCoord {
    row: i64,
    col: i64,
}

impl BlockCoord {
    /// Create a coordinate from 1-based block indices.
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Coordinate of the block containing global cell `(row, col)`.
    #[inline]
    pub fn of_cell(row: i64, col: i64, rows_in_block: i64, cols_in_block: i64) -> Self {
        Self {
            row: block_index(row, rows_in_block),
            col: block_index(col, cols_in_block),
        }
    }

    /// Block row index (1-based).
    #[inline]
    pub const fn row(&self) -> i64 {
        self.row
    }

    /// Block column index (1-based).
    #[inline]
    pub const fn col(&self) -> i64 {
        self.col
    }
}

impl fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Matrix shape together with its blocking factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    rows: i64,
    cols: i64,
    rows_in_block: i64,
    cols_in_block: i64,
}

impl BlockGeometry {
    /// Create a geometry for a `rows x cols` matrix with the given block size.
    ///
    /// Block dimensions must be positive and matrix dimensions non-negative.
    pub fn new(rows: i64, cols: i64, rows_in_block: i64, cols_in_block: i64) -> Result<Self> {
        if rows_in_block <= 0 || cols_in_block <= 0 || rows < 0 || cols < 0 {
            return Err(BlockError::InvalidGeometry {
                rows,
                cols,
                rows_in_block,
                cols_in_block,
            });
        }
        Ok(Self {
            rows,
            cols,
            rows_in_block,
            cols_in_block,
        })
    }

    /// Total number of rows.
    #[inline]
    pub const fn rows(&self) -> i64 {
        self.rows
    }

    /// Total number of columns.
    #[inline]
    pub const fn cols(&self) -> i64 {
        self.cols
    }

    /// Rows per block.
    #[inline]
    pub const fn rows_in_block(&self) -> i64 {
        self.rows_in_block
    }

    /// Columns per block.
    #[inline]
    pub const fn cols_in_block(&self) -> i64 {
        self.cols_in_block
    }

    /// Whether the 1-based global cell `(row, col)` lies inside the matrix.
    #[inline]
    pub fn contains(&self, row: i64, col: i64) -> bool {
        (1..=self.rows).contains(&row) && (1..=self.cols).contains(&col)
    }

    /// Block coordinate of global cell `(row, col)`.
    #[inline]
    pub fn block_coord(&self, row: i64, col: i64) -> BlockCoord {
        BlockCoord::of_cell(row, col, self.rows_in_block, self.cols_in_block)
    }

    /// Offset of global cell `(row, col)` inside its block.
    #[inline]
    pub fn local_offset(&self, row: i64, col: i64) -> (usize, usize) {
        (
            index_in_block(row, self.rows_in_block),
            index_in_block(col, self.cols_in_block),
        )
    }

    /// Shape of the block at `coord`, truncated at the matrix boundary.
    pub fn block_shape(&self, coord: BlockCoord) -> [usize; 2] {
        [
            block_extent(self.rows, coord.row(), self.rows_in_block),
            block_extent(self.cols, coord.col(), self.cols_in_block),
        ]
    }

    /// Global 1-based position of local offset `(i, j)` in block `coord`.
    #[inline]
    pub fn global_position(&self, coord: BlockCoord, i: usize, j: usize) -> (i64, i64) {
        (
            (coord.row() - 1) * self.rows_in_block + i as i64 + 1,
            (coord.col() - 1) * self.cols_in_block + j as i64 + 1,
        )
    }

    /// Number of blocks along rows and columns.
    pub fn num_blocks(&self) -> (i64, i64) {
        (
            num_blocks(self.rows, self.rows_in_block),
            num_blocks(self.cols, self.cols_in_block),
        )
    }
}
