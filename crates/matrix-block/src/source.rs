//! Read access to a block whose nonzeros are fed into a reblocking buffer.

use crate::block::MatrixBlock;

/// Read-only view of a block contributing values at some offset of a larger matrix.
///
/// Sparse sources are walked through [`sparse_nonzeros`](BlockSource::sparse_nonzeros),
/// dense sources cell by cell through [`dense_value`](BlockSource::dense_value).
pub trait BlockSource {
    /// Whether the block uses sparse storage.
    fn is_in_sparse_format(&self) -> bool;

    /// Number of rows.
    fn num_rows(&self) -> usize;

    /// Number of columns.
    fn num_cols(&self) -> usize;

    /// Stored nonzeros as `(row, col, value)` in row-major order.
    fn sparse_nonzeros(&self) -> Box<dyn Iterator<Item = (usize, usize, f64)> + '_>;

    /// Value at `(i, j)` of a dense block.
    fn dense_value(&self, i: usize, j: usize) -> f64;
}

impl BlockSource for MatrixBlock {
    fn is_in_sparse_format(&self) -> bool {
        MatrixBlock::is_in_sparse_format(self)
    }

    fn num_rows(&self) -> usize {
        MatrixBlock::num_rows(self)
    }

    fn num_cols(&self) -> usize {
        MatrixBlock::num_cols(self)
    }

    fn sparse_nonzeros(&self) -> Box<dyn Iterator<Item = (usize, usize, f64)> + '_> {
        self.iter_nonzeros()
    }

    fn dense_value(&self, i: usize, j: usize) -> f64 {
        self.get(i, j)
    }
}
