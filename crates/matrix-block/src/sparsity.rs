//! Dense vs sparse storage decision for in-memory blocks.

/// Strategy deciding whether a block should use sparse storage.
///
/// Every place that allocates a [`MatrixBlock`](crate::MatrixBlock) from an
/// estimated number of nonzeros goes through one of these, so block
/// construction and reblocking agree on representation.
pub trait SparsityRule {
    /// Whether a `rows x cols` block holding about `nnz` nonzeros should be sparse.
    fn is_sparse_preferred(&self, rows: usize, cols: usize, nnz: usize) -> bool;
}

impl<F> SparsityRule for F
where
    F: Fn(usize, usize, usize) -> bool,
{
    fn is_sparse_preferred(&self, rows: usize, cols: usize, nnz: usize) -> bool {
        self(rows, cols, nnz)
    }
}

/// Sparsity threshold rule.
///
/// A block is kept sparse when its density `nnz / (rows * cols)` is below
/// `sparsity_turn_point`. Skinny blocks (at most `skinny_matrix_turn_point`
/// columns) are always dense since per-row overhead dominates there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnPointRule {
    /// Density below which sparse storage is used.
    pub sparsity_turn_point: f64,
    /// Blocks with at most this many columns are always dense.
    pub skinny_matrix_turn_point: usize,
}

impl Default for TurnPointRule {
    fn default() -> Self {
        Self {
            sparsity_turn_point: 0.4,
            skinny_matrix_turn_point: 4,
        }
    }
}

impl TurnPointRule {
    /// Set the density threshold.
    pub fn with_sparsity_turn_point(mut self, turn_point: f64) -> Self {
        self.sparsity_turn_point = turn_point;
        self
    }

    /// Set the column count up to which blocks are always dense.
    pub fn with_skinny_matrix_turn_point(mut self, cols: usize) -> Self {
        self.skinny_matrix_turn_point = cols;
        self
    }
}

impl SparsityRule for TurnPointRule {
    fn is_sparse_preferred(&self, rows: usize, cols: usize, nnz: usize) -> bool {
        if rows == 0 || cols <= self.skinny_matrix_turn_point {
            return false;
        }
        let sparsity = (nnz as f64 / rows as f64) / cols as f64;
        sparsity < self.sparsity_turn_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_point_defaults() {
        let rule = TurnPointRule::default();
        // 1000x1000 with 1000 nonzeros: very sparse
        assert!(rule.is_sparse_preferred(1000, 1000, 1000));
        // fully dense
        assert!(!rule.is_sparse_preferred(1000, 1000, 1_000_000));
        // exactly at the turn point is dense
        assert!(!rule.is_sparse_preferred(10, 10, 40));
        assert!(rule.is_sparse_preferred(10, 10, 39));
    }

    #[test]
    fn test_skinny_blocks_are_dense() {
        let rule = TurnPointRule::default();
        assert!(!rule.is_sparse_preferred(1000, 4, 1));
        assert!(rule.is_sparse_preferred(1000, 5, 1));
    }

    #[test]
    fn test_empty_block_is_dense() {
        assert!(!TurnPointRule::default().is_sparse_preferred(0, 100, 0));
    }

    #[test]
    fn test_closure_rule() {
        let always_sparse = |_: usize, _: usize, _: usize| true;
        assert!(always_sparse.is_sparse_preferred(1, 1, 1));
    }

    #[test]
    fn test_builder() {
        let rule = TurnPointRule::default()
            .with_sparsity_turn_point(0.1)
            .with_skinny_matrix_turn_point(0);
        assert!(!rule.is_sparse_preferred(10, 2, 2));
        assert!(rule.is_sparse_preferred(10, 2, 1));
    }
}
