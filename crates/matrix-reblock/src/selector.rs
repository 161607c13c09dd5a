//! Choice between blocked and cell output for one flush.

use std::collections::HashSet;

use matrix_block::{BlockCoord, BlockGeometry};

/// Output representation of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// One materialized block per destination coordinate.
    Blocked,
    /// One partial cell per buffered entry.
    Cell,
}

/// Size estimates driving [`select_representation`].
///
/// The constants are empirical byte costs: a blocked flush pays roughly
/// `block_entry_bytes` per block row for every destination block plus
/// `blocked_cell_bytes` per value, a cell flush pays `cell_bytes` per value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReblockCostModel {
    /// Maximum number of distinct destination blocks for the blocked path.
    pub block_threshold: usize,
    /// Worst-case bytes per block row of a materialized block.
    pub block_entry_bytes: u64,
    /// Bytes per value inside a materialized block.
    pub blocked_cell_bytes: u64,
    /// Bytes per emitted partial cell.
    pub cell_bytes: u64,
}

impl Default for ReblockCostModel {
    fn default() -> Self {
        Self {
            block_threshold: 16,
            block_entry_bytes: 4,
            blocked_cell_bytes: 12,
            cell_bytes: 24,
        }
    }
}

impl ReblockCostModel {
    /// Set the maximum number of destination blocks for blocked output.
    pub fn with_block_threshold(mut self, threshold: usize) -> Self {
        self.block_threshold = threshold;
        self
    }

    /// Estimated bytes of a blocked flush, saturating at `u64::MAX`.
    pub fn blocked_cost(&self, num_blocks: usize, count: usize, rows_in_block: i64) -> u64 {
        let rows_in_block = u64::try_from(rows_in_block).unwrap_or(0);
        (num_blocks as u64)
            .saturating_mul(rows_in_block)
            .saturating_mul(self.block_entry_bytes)
            .saturating_add(self.blocked_cell_bytes.saturating_mul(count as u64))
    }

    /// Estimated bytes of a cell flush, saturating at `u64::MAX`.
    pub fn cell_cost(&self, count: usize) -> u64 {
        self.cell_bytes.saturating_mul(count as u64)
    }
}

/// Decide the representation for `count` entries spread over `num_blocks` blocks.
///
/// Depends only on the two counts, the block height and the cost model.
pub fn select_representation(
    num_blocks: usize,
    count: usize,
    rows_in_block: i64,
    model: &ReblockCostModel,
) -> Representation {
    let blocked = num_blocks <= model.block_threshold
        && model.blocked_cost(num_blocks, count, rows_in_block) <= model.cell_cost(count);
    if blocked {
        Representation::Blocked
    } else {
        Representation::Cell
    }
}

/// Distinct destination blocks of the given cells, in ascending coordinate order.
pub fn distinct_blocks(geometry: &BlockGeometry, rows: &[i64], cols: &[i64]) -> Vec<BlockCoord> {
    let set: HashSet<BlockCoord> = rows
        .iter()
        .zip(cols.iter())
        .map(|(&r, &c)| geometry.block_coord(r, c))
        .collect();
    let mut coords: Vec<BlockCoord> = set.into_iter().collect();
    coords.sort_unstable();
    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block_is_blocked() {
        // 1*2*4 + 12*4 = 56 <= 96
        let model = ReblockCostModel::default();
        assert_eq!(select_representation(1, 4, 2, &model), Representation::Blocked);
    }

    #[test]
    fn test_too_many_blocks_is_cell() {
        let model = ReblockCostModel::default();
        assert_eq!(
            select_representation(17, 1_000_000, 2, &model),
            Representation::Cell
        );
        assert_eq!(
            select_representation(16, 1_000_000, 2, &model),
            Representation::Blocked
        );
    }

    #[test]
    fn test_sparse_flush_is_cell() {
        // a few cells scattered over tall blocks: 2*1000*4 + 12*10 > 24*10
        let model = ReblockCostModel::default();
        assert_eq!(select_representation(2, 10, 1000, &model), Representation::Cell);
    }

    #[test]
    fn test_cost_boundary_is_blocked() {
        // 1*3*4 + 12*1 = 24 == 24*1
        let model = ReblockCostModel::default();
        assert_eq!(model.blocked_cost(1, 1, 3), 24);
        assert_eq!(model.cell_cost(1), 24);
        assert_eq!(select_representation(1, 1, 3, &model), Representation::Blocked);
        assert_eq!(select_representation(1, 1, 4, &model), Representation::Cell);
    }

    #[test]
    fn test_cost_saturates_for_huge_blocks() {
        let model = ReblockCostModel::default();
        assert_eq!(model.blocked_cost(1, 1, i64::MAX / 2), u64::MAX);
        assert_eq!(model.blocked_cost(3, usize::MAX, i64::MAX), u64::MAX);
        assert_eq!(
            select_representation(1, 1, i64::MAX / 2, &model),
            Representation::Cell
        );
        assert_eq!(
            select_representation(1, 1, i64::MAX, &model),
            Representation::Cell
        );
    }

    #[test]
    fn test_custom_threshold() {
        let model = ReblockCostModel::default().with_block_threshold(0);
        assert_eq!(select_representation(1, 100, 1, &model), Representation::Cell);
    }

    #[test]
    fn test_distinct_blocks_is_order_independent() {
        let g = BlockGeometry::new(8, 8, 2, 2).unwrap();
        let rows = [1, 8, 2, 3, 1];
        let cols = [1, 8, 2, 1, 2];
        let a = distinct_blocks(&g, &rows, &cols);

        let rows_rev: Vec<i64> = rows.iter().rev().copied().collect();
        let cols_rev: Vec<i64> = cols.iter().rev().copied().collect();
        let b = distinct_blocks(&g, &rows_rev, &cols_rev);

        assert_eq!(a, b);
        assert_eq!(
            a,
            vec![BlockCoord::new(1, 1), BlockCoord::new(2, 1), BlockCoord::new(4, 4)]
        );
    }
}
