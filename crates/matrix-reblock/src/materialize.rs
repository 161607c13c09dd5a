//! Construction of output blocks from buffered cells.

use std::collections::HashMap;

use matrix_block::{BlockCoord, BlockGeometry, MatrixBlock, SparsityRule};

/// Buffered cells as parallel slices of global rows, columns and values.
///
/// All three slices have the same length.
#[derive(Debug, Clone, Copy)]
pub struct CellSlices<'a> {
    /// 1-based global rows.
    pub rows: &'a [i64],
    /// 1-based global columns.
    pub cols: &'a [i64],
    /// Cell values.
    pub vals: &'a [f64],
}

/// Build one block per coordinate in `coords` and fill it with `cells`.
///
/// Every cell must fall into one of `coords`. Blocks are truncated at the
/// matrix boundary, and their storage is chosen by `rule` from the average
/// number of cells per block. Sparse blocks come back with sorted rows.
/// The result follows the order of `coords`.
pub fn materialize_blocks<R>(
    geometry: &BlockGeometry,
    coords: &[BlockCoord],
    cells: CellSlices<'_>,
    rule: &R,
) -> Vec<(BlockCoord, MatrixBlock)>
where
    R: SparsityRule + ?Sized,
{
    if coords.is_empty() {
        return Vec::new();
    }
    let estimated_nnz = cells.vals.len() / coords.len();

    let mut slots: HashMap<BlockCoord, usize> = HashMap::with_capacity(coords.len());
    let mut blocks: Vec<(BlockCoord, MatrixBlock)> = Vec::with_capacity(coords.len());
    for &coord in coords {
        let [rows, cols] = geometry.block_shape(coord);
        slots.insert(coord, blocks.len());
        blocks.push((
            coord,
            MatrixBlock::with_estimated_nnz(rows, cols, estimated_nnz, rule),
        ));
    }

    for k in 0..cells.vals.len() {
        let (r, c) = (cells.rows[k], cells.cols[k]);
        let coord = geometry.block_coord(r, c);
        let (i, j) = geometry.local_offset(r, c);
        let slot = slots[&coord];
        blocks[slot].1.append_value(i, j, cells.vals[k]);
    }

    for (_, block) in blocks.iter_mut() {
        if block.is_in_sparse_format() {
            block.sort_sparse_rows();
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_block::TurnPointRule;

    #[test]
    fn test_materialize_single_block() {
        let g = BlockGeometry::new(4, 4, 2, 2).unwrap();
        let rows = [1, 1, 2, 2];
        let cols = [1, 2, 1, 2];
        let vals = [5.0, 3.0, 1.0, 2.0];
        let cells = CellSlices { rows: &rows, cols: &cols, vals: &vals };

        let blocks = materialize_blocks(&g, &[BlockCoord::new(1, 1)], cells, &TurnPointRule::default());
        assert_eq!(blocks.len(), 1);
        let (coord, block) = &blocks[0];
        assert_eq!(*coord, BlockCoord::new(1, 1));
        assert_eq!(block.shape(), [2, 2]);
        assert_eq!(block.to_dense_vec(), vec![5.0, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_boundary_blocks_are_truncated() {
        let g = BlockGeometry::new(10, 5, 4, 4).unwrap();
        let rows = [10, 1];
        let cols = [5, 1];
        let vals = [1.0, 2.0];
        let cells = CellSlices { rows: &rows, cols: &cols, vals: &vals };
        let coords = [BlockCoord::new(1, 1), BlockCoord::new(3, 2)];

        let blocks = materialize_blocks(&g, &coords, cells, &TurnPointRule::default());
        assert_eq!(blocks[0].1.shape(), [4, 4]);
        assert_eq!(blocks[1].1.shape(), [2, 1]);
        assert_eq!(blocks[1].1.get(1, 0), 1.0);
    }

    #[test]
    fn test_sparse_blocks_are_sorted() {
        let g = BlockGeometry::new(100, 100, 100, 100).unwrap();
        let rows = [3, 3, 3];
        let cols = [50, 7, 20];
        let vals = [1.0, 2.0, 3.0];
        let cells = CellSlices { rows: &rows, cols: &cols, vals: &vals };

        let blocks = materialize_blocks(&g, &[BlockCoord::new(1, 1)], cells, &TurnPointRule::default());
        let block = &blocks[0].1;
        assert!(block.is_in_sparse_format());
        assert_eq!(block.sparse_rows().unwrap()[2].cols(), &[6, 19, 49]);
    }

    #[test]
    fn test_rule_is_injected() {
        let g = BlockGeometry::new(4, 4, 2, 2).unwrap();
        let rows = [1];
        let cols = [1];
        let vals = [1.0];
        let cells = CellSlices { rows: &rows, cols: &cols, vals: &vals };
        let always_sparse = |_: usize, _: usize, _: usize| true;

        let blocks = materialize_blocks(&g, &[BlockCoord::new(1, 1)], cells, &always_sparse);
        assert!(blocks[0].1.is_in_sparse_format());
    }
}
