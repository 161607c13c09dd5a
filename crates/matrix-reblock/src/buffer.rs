//! Bounded cell buffer that flushes block-keyed output.

use log::{debug, trace, warn};
use matrix_block::{BlockCoord, BlockGeometry, BlockSource, OutputParameters, SparsityRule, TurnPointRule};

use crate::error::{ReblockError, Result};
use crate::materialize::{materialize_blocks, CellSlices};
use crate::payload::{AdaptivePartialBlock, PartialCell, TaggedPartialBlock};
use crate::selector::{distinct_blocks, select_representation, ReblockCostModel, Representation};
use crate::sink::OutputSink;

/// Default capacity: 5M cells, about 120MB of backing storage.
pub const DEFAULT_BUFFER_SIZE: usize = 5_000_000;

/// Summary of one non-empty flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushStats {
    /// Representation chosen for this flush.
    pub representation: Representation,
    /// Number of distinct destination blocks.
    pub blocks: usize,
    /// Number of buffered cells drained.
    pub cells: usize,
    /// Number of sink writes.
    pub writes: usize,
}

/// Accumulates `(row, col, value)` cells of one matrix and flushes them
/// grouped by destination block.
///
/// Rows and columns are 1-based global indices. The backing storage is
/// allocated once at construction and reused across flushes. Each flush picks
/// blocked or cell output with a [`ReblockCostModel`] and, for blocked output,
/// lets the [`SparsityRule`] pick each block's storage.
///
/// A flush that fails on a sink write leaves the buffer in an unspecified
/// state; call [`clear`](ReblockBuffer::clear) before reusing it.
///
/// # Example
///
/// ```
/// use matrix_block::BlockCoord;
/// use matrix_reblock::{AdaptivePartialBlock, ReblockBuffer};
///
/// let mut buffer = ReblockBuffer::new(4, 4, 4, 2, 2).unwrap();
/// buffer.append_cell(1, 1, 5.0).unwrap();
/// buffer.append_cell(2, 2, 2.0).unwrap();
///
/// let mut out = Vec::new();
/// buffer.flush(0, &mut out).unwrap();
///
/// assert_eq!(buffer.size(), 0);
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].0, BlockCoord::new(1, 1));
/// assert!(matches!(out[0].1.value(), AdaptivePartialBlock::Block(_)));
/// ```
#[derive(Debug)]
pub struct ReblockBuffer<R = TurnPointRule> {
    rows: Vec<i64>,
    cols: Vec<i64>,
    vals: Vec<f64>,
    count: usize,
    geometry: BlockGeometry,
    cost_model: ReblockCostModel,
    rule: R,
    flushes: u64,
}

impl ReblockBuffer<TurnPointRule> {
    /// Create a buffer holding up to `capacity` cells of a `rows x cols`
    /// matrix stored in `rows_in_block x cols_in_block` blocks.
    pub fn new(
        capacity: usize,
        rows: i64,
        cols: i64,
        rows_in_block: i64,
        cols_in_block: i64,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(ReblockError::Configuration {
                message: "buffer capacity must be positive".to_string(),
            });
        }
        let geometry = BlockGeometry::new(rows, cols, rows_in_block, cols_in_block)?;
        Ok(Self {
            rows: vec![0; capacity],
            cols: vec![0; capacity],
            vals: vec![0.0; capacity],
            count: 0,
            geometry,
            cost_model: ReblockCostModel::default(),
            rule: TurnPointRule::default(),
            flushes: 0,
        })
    }

    /// Create a buffer with [`DEFAULT_BUFFER_SIZE`] capacity.
    pub fn with_default_capacity(
        rows: i64,
        cols: i64,
        rows_in_block: i64,
        cols_in_block: i64,
    ) -> Result<Self> {
        Self::new(DEFAULT_BUFFER_SIZE, rows, cols, rows_in_block, cols_in_block)
    }

    /// Create a buffer for the output described by `params`.
    ///
    /// The output must use a blocked representation.
    pub fn from_output_parameters(params: &OutputParameters, capacity: usize) -> Result<Self> {
        if !params.is_blocked_representation() {
            return Err(ReblockError::Configuration {
                message: format!("output is not blocked: {}", params),
            });
        }
        Self::new(
            capacity,
            params.rows(),
            params.cols(),
            params.rows_in_block(),
            params.cols_in_block(),
        )
    }
}

impl<R: SparsityRule> ReblockBuffer<R> {
    /// Replace the cost model used to choose between blocked and cell output.
    pub fn with_cost_model(mut self, cost_model: ReblockCostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Replace the rule choosing dense or sparse storage for output blocks.
    pub fn with_sparsity_rule<R2: SparsityRule>(self, rule: R2) -> ReblockBuffer<R2> {
        ReblockBuffer {
            rows: self.rows,
            cols: self.cols,
            vals: self.vals,
            count: self.count,
            geometry: self.geometry,
            cost_model: self.cost_model,
            rule,
            flushes: self.flushes,
        }
    }

    /// Number of buffered cells.
    pub fn size(&self) -> usize {
        self.count
    }

    /// Maximum number of buffered cells.
    pub fn capacity(&self) -> usize {
        self.vals.len()
    }

    /// Whether no cells are buffered.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the next [`append_cell`](ReblockBuffer::append_cell) would fail.
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Block grid of the output matrix.
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// Cost model used to pick each flush's representation.
    pub fn cost_model(&self) -> &ReblockCostModel {
        &self.cost_model
    }

    /// Number of non-empty flushes performed so far.
    pub fn num_flushes(&self) -> u64 {
        self.flushes
    }

    /// Append one cell.
    ///
    /// Fails with [`ReblockError::CapacityExceeded`] when the buffer is full;
    /// flush first, or use [`append_cell_or_flush`](Self::append_cell_or_flush).
    pub fn append_cell(&mut self, row: i64, col: i64, value: f64) -> Result<()> {
        if self.is_full() {
            return Err(ReblockError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.push(row, col, value)
    }

    /// Append one cell, flushing to `sink` first if the buffer is full.
    pub fn append_cell_or_flush<S>(
        &mut self,
        row: i64,
        col: i64,
        value: f64,
        tag: u8,
        sink: &mut S,
    ) -> Result<()>
    where
        S: OutputSink + ?Sized,
    {
        if self.is_full() {
            trace!("reblock buffer full ({} cells), flushing before append", self.count);
            self.flush(tag, sink)?;
        }
        self.push(row, col, value)
    }

    /// Append every nonzero of `block`, placed with its top-left cell right
    /// after `row_offset` rows and `col_offset` columns.
    ///
    /// Local cell `(i, j)` lands at global `(row_offset + i + 1, col_offset + j + 1)`.
    /// Sparse blocks are walked in storage order, dense blocks row by row
    /// skipping zeros. The buffer is flushed to `sink` as soon as it fills up,
    /// so one call may flush several times.
    pub fn append_block<B, S>(
        &mut self,
        row_offset: i64,
        col_offset: i64,
        block: &B,
        tag: u8,
        sink: &mut S,
    ) -> Result<()>
    where
        B: BlockSource + ?Sized,
        S: OutputSink + ?Sized,
    {
        if self.is_full() {
            self.flush(tag, sink)?;
        }
        if block.is_in_sparse_format() {
            for (i, j, v) in block.sparse_nonzeros() {
                self.push_and_flush(row_offset + i as i64 + 1, col_offset + j as i64 + 1, v, tag, sink)?;
            }
        } else {
            for i in 0..block.num_rows() {
                for j in 0..block.num_cols() {
                    let v = block.dense_value(i, j);
                    if v != 0.0 {
                        self.push_and_flush(
                            row_offset + i as i64 + 1,
                            col_offset + j as i64 + 1,
                            v,
                            tag,
                            sink,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn push_and_flush<S>(&mut self, row: i64, col: i64, value: f64, tag: u8, sink: &mut S) -> Result<()>
    where
        S: OutputSink + ?Sized,
    {
        self.push(row, col, value)?;
        if self.is_full() {
            trace!("reblock buffer reached capacity {}, flushing", self.capacity());
            self.flush(tag, sink)?;
        }
        Ok(())
    }

    fn push(&mut self, row: i64, col: i64, value: f64) -> Result<()> {
        if !self.geometry.contains(row, col) {
            return Err(ReblockError::CellOutOfBounds {
                row,
                col,
                rows: self.geometry.rows(),
                cols: self.geometry.cols(),
            });
        }
        let k = self.count;
        self.rows[k] = row;
        self.cols[k] = col;
        self.vals[k] = value;
        self.count += 1;
        Ok(())
    }

    /// Emit all buffered cells to `sink`, grouped by destination block.
    ///
    /// Every payload carries `tag`. Returns `None` without touching the sink
    /// when the buffer is empty.
    pub fn flush<S>(&mut self, tag: u8, sink: &mut S) -> Result<Option<FlushStats>>
    where
        S: OutputSink + ?Sized,
    {
        let n = self.count;
        if n == 0 {
            return Ok(None);
        }
        let cells = CellSlices {
            rows: &self.rows[..n],
            cols: &self.cols[..n],
            vals: &self.vals[..n],
        };

        let coords = distinct_blocks(&self.geometry, cells.rows, cells.cols);
        let representation = select_representation(
            coords.len(),
            n,
            self.geometry.rows_in_block(),
            &self.cost_model,
        );
        debug!(
            "flushing {} cells into {} blocks as {:?} (tag {})",
            n,
            coords.len(),
            representation,
            tag
        );

        let writes = match representation {
            Representation::Blocked => {
                let blocks = materialize_blocks(&self.geometry, &coords, cells, &self.rule);
                let writes = blocks.len();
                for (coord, block) in blocks {
                    sink.collect(coord, TaggedPartialBlock::new(tag, AdaptivePartialBlock::Block(block)))?;
                }
                writes
            }
            Representation::Cell => {
                for k in 0..n {
                    let (r, c) = (cells.rows[k], cells.cols[k]);
                    let coord: BlockCoord = self.geometry.block_coord(r, c);
                    let (i, j) = self.geometry.local_offset(r, c);
                    let cell = PartialCell::new(i, j, cells.vals[k]);
                    sink.collect(coord, TaggedPartialBlock::new(tag, AdaptivePartialBlock::Cell(cell)))?;
                }
                n
            }
        };

        self.count = 0;
        self.flushes += 1;
        Ok(Some(FlushStats {
            representation,
            blocks: coords.len(),
            cells: n,
            writes,
        }))
    }

    /// Drop all buffered cells without emitting them.
    ///
    /// Needed to reuse a buffer after a failed flush.
    pub fn clear(&mut self) {
        if self.count > 0 {
            warn!("discarding {} buffered cells", self.count);
        }
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_block::MatrixBlock;

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            ReblockBuffer::new(0, 4, 4, 2, 2),
            Err(ReblockError::Configuration { .. })
        ));
        assert!(matches!(
            ReblockBuffer::new(4, 4, 4, 0, 2),
            Err(ReblockError::Configuration { .. })
        ));
        assert!(matches!(
            ReblockBuffer::new(4, 4, 4, 2, -3),
            Err(ReblockError::Configuration { .. })
        ));
    }

    #[test]
    fn test_append_cell_capacity() {
        let mut buffer = ReblockBuffer::new(2, 4, 4, 2, 2).unwrap();
        buffer.append_cell(1, 1, 1.0).unwrap();
        buffer.append_cell(1, 2, 1.0).unwrap();
        assert!(buffer.is_full());
        assert!(matches!(
            buffer.append_cell(2, 2, 1.0),
            Err(ReblockError::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(buffer.size(), 2);
    }

    #[test]
    fn test_append_cell_out_of_bounds() {
        let mut buffer = ReblockBuffer::new(2, 4, 4, 2, 2).unwrap();
        assert!(matches!(
            buffer.append_cell(0, 1, 1.0),
            Err(ReblockError::CellOutOfBounds { row: 0, .. })
        ));
        assert!(matches!(
            buffer.append_cell(1, 5, 1.0),
            Err(ReblockError::CellOutOfBounds { col: 5, .. })
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_append_cell_or_flush() {
        let mut buffer = ReblockBuffer::new(2, 4, 4, 2, 2).unwrap();
        let mut out = Vec::new();
        for (r, c) in [(1, 1), (1, 2), (2, 1)] {
            buffer.append_cell_or_flush(r, c, 1.0, 0, &mut out).unwrap();
        }
        assert_eq!(buffer.size(), 1);
        assert_eq!(buffer.num_flushes(), 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let mut buffer = ReblockBuffer::new(8, 4, 4, 2, 2).unwrap();
        let mut out = Vec::new();
        assert!(buffer.flush(1, &mut out).unwrap().is_none());
        assert!(out.is_empty());
        assert_eq!(buffer.size(), 0);
        assert_eq!(buffer.num_flushes(), 0);
    }

    #[test]
    fn test_cell_flush_tags_every_payload() {
        // 200 cells over 20 blocks: more than 16 blocks forces cell output
        let mut buffer = ReblockBuffer::new(1000, 40, 40, 2, 40).unwrap();
        for r in 1..=40 {
            for c in [1, 2, 3, 4, 5] {
                buffer.append_cell(r, c, (r * c) as f64).unwrap();
            }
        }
        let mut out = Vec::new();
        let stats = buffer.flush(7, &mut out).unwrap().unwrap();
        assert_eq!(stats.representation, Representation::Cell);
        assert_eq!(stats.blocks, 20);
        assert_eq!(stats.writes, 200);
        assert!(out.iter().all(|(_, p)| p.tag() == 7 && !p.value().is_block()));
    }

    #[test]
    fn test_flush_with_huge_block_height() {
        let mut buffer = ReblockBuffer::new(4, 10, 10, i64::MAX / 2, 10).unwrap();
        buffer.append_cell(1, 1, 1.0).unwrap();
        let mut out = Vec::new();
        let stats = buffer.flush(0, &mut out).unwrap().unwrap();
        assert_eq!(stats.representation, Representation::Cell);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, BlockCoord::new(1, 1));
    }

    #[test]
    fn test_append_sparse_block_with_offset() {
        let mut buffer = ReblockBuffer::new(16, 8, 8, 4, 4).unwrap();
        let source = MatrixBlock::from_triples(2, 2, &[(0, 1, 1.0), (1, 0, 2.0)]);
        let mut out = Vec::new();
        buffer.append_block(3, 3, &source, 0, &mut out).unwrap();

        assert_eq!(buffer.size(), 2);
        // (4, 5) -> block (1, 2); (5, 4) -> block (2, 1)
        buffer.flush(0, &mut out).unwrap();
        let mut coords: Vec<BlockCoord> = out.iter().map(|(c, _)| *c).collect();
        coords.sort();
        assert_eq!(coords, vec![BlockCoord::new(1, 2), BlockCoord::new(2, 1)]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ReblockBuffer::new(4, 4, 4, 2, 2).unwrap();
        buffer.append_cell(1, 1, 1.0).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_from_output_parameters() {
        let params = OutputParameters::new(100, 100, 10, 10, -1).unwrap();
        let buffer = ReblockBuffer::from_output_parameters(&params, 64).unwrap();
        assert_eq!(buffer.capacity(), 64);
        assert_eq!(buffer.geometry().rows_in_block(), 10);

        let cells = OutputParameters::new(100, 100, -1, -1, -1).unwrap();
        assert!(matches!(
            ReblockBuffer::from_output_parameters(&cells, 64),
            Err(ReblockError::Configuration { .. })
        ));
    }
}
