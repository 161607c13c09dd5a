//! Values emitted to the output sink.

use matrix_block::MatrixBlock;

/// A single value at a local offset inside its destination block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialCell {
    /// Row offset inside the block (0-based).
    pub row: usize,
    /// Column offset inside the block (0-based).
    pub col: usize,
    /// Cell value.
    pub value: f64,
}

impl PartialCell {
    /// Cell at local offset `(row, col)`.
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Either a fully materialized block or one partial cell of a block.
#[derive(Debug, Clone)]
pub enum AdaptivePartialBlock {
    /// Binary block representation.
    Block(MatrixBlock),
    /// Binary cell representation.
    Cell(PartialCell),
}

impl AdaptivePartialBlock {
    /// Whether this is a materialized block.
    pub fn is_block(&self) -> bool {
        matches!(self, AdaptivePartialBlock::Block(_))
    }

    /// Number of values carried.
    pub fn nnz(&self) -> usize {
        match self {
            AdaptivePartialBlock::Block(block) => block.nnz(),
            AdaptivePartialBlock::Cell(_) => 1,
        }
    }

    /// Carried values as `(row, col, value)` local offsets.
    pub fn local_values(&self) -> Vec<(usize, usize, f64)> {
        match self {
            AdaptivePartialBlock::Block(block) => block.iter_nonzeros().collect(),
            AdaptivePartialBlock::Cell(cell) => vec![(cell.row, cell.col, cell.value)],
        }
    }
}

/// Payload tagged with the stream it belongs to.
#[derive(Debug, Clone)]
pub struct TaggedPartialBlock {
    tag: u8,
    value: AdaptivePartialBlock,
}

impl TaggedPartialBlock {
    /// Tag `value` with stream `tag`.
    pub fn new(tag: u8, value: AdaptivePartialBlock) -> Self {
        Self { tag, value }
    }

    /// Stream tag.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Tagged payload.
    pub fn value(&self) -> &AdaptivePartialBlock {
        &self.value
    }

    /// Split into tag and payload.
    pub fn into_parts(self) -> (u8, AdaptivePartialBlock) {
        (self.tag, self.value)
    }
}
