//! Output sink receiving block-keyed payloads.

use std::io;

use matrix_block::{BlockCoord, BlockGeometry};

use crate::payload::TaggedPartialBlock;

/// Key-value emission target of a flush.
///
/// A flush calls [`collect`](OutputSink::collect) once per materialized block
/// or once per cell. Implementations may block (e.g. under backpressure);
/// errors abort the flush and are returned to the caller unchanged.
pub trait OutputSink {
    fn collect(&mut self, ix: BlockCoord, value: TaggedPartialBlock) -> io::Result<()>;
}

impl OutputSink for Vec<(BlockCoord, TaggedPartialBlock)> {
    fn collect(&mut self, ix: BlockCoord, value: TaggedPartialBlock) -> io::Result<()> {
        self.push((ix, value));
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn collect(&mut self, ix: BlockCoord, value: TaggedPartialBlock) -> io::Result<()> {
        (**self).collect(ix, value)
    }
}

/// Sink wrapper counting what passes through.
#[derive(Debug, Default)]
pub struct CountingSink<S> {
    inner: S,
    blocks: usize,
    cells: usize,
    values: usize,
}

impl<S: OutputSink> CountingSink<S> {
    /// Wrap `inner` with all counters at zero.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            blocks: 0,
            cells: 0,
            values: 0,
        }
    }

    /// Number of block payloads written.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Number of cell payloads written.
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Total writes.
    pub fn writes(&self) -> usize {
        self.blocks + self.cells
    }

    /// Values carried by all payloads.
    pub fn values(&self) -> usize {
        self.values
    }

    /// Wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap, discarding the counters.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: OutputSink> OutputSink for CountingSink<S> {
    fn collect(&mut self, ix: BlockCoord, value: TaggedPartialBlock) -> io::Result<()> {
        let nnz = value.value().nnz();
        let is_block = value.value().is_block();
        self.inner.collect(ix, value)?;
        if is_block {
            self.blocks += 1;
        } else {
            self.cells += 1;
        }
        self.values += nnz;
        Ok(())
    }
}

/// Map emitted payloads back to global `(row, col, value)` triples.
pub fn absolute_values<'a, I>(geometry: &BlockGeometry, writes: I) -> Vec<(i64, i64, f64)>
where
    I: IntoIterator<Item = &'a (BlockCoord, TaggedPartialBlock)>,
{
    writes
        .into_iter()
        .flat_map(|(ix, payload)| {
            payload
                .value()
                .local_values()
                .into_iter()
                .map(move |(i, j, v)| {
                    let (r, c) = geometry.global_position(*ix, i, j);
                    (r, c, v)
                })
        })
        .collect()
}
