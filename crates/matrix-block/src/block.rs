//! In-memory matrix block with dense or sparse storage.
//!
//! Dense storage uses mdarray's `DTensor<f64, 2>` in row-major order. Sparse
//! storage keeps one column/value list per row; appends do not keep a row
//! sorted, so callers that append out of order must finish with
//! [`MatrixBlock::sort_sparse_rows`].

use mdarray::DTensor;

use crate::error::{BlockError, Result};
use crate::sparsity::SparsityRule;

/// Owned 2D dense block data.
pub type DenseBlock = DTensor<f64, 2>;

/// Nonzeros of a single row of a sparse block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl SparseRow {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    /// Check if the row stores no entries.
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Column indices in storage order.
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Values in storage order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn push(&mut self, col: usize, value: f64) {
        self.cols.push(col);
        self.values.push(value);
    }

    /// Sort by column. For repeated columns the most recently appended value wins.
    fn sort(&mut self) {
        if self.cols.windows(2).all(|w| w[0] < w[1]) {
            return;
        }
        let mut entries: Vec<(usize, f64)> = self
            .cols
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect();
        // stable: equal columns keep append order
        entries.sort_by_key(|&(c, _)| c);

        self.cols.clear();
        self.values.clear();
        for (c, v) in entries {
            if self.cols.last() == Some(&c) {
                if let Some(last) = self.values.last_mut() {
                    *last = v;
                }
            } else {
                self.cols.push(c);
                self.values.push(v);
            }
        }
    }

    fn get(&self, col: usize) -> f64 {
        self.cols
            .iter()
            .rposition(|&c| c == col)
            .map_or(0.0, |k| self.values[k])
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Dense(DenseBlock),
    Sparse(Vec<SparseRow>),
}

/// A `rows x cols` matrix block.
#[derive(Debug, Clone)]
pub struct MatrixBlock {
    rows: usize,
    cols: usize,
    storage: Storage,
    nnz: usize,
}

impl MatrixBlock {
    /// Create an all-zero block with the requested storage.
    pub fn new(rows: usize, cols: usize, sparse: bool) -> Self {
        let storage = if sparse {
            Storage::Sparse(vec![SparseRow::default(); rows])
        } else {
            Storage::Dense(DenseBlock::from_elem([rows, cols], 0.0))
        };
        Self {
            rows,
            cols,
            storage,
            nnz: 0,
        }
    }

    /// Create an all-zero block, letting `rule` pick the storage for about `nnz` nonzeros.
    pub fn with_estimated_nnz<R>(rows: usize, cols: usize, nnz: usize, rule: &R) -> Self
    where
        R: SparsityRule + ?Sized,
    {
        Self::new(rows, cols, rule.is_sparse_preferred(rows, cols, nnz))
    }

    /// Create a dense block from row-major data.
    pub fn from_dense(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        let expected = rows * cols;
        if data.len() != expected {
            return Err(BlockError::DataLength {
                rows,
                cols,
                expected,
                actual: data.len(),
            });
        }
        let tensor = DenseBlock::from_fn([rows, cols], |idx| data[idx[0] * cols + idx[1]]);
        let nnz = data.iter().filter(|&&v| v != 0.0).count();
        Ok(Self {
            rows,
            cols,
            storage: Storage::Dense(tensor),
            nnz,
        })
    }

    /// Create a sparse block from `(row, col, value)` triples (any order).
    pub fn from_triples(rows: usize, cols: usize, triples: &[(usize, usize, f64)]) -> Self {
        let mut block = Self::new(rows, cols, true);
        for &(i, j, v) in triples {
            block.append_value(i, j, v);
        }
        block.sort_sparse_rows();
        block
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Shape `[rows, cols]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    /// Number of stored nonzeros.
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Check if the block holds no nonzeros.
    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    /// Whether the block uses sparse storage.
    pub fn is_in_sparse_format(&self) -> bool {
        matches!(self.storage, Storage::Sparse(_))
    }

    /// Rows of a sparse block, `None` for dense storage.
    pub fn sparse_rows(&self) -> Option<&[SparseRow]> {
        match &self.storage {
            Storage::Sparse(rows) => Some(rows),
            Storage::Dense(_) => None,
        }
    }

    /// Append a value at `(i, j)`.
    ///
    /// Zeros are ignored. On sparse storage the value is pushed to the end of
    /// row `i` without keeping the row sorted; call [`sort_sparse_rows`] once
    /// all values are in. On dense storage the value overwrites the cell.
    ///
    /// # Panics
    /// Panics if `(i, j)` is outside the block.
    ///
    /// [`sort_sparse_rows`]: MatrixBlock::sort_sparse_rows
    pub fn append_value(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            i < self.rows && j < self.cols,
            "Cell ({}, {}) out of bounds for {}x{} block",
            i,
            j,
            self.rows,
            self.cols
        );
        if value == 0.0 {
            return;
        }
        match &mut self.storage {
            Storage::Dense(tensor) => {
                if tensor[[i, j]] == 0.0 {
                    self.nnz += 1;
                }
                tensor[[i, j]] = value;
            }
            Storage::Sparse(rows) => {
                rows[i].push(j, value);
                self.nnz += 1;
            }
        }
    }

    /// Sort the entries of every sparse row by column.
    ///
    /// Repeated appends to the same cell collapse to the last value. No-op
    /// for dense storage.
    pub fn sort_sparse_rows(&mut self) {
        if let Storage::Sparse(rows) = &mut self.storage {
            for row in rows.iter_mut() {
                row.sort();
            }
            self.nnz = rows.iter().map(SparseRow::len).sum();
        }
    }

    /// Value at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.rows && j < self.cols,
            "Cell ({}, {}) out of bounds for {}x{} block",
            i,
            j,
            self.rows,
            self.cols
        );
        match &self.storage {
            Storage::Dense(tensor) => tensor[[i, j]],
            Storage::Sparse(rows) => rows[i].get(j),
        }
    }

    /// Iterate over nonzeros as `(row, col, value)` in row-major order.
    ///
    /// Sparse rows are visited in storage order.
    pub fn iter_nonzeros(&self) -> Box<dyn Iterator<Item = (usize, usize, f64)> + '_> {
        match &self.storage {
            Storage::Dense(tensor) => {
                let cols = self.cols;
                Box::new(
                    (0..self.rows * cols)
                        .map(move |k| (k / cols, k % cols, tensor[[k / cols, k % cols]]))
                        .filter(|&(_, _, v)| v != 0.0),
                )
            }
            Storage::Sparse(rows) => Box::new(rows.iter().enumerate().flat_map(|(i, row)| {
                row.cols
                    .iter()
                    .zip(row.values.iter())
                    .map(move |(&j, &v)| (i, j, v))
            })),
        }
    }

    /// Convert to a row-major dense `Vec`.
    pub fn to_dense_vec(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.rows * self.cols];
        for (i, j, v) in self.iter_nonzeros() {
            out[i * self.cols + j] = v;
        }
        out
    }
}
