//! Output descriptor of a computation: shape, blocking factors and format.

use std::fmt;

use crate::error::{BlockError, Result};
use crate::indexing::BlockGeometry;

/// Physical file format of a matrix output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Text cell format (`row col value` per line).
    Text,
    /// Binary block or binary cell format.
    #[default]
    Binary,
    /// Matrix Market exchange format.
    MatrixMarket,
    /// Delimited text.
    Csv,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Text => "TEXT",
            Format::Binary => "BINARY",
            Format::MatrixMarket => "MM",
            Format::Csv => "CSV",
        };
        f.write_str(name)
    }
}

/// Shape, blocking and format of a matrix produced by one computation.
///
/// Unknown sizes are `-1`. Block dimensions of `0` or `-1` on both axes mean
/// the output is kept as individual cells rather than blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputParameters {
    blocked_representation: bool,
    rows: i64,
    cols: i64,
    nnz: i64,
    rows_in_block: i64,
    cols_in_block: i64,
    file_name: Option<String>,
    label: Option<String>,
    format: Format,
}

impl Default for OutputParameters {
    fn default() -> Self {
        Self {
            blocked_representation: true,
            rows: -1,
            cols: -1,
            nnz: -1,
            rows_in_block: -1,
            cols_in_block: -1,
            file_name: None,
            label: None,
            format: Format::Binary,
        }
    }
}

impl OutputParameters {
    /// Create a descriptor with the given dimensions.
    pub fn new(
        rows: i64,
        cols: i64,
        rows_in_block: i64,
        cols_in_block: i64,
        nnz: i64,
    ) -> Result<Self> {
        let mut params = Self::default();
        params.set_dimensions(rows, cols, rows_in_block, cols_in_block, nnz)?;
        Ok(params)
    }

    /// Set dimensions and derive whether the output is blocked.
    ///
    /// Leaves the descriptor unchanged on error.
    pub fn set_dimensions(
        &mut self,
        rows: i64,
        cols: i64,
        rows_in_block: i64,
        cols_in_block: i64,
        nnz: i64,
    ) -> Result<()> {
        let blocked = match (rows_in_block, cols_in_block) {
            (0, 0) | (-1, -1) => false,
            (r, c) if r > 0 && c > 0 => true,
            _ => {
                return Err(BlockError::InvalidBlocking {
                    rows_in_block,
                    cols_in_block,
                })
            }
        };
        self.rows = rows;
        self.cols = cols;
        self.nnz = nnz;
        self.rows_in_block = rows_in_block;
        self.cols_in_block = cols_in_block;
        self.blocked_representation = blocked;
        Ok(())
    }

    /// Set the output format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the output file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the output label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_blocked_representation(&self) -> bool {
        self.blocked_representation
    }

    pub fn rows(&self) -> i64 {
        self.rows
    }

    pub fn cols(&self) -> i64 {
        self.cols
    }

    pub fn nnz(&self) -> i64 {
        self.nnz
    }

    pub fn rows_in_block(&self) -> i64 {
        self.rows_in_block
    }

    pub fn cols_in_block(&self) -> i64 {
        self.cols_in_block
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Block geometry of a blocked output.
    pub fn geometry(&self) -> Result<BlockGeometry> {
        if !self.blocked_representation {
            return Err(BlockError::InvalidBlocking {
                rows_in_block: self.rows_in_block,
                cols_in_block: self.cols_in_block,
            });
        }
        BlockGeometry::new(self.rows, self.cols, self.rows_in_block, self.cols_in_block)
    }
}

impl fmt::Display for OutputParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={},cols={},nnz={},rowsInBlock={},colsInBlock={},isBlockedRepresentation={},format={},label={},filename={}",
            self.rows,
            self.cols,
            self.nnz,
            self.rows_in_block,
            self.cols_in_block,
            self.blocked_representation,
            self.format,
            self.label.as_deref().unwrap_or("null"),
            self.file_name.as_deref().unwrap_or("null"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_dimensions() {
        let p = OutputParameters::new(1000, 500, 100, 100, -1).unwrap();
        assert!(p.is_blocked_representation());
        let g = p.geometry().unwrap();
        assert_eq!(g.num_blocks(), (10, 5));
    }

    #[test]
    fn test_cell_dimensions() {
        let p = OutputParameters::new(10, 10, 0, 0, 5).unwrap();
        assert!(!p.is_blocked_representation());
        assert!(p.geometry().is_err());

        let p = OutputParameters::new(10, 10, -1, -1, 5).unwrap();
        assert!(!p.is_blocked_representation());
    }

    #[test]
    fn test_invalid_blocking_leaves_descriptor_unchanged() {
        let mut p = OutputParameters::new(10, 10, 2, 2, -1).unwrap();
        let err = p.set_dimensions(20, 20, 0, 5, -1).unwrap_err();
        assert!(matches!(
            err,
            BlockError::InvalidBlocking {
                rows_in_block: 0,
                cols_in_block: 5
            }
        ));
        assert_eq!(p.rows(), 10);
        assert_eq!(p.rows_in_block(), 2);
    }

    #[test]
    fn test_display() {
        let p = OutputParameters::new(4, 3, 2, 2, 7)
            .unwrap()
            .with_format(Format::Text)
            .with_label("X")
            .with_file_name("out/x");
        assert_eq!(
            p.to_string(),
            "rows=4,cols=3,nnz=7,rowsInBlock=2,colsInBlock=2,isBlockedRepresentation=true,format=TEXT,label=X,filename=out/x"
        );
    }
}
