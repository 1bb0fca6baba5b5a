//! Compressed layout family definitions

/// Structural axis whose coordinates are compressed into group pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedAxis {
    /// Rows are compressed; plain indices hold columns
    Row,
    /// Columns are compressed; plain indices hold rows
    Column,
}

impl CompressedAxis {
    /// Position of this axis among the two structural dims (0 = rows, 1 = columns)
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            CompressedAxis::Row => 0,
            CompressedAxis::Column => 1,
        }
    }

    /// Position of the other structural axis
    #[inline]
    pub fn plain_index(&self) -> usize {
        1 - self.index()
    }
}

/// Sparse compressed storage layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedLayout {
    /// Compressed Sparse Row
    ///
    /// Row pointers + column indices + values.
    /// Storage: O(2 * nnz + nrows + 1)
    Csr,

    /// Compressed Sparse Column
    ///
    /// Column pointers + row indices + values.
    /// Storage: O(2 * nnz + ncols + 1)
    Csc,

    /// Block Compressed Sparse Row
    ///
    /// CSR over a grid of dense blocks; every stored entry is a whole block.
    /// Storage: O(2 * nse + nrows / block_rows + 1 + nnz)
    Bsr,

    /// Block Compressed Sparse Column
    ///
    /// CSC over a grid of dense blocks.
    /// Storage: O(2 * nse + ncols / block_cols + 1 + nnz)
    Bsc,
}

impl CompressedLayout {
    /// Every layout of the family
    pub const ALL: [CompressedLayout; 4] = [
        CompressedLayout::Csr,
        CompressedLayout::Csc,
        CompressedLayout::Bsr,
        CompressedLayout::Bsc,
    ];

    /// Which structural axis is compressed
    #[inline]
    pub fn compressed_axis(&self) -> CompressedAxis {
        match self {
            CompressedLayout::Csr | CompressedLayout::Bsr => CompressedAxis::Row,
            CompressedLayout::Csc | CompressedLayout::Bsc => CompressedAxis::Column,
        }
    }

    /// Returns true for block layouts, whose values carry a dense block per entry
    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, CompressedLayout::Bsr | CompressedLayout::Bsc)
    }

    /// Block edge that divides the compressed group count
    ///
    /// `Some(0)` (block rows) for BSR, `Some(1)` (block columns) for BSC,
    /// `None` for non-block layouts.
    #[inline]
    pub fn block_edge_index(&self) -> Option<usize> {
        if self.is_block() {
            Some(self.compressed_axis().index())
        } else {
            None
        }
    }

    /// Returns the layout name in camel case ("Csr", ...)
    pub fn name(&self) -> &'static str {
        match self {
            CompressedLayout::Csr => "Csr",
            CompressedLayout::Csc => "Csc",
            CompressedLayout::Bsr => "Bsr",
            CompressedLayout::Bsc => "Bsc",
        }
    }

    /// Returns the layout name in upper case ("CSR", ...)
    pub fn upper_name(&self) -> &'static str {
        match self {
            CompressedLayout::Csr => "CSR",
            CompressedLayout::Csc => "CSC",
            CompressedLayout::Bsr => "BSR",
            CompressedLayout::Bsc => "BSC",
        }
    }

    /// Conventional name of the compressed index buffer
    pub fn compressed_indices_name(&self) -> &'static str {
        match self.compressed_axis() {
            CompressedAxis::Row => "crow_indices",
            CompressedAxis::Column => "ccol_indices",
        }
    }

    /// Conventional name of the plain index buffer
    pub fn plain_indices_name(&self) -> &'static str {
        match self.compressed_axis() {
            CompressedAxis::Row => "col_indices",
            CompressedAxis::Column => "row_indices",
        }
    }
}

impl std::fmt::Display for CompressedLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.upper_name())
    }
}
