//! Resizing: shape-preserving, destructive, and as another matrix

use super::SparseCompressedMatrix;
use super::core::{batched, compressed_groups, logical_numel, plain_groups};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::sparse::NnzPolicy;
use crate::tensor::Tensor;

impl<R: Runtime> SparseCompressedMatrix<R> {
    /// Resize to `shape` with `nnz` structurally nonzero elements per batch
    ///
    /// The existing compressed-index prefix is kept. When the compressed
    /// buffer grows, the appended entries are set to the new stored count;
    /// otherwise its last retained entry is overwritten with it. Plain
    /// indices and values are resized to the new stored count and their new
    /// content is unspecified.
    ///
    /// `shape` keeps the current dense-tail rank; the two dims before the
    /// tail are the structural `[rows, cols]`. The stored count is at most
    /// one entry per cell of the (block) grid. If `nnz` asks for more, the
    /// matrix's [`NnzPolicy`] decides between clamping and failing.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedOnSymbolicShape`] on a symbolic-shape matrix
    /// - [`Error::InvalidArgument`] if `shape` is too short or too large to
    ///   address, or if `nnz` exceeds the capacity under [`NnzPolicy::Reject`]
    pub fn resize(&mut self, nnz: usize, shape: &[usize]) -> Result<()> {
        self.ensure_concrete("resize")?;

        let dense_dim = self.dense_dim();
        if shape.len() < dense_dim + 2 {
            return Err(Error::invalid_argument(
                "shape",
                format!(
                    "resize needs rank at least {} to keep {dense_dim} dense dimensions, got {shape:?}",
                    dense_dim + 2
                ),
            ));
        }
        let numel = logical_numel(shape)?;
        let batch_dim = shape.len() - dense_dim - 2;
        let batch = &shape[..batch_dim];
        let structural = [shape[batch_dim], shape[batch_dim + 1]];
        let dense = &shape[batch_dim + 2..];

        let block = self.block_shape();
        let block_area = block.map_or(1, |[br, bc]| br * bc);

        // Bounded by rows * cols, which fits since numel did
        let groups = compressed_groups(self.layout, structural, block);
        let capacity = groups * plain_groups(self.layout, structural, block);
        let requested = nnz / block_area;
        let nse = if requested <= capacity {
            requested
        } else {
            let [rows, cols] = structural;
            match self.nnz_policy {
                NnzPolicy::Clamp => {
                    log::debug!(
                        target: "sparse_compressed",
                        "resize: clamping nnz {nnz} to {} for a {rows}x{cols} {} matrix",
                        capacity * block_area,
                        self.layout
                    );
                    capacity
                }
                NnzPolicy::Reject => {
                    return Err(Error::invalid_argument(
                        "nnz",
                        format!(
                            "{nnz} exceeds the {} storable elements of a {rows}x{cols} {} matrix",
                            capacity * block_area,
                            self.layout
                        ),
                    ));
                }
            }
        };

        let new_len = groups + 1;
        let old_len = self.compressed_indices.size(-1).unwrap_or(0);
        let mut values_tail = vec![nse];
        values_tail.extend(block.iter().flatten());
        values_tail.extend_from_slice(dense);

        // Size every buffer before committing any of them
        let mut compressed = self.compressed_indices.clone();
        let mut plain = self.plain_indices.clone();
        let mut values = self.values.clone();
        plain.resize_(&batched(batch, &[nse]))?;
        values.resize_(&batched(batch, &values_tail))?;
        compressed.resize_(&batched(batch, &[new_len]))?;
        if new_len > old_len {
            compressed
                .narrow(-1, old_len, new_len - old_len)?
                .fill_(nse as f64)?;
        } else {
            compressed.narrow(-1, groups, 1)?.fill_(nse as f64)?;
        }

        self.compressed_indices = compressed;
        self.plain_indices = plain;
        self.values = values;
        self.shape = shape.iter().copied().collect();
        self.numel = numel;
        Ok(())
    }

    /// Resize to `shape` and drop every stored entry
    ///
    /// `sparse_dim` counts the batch dims plus the two structural dims; the
    /// dims of `shape` after them form the dense tail (block layouts only).
    /// The compressed indices are zero-filled. Block layouts keep their
    /// current block shape.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedOnSymbolicShape`] on a symbolic-shape matrix
    /// - [`Error::InvalidArgument`] if `sparse_dim < 2`,
    ///   `shape.len() < sparse_dim`, or a dense tail is requested for a
    ///   non-block layout
    pub fn resize_and_clear(&mut self, sparse_dim: usize, shape: &[usize]) -> Result<()> {
        self.ensure_concrete("resize_and_clear")?;

        if sparse_dim < 2 {
            return Err(Error::invalid_argument(
                "sparse_dim",
                format!("must be at least 2, got {sparse_dim}"),
            ));
        }
        if shape.len() < sparse_dim {
            return Err(Error::invalid_argument(
                "shape",
                format!(
                    "length must be at least sparse dimensionality ({sparse_dim}), got {}",
                    shape.len()
                ),
            ));
        }

        let numel = logical_numel(shape)?;
        let batch_dim = sparse_dim - 2;
        let batch = &shape[..batch_dim];
        let structural = [shape[batch_dim], shape[batch_dim + 1]];
        let dense = &shape[batch_dim + 2..];
        if !dense.is_empty() && !self.layout.is_block() {
            return Err(Error::invalid_argument(
                "shape",
                format!(
                    "{} tensors cannot have dense dimensions, got {shape:?} with sparse_dim {sparse_dim}",
                    self.layout
                ),
            ));
        }

        // Block geometry comes from the current values
        let block = if self.layout.is_block() {
            let block = self.block_shape().ok_or_else(|| {
                Error::invalid_argument(
                    "values",
                    format!("no block dimensions in {:?}", self.values.shape()),
                )
            })?;
            Some(block)
        } else {
            None
        };

        let mut values_tail = vec![0];
        values_tail.extend(block.iter().flatten());
        values_tail.extend_from_slice(dense);

        let groups = compressed_groups(self.layout, structural, block);

        let mut compressed = self.compressed_indices.clone();
        let mut plain = self.plain_indices.clone();
        let mut values = self.values.clone();
        plain.resize_(&batched(batch, &[0]))?;
        values.resize_(&batched(batch, &values_tail))?;
        compressed.resize_(&batched(batch, &[groups + 1]))?;
        compressed.zero_()?;

        self.compressed_indices = compressed;
        self.plain_indices = plain;
        self.values = values;
        self.shape = shape.iter().copied().collect();
        self.numel = numel;
        Ok(())
    }

    /// Take on the layout and geometry of `source` with fresh buffers
    ///
    /// The new buffers match the shape, dtype and device of the source's
    /// buffers; their content is not copied.
    pub fn resize_as(&mut self, source: &Self) -> Result<()> {
        self.ensure_concrete("resize_as")?;

        let compressed_indices = Tensor::try_empty_like(&source.compressed_indices)?;
        let plain_indices = Tensor::try_empty_like(&source.plain_indices)?;
        let values = Tensor::try_empty_like(&source.values)?;

        self.set_layout(source.layout);
        self.compressed_indices = compressed_indices;
        self.plain_indices = plain_indices;
        self.values = values;
        self.shape = source.shape.clone();
        self.dtype = source.dtype;
        self.device = source.device.clone();
        self.numel = source.numel;
        Ok(())
    }
}
