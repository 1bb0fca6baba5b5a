//! Core compressed sparse implementation: struct, creation, getters

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use crate::sparse::{CompressedContext, CompressedLayout, DispatchKey, NnzPolicy};
use crate::tensor::{Layout, Shape, Tensor};

/// Batched sparse matrix in one of the compressed layouts (CSR, CSC, BSR, BSC)
///
/// Three buffers describe the structure:
/// - `compressed_indices` (`crow_indices` / `ccol_indices`): shape
///   `batch + [groups + 1]`, a running count of stored entries per group
/// - `plain_indices` (`col_indices` / `row_indices`): shape `batch + [nse]`
/// - `values`: shape `batch + [nse] + block + dense`, where `block` is
///   present for BSR/BSC only
///
/// The logical shape is `batch + [rows, cols] + dense`; a dense tail is only
/// legal for block layouts. Every public mutator validates before writing,
/// so a failed call leaves the matrix untouched.
#[derive(Debug, Clone)]
pub struct SparseCompressedMatrix<R: Runtime> {
    pub(crate) layout: CompressedLayout,
    pub(crate) compressed_indices: Tensor<R>,
    pub(crate) plain_indices: Tensor<R>,
    pub(crate) values: Tensor<R>,
    pub(crate) shape: Shape,
    pub(crate) dtype: DType,
    pub(crate) device: R::Device,
    pub(crate) numel: usize,
    pub(crate) symbolic_shape: bool,
    pub(crate) nnz_policy: NnzPolicy,
}

impl<R: Runtime> SparseCompressedMatrix<R> {
    /// Create an empty matrix of shape `[0, 0]` on the device registered for `key`
    ///
    /// The compressed indices hold the single entry `[0]`; plain indices and
    /// values hold no entries. Block layouts get a 1x1 placeholder block so
    /// that block geometry can always be read back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeviceTag`] if `key` does not resolve through
    /// the context's device map.
    pub fn empty(
        ctx: &CompressedContext<R>,
        key: DispatchKey,
        layout: CompressedLayout,
        dtype: DType,
    ) -> Result<Self> {
        let device = ctx.devices().resolve(key)?;
        let index_dtype = DType::default_int();

        let compressed_indices = Tensor::try_zeros(&[1], index_dtype, device)?;
        let plain_indices = Tensor::try_empty(&[0], index_dtype, device)?;
        let values_shape: &[usize] = if layout.is_block() { &[0, 1, 1] } else { &[0] };
        let values = Tensor::try_empty(values_shape, dtype, device)?;

        Self::new(
            ctx,
            compressed_indices,
            plain_indices,
            values,
            &[0, 0],
            layout,
        )
    }

    /// Create a matrix from its three buffers
    ///
    /// The value type and device of the matrix are taken from `values`.
    ///
    /// # Arguments
    ///
    /// * `compressed_indices` - `batch + [groups + 1]`, I32 or I64
    /// * `plain_indices` - `batch + [nse]`, same dtype as `compressed_indices`
    /// * `values` - `batch + [nse] + block + dense`
    /// * `shape` - logical shape `batch + [rows, cols] + dense`
    /// * `layout` - which compressed layout the buffers encode
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the buffers do not share one device ([`Error::DeviceMismatch`])
    /// - the index dtypes are not a matching I32/I64 pair ([`Error::TypeMismatch`])
    /// - `shape` has rank below 2, or a dense tail on a non-block layout
    /// - a buffer shape disagrees with `shape` and `layout`
    ///
    /// The content of the index buffers is not inspected; use
    /// [`Self::validate_structure`] for that.
    pub fn new(
        ctx: &CompressedContext<R>,
        compressed_indices: Tensor<R>,
        plain_indices: Tensor<R>,
        values: Tensor<R>,
        shape: &[usize],
        layout: CompressedLayout,
    ) -> Result<Self> {
        check_members(
            layout,
            &compressed_indices,
            &plain_indices,
            &values,
            shape,
        )?;
        let numel = logical_numel(shape)?;

        ctx.notice().emit(layout);

        let dtype = values.dtype();
        let device = values.device().clone();
        Ok(Self {
            layout,
            compressed_indices,
            plain_indices,
            values,
            shape: shape.iter().copied().collect(),
            dtype,
            device,
            numel,
            symbolic_shape: false,
            nnz_policy: ctx.nnz_policy(),
        })
    }

    /// Create a non-batched matrix from host slices
    ///
    /// `block_shape` must be given for BSR/BSC and omitted otherwise.
    /// `values` holds `nse` entries (times the block area for block layouts),
    /// where `nse = plain_indices.len()`. The index structure is validated
    /// after upload.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // [[1, 0, 2],
    /// //  [0, 0, 3]]
    /// let csr = SparseCompressedMatrix::<CpuRuntime>::from_slices(
    ///     &ctx,
    ///     &[0i64, 2, 3],
    ///     &[0i64, 2, 2],
    ///     &[1.0f32, 2.0, 3.0],
    ///     [2, 3],
    ///     None,
    ///     CompressedLayout::Csr,
    ///     &device,
    /// )?;
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn from_slices<I: Element, T: Element>(
        ctx: &CompressedContext<R>,
        compressed_indices: &[I],
        plain_indices: &[I],
        values: &[T],
        shape: [usize; 2],
        block_shape: Option<[usize; 2]>,
        layout: CompressedLayout,
        device: &R::Device,
    ) -> Result<Self> {
        let nse = plain_indices.len();
        let values_shape = match (layout.is_block(), block_shape) {
            (true, Some([br, bc])) => vec![nse, br, bc],
            (false, None) => vec![nse],
            (true, None) => {
                return Err(Error::invalid_argument(
                    "block_shape",
                    format!("{layout} tensors need a block shape"),
                ));
            }
            (false, Some(_)) => {
                return Err(Error::invalid_argument(
                    "block_shape",
                    format!("{layout} tensors do not have blocks"),
                ));
            }
        };

        let compressed = Tensor::try_from_slice(
            compressed_indices,
            &[compressed_indices.len()],
            device,
        )?;
        let plain = Tensor::try_from_slice(plain_indices, &[nse], device)?;
        let values = Tensor::try_from_slice(values, &values_shape, device)?;

        let matrix = Self::new(ctx, compressed, plain, values, &shape, layout)?;
        matrix.validate_structure()?;
        Ok(matrix)
    }

    // ===== Accessors =====

    /// Returns the compressed layout
    #[inline]
    pub fn layout(&self) -> CompressedLayout {
        self.layout
    }

    /// Returns the compressed index buffer (`crow_indices` / `ccol_indices`)
    #[inline]
    pub fn compressed_indices(&self) -> &Tensor<R> {
        &self.compressed_indices
    }

    /// Returns the plain index buffer (`col_indices` / `row_indices`)
    #[inline]
    pub fn plain_indices(&self) -> &Tensor<R> {
        &self.plain_indices
    }

    /// Returns the values buffer
    #[inline]
    pub fn values(&self) -> &Tensor<R> {
        &self.values
    }

    /// Returns the logical shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the declared value type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the device all three buffers live on
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.device
    }

    /// Number of logical (dense) elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Number of leading batch dimensions
    #[inline]
    pub fn batch_dim(&self) -> usize {
        self.compressed_indices.ndim().saturating_sub(1)
    }

    /// Number of trailing dense dimensions
    #[inline]
    pub fn dense_dim(&self) -> usize {
        self.shape.len().saturating_sub(self.sparse_dim())
    }

    /// Batch dimensions plus the two structural dimensions
    #[inline]
    pub fn sparse_dim(&self) -> usize {
        self.batch_dim() + 2
    }

    /// Block shape `[block_rows, block_cols]` for BSR/BSC
    pub fn block_shape(&self) -> Option<[usize; 2]> {
        if !self.layout.is_block() {
            return None;
        }
        let first = self.batch_dim() + 1;
        match self.values.shape().get(first..first + 2) {
            Some(&[rows, cols]) => Some([rows, cols]),
            _ => None,
        }
    }

    /// Stored entries per batch, in block units for block layouts
    #[inline]
    pub fn nse(&self) -> usize {
        self.plain_indices.size(-1).unwrap_or(0)
    }

    /// Structurally nonzero elements per batch, in dense-element units
    pub fn nnz(&self) -> usize {
        let block_area = self.block_shape().map_or(1, |[rows, cols]| rows * cols);
        self.nse() * block_area
    }

    /// Returns the dtype shared by both index buffers
    #[inline]
    pub fn index_dtype(&self) -> DType {
        self.compressed_indices.dtype()
    }

    /// Returns the nnz policy applied by [`Self::resize`]
    #[inline]
    pub fn nnz_policy(&self) -> NnzPolicy {
        self.nnz_policy
    }

    /// Returns true if the shape is symbolic rather than concrete
    #[inline]
    pub fn has_symbolic_shape(&self) -> bool {
        self.symbolic_shape
    }

    /// Mark the shape as symbolic
    ///
    /// Resizing and member replacement refuse to run afterwards.
    pub fn mark_symbolic_shape(&mut self) {
        self.symbolic_shape = true;
    }

    /// Replace the layout tag without touching the buffers
    pub(crate) fn set_layout(&mut self, layout: CompressedLayout) {
        self.layout = layout;
    }

    /// Name of this tensor implementation
    pub fn type_name(&self) -> &'static str {
        "SparseCompressedMatrix"
    }

    /// Returns the memory usage of the three buffers in bytes
    pub fn memory_usage(&self) -> usize {
        self.compressed_indices.size_in_bytes()
            + self.plain_indices.size_in_bytes()
            + self.values.size_in_bytes()
    }

    /// Refuse `op` on a symbolic-shape matrix
    pub(super) fn ensure_concrete(&self, op: &'static str) -> Result<()> {
        if self.symbolic_shape {
            return Err(Error::UnsupportedOnSymbolicShape { op });
        }
        Ok(())
    }
}

/// Number of compressed groups for the structural dims `[rows, cols]`
///
/// Block layouts count groups in blocks along the compressed axis.
pub(super) fn compressed_groups(
    layout: CompressedLayout,
    structural: [usize; 2],
    block: Option<[usize; 2]>,
) -> usize {
    let groups = structural[layout.compressed_axis().index()];
    match (layout.block_edge_index(), block) {
        (Some(edge), Some(block)) => groups / block[edge],
        _ => groups,
    }
}

/// Number of plain-axis blocks (or elements) that fit across the plain dim
pub(super) fn plain_groups(
    layout: CompressedLayout,
    structural: [usize; 2],
    block: Option<[usize; 2]>,
) -> usize {
    let axis = layout.compressed_axis().plain_index();
    match block {
        Some(block) if layout.is_block() => structural[axis] / block[axis],
        _ => structural[axis],
    }
}

/// Element count of a logical shape, rejecting overflow
pub(super) fn logical_numel(shape: &[usize]) -> Result<usize> {
    Layout::checked_elem_count(shape).ok_or_else(|| {
        Error::invalid_argument("shape", format!("{shape:?} has too many elements"))
    })
}

/// `batch` followed by `tail`
pub(super) fn batched(batch: &[usize], tail: &[usize]) -> Vec<usize> {
    batch.iter().chain(tail).copied().collect()
}

/// Check three buffers and a logical shape against each other
///
/// Checks run in order: device agreement, index dtypes, rank and dense-tail
/// legality, then buffer shapes. The values dtype is not checked here.
pub(super) fn check_members<R: Runtime>(
    layout: CompressedLayout,
    compressed: &Tensor<R>,
    plain: &Tensor<R>,
    values: &Tensor<R>,
    shape: &[usize],
) -> Result<()> {
    let compressed_name = layout.compressed_indices_name();
    let plain_name = layout.plain_indices_name();

    if !values.device().is_same(compressed.device()) {
        return Err(Error::DeviceMismatch {
            lhs: "values",
            rhs: compressed_name,
        });
    }
    if !values.device().is_same(plain.device()) {
        return Err(Error::DeviceMismatch {
            lhs: "values",
            rhs: plain_name,
        });
    }

    if !compressed.dtype().is_index() {
        return Err(Error::TypeMismatch {
            arg: compressed_name,
            expected: DType::default_int(),
            got: compressed.dtype(),
        });
    }
    if plain.dtype() != compressed.dtype() {
        return Err(Error::TypeMismatch {
            arg: plain_name,
            expected: compressed.dtype(),
            got: plain.dtype(),
        });
    }

    if shape.len() < 2 {
        return Err(Error::invalid_argument(
            "shape",
            format!("{layout} tensors need at least 2 dimensions, got {shape:?}"),
        ));
    }
    if compressed.ndim() == 0 {
        return Err(Error::invalid_argument(
            compressed_name,
            "must have at least one dimension",
        ));
    }
    let batch_dim = compressed.ndim() - 1;
    if shape.len() < batch_dim + 2 {
        return Err(Error::invalid_argument(
            "shape",
            format!(
                "{batch_dim} batch dimensions need rank at least {}, got {shape:?}",
                batch_dim + 2
            ),
        ));
    }
    let batch = &shape[..batch_dim];
    let structural = [shape[batch_dim], shape[batch_dim + 1]];
    let dense = &shape[batch_dim + 2..];
    if !dense.is_empty() && !layout.is_block() {
        return Err(Error::invalid_argument(
            "shape",
            format!("{layout} tensors cannot have dense dimensions, got {shape:?}"),
        ));
    }

    let nse = plain.shape().last().copied().unwrap_or(0);
    let expected_plain = batched(batch, &[nse]);
    if plain.shape() != expected_plain.as_slice() {
        return Err(Error::shape_mismatch(&expected_plain, plain.shape()));
    }

    let block = if layout.is_block() {
        let first = batch_dim + 1;
        match values.shape().get(first..first + 2) {
            Some(&[rows, cols]) if rows > 0 && cols > 0 => Some([rows, cols]),
            Some(&[rows, cols]) => {
                return Err(Error::invalid_argument(
                    "values",
                    format!("block shape [{rows}, {cols}] must be positive"),
                ));
            }
            _ => {
                return Err(Error::invalid_argument(
                    "values",
                    format!(
                        "{layout} values need block dimensions after the entry dimension, got {:?}",
                        values.shape()
                    ),
                ));
            }
        }
    } else {
        None
    };

    let mut values_tail = vec![nse];
    values_tail.extend(block.iter().flatten());
    values_tail.extend_from_slice(dense);
    let expected_values = batched(batch, &values_tail);
    if values.shape() != expected_values.as_slice() {
        return Err(Error::shape_mismatch(&expected_values, values.shape()));
    }

    let groups = compressed_groups(layout, structural, block);
    let expected_compressed = batched(batch, &[groups + 1]);
    if compressed.shape() != expected_compressed.as_slice() {
        return Err(Error::shape_mismatch(&expected_compressed, compressed.shape()));
    }

    Ok(())
}
