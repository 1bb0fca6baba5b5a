//! Bulk member replacement

use super::SparseCompressedMatrix;
use super::core::{check_members, logical_numel};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::Tensor;

impl<R: Runtime> SparseCompressedMatrix<R> {
    /// Replace all three buffers and the logical shape at once
    ///
    /// This is how externally prepared buffers are adopted, so every check
    /// of [`Self::new`] runs here as well, and `values` must additionally
    /// carry the matrix's declared dtype. Nothing is written unless every
    /// check passes. Moving all three buffers to another device together is
    /// allowed and moves the matrix with them.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedOnSymbolicShape`] on a symbolic-shape matrix
    /// - [`Error::TypeMismatch`] if `values` has a different dtype, or the
    ///   index dtypes are not a matching I32/I64 pair
    /// - [`Error::DeviceMismatch`] if the buffers do not share one device
    /// - [`Error::InvalidArgument`] / [`Error::ShapeMismatch`] if the
    ///   buffers disagree with `shape`
    pub fn set_members(
        &mut self,
        compressed_indices: Tensor<R>,
        plain_indices: Tensor<R>,
        values: Tensor<R>,
        shape: &[usize],
    ) -> Result<()> {
        self.ensure_concrete("set_members")?;

        if values.dtype() != self.dtype {
            return Err(Error::TypeMismatch {
                arg: "values",
                expected: self.dtype,
                got: values.dtype(),
            });
        }
        check_members(
            self.layout,
            &compressed_indices,
            &plain_indices,
            &values,
            shape,
        )?;
        let numel = logical_numel(shape)?;

        self.device = values.device().clone();
        self.compressed_indices = compressed_indices;
        self.plain_indices = plain_indices;
        self.values = values;
        self.shape = shape.iter().copied().collect();
        self.numel = numel;
        Ok(())
    }
}
