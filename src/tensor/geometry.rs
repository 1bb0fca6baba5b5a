//! Dense geometry queries and mutators shared by every tensor kind

use super::Tensor;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// Shape, stride and offset access common to dense and sparse tensors
///
/// Dense tensors answer every method. Sparse compressed tensors answer only
/// [`shape`](Geometry::shape) and [`numel`](Geometry::numel) and reject the
/// stride/offset family with [`Error::UnsupportedOperation`].
pub trait Geometry {
    /// Logical shape
    fn shape(&self) -> &[usize];

    /// Number of logical elements
    fn numel(&self) -> usize;

    /// Per-dimension strides, in elements
    fn strides(&self) -> Result<&[isize]>;

    /// Stride of one dimension (supports negative indexing)
    fn stride(&self, dim: isize) -> Result<isize>;

    /// Element offset into the underlying storage
    fn storage_offset(&self) -> Result<usize>;

    /// Whether elements are dense in row-major order
    fn is_contiguous(&self) -> Result<bool>;

    /// Replace the size of one dimension
    fn set_size(&mut self, dim: isize, size: usize) -> Result<()>;

    /// Replace the stride of one dimension
    fn set_stride(&mut self, dim: isize, stride: isize) -> Result<()>;

    /// Replace the storage offset
    fn set_storage_offset(&mut self, offset: usize) -> Result<()>;
}

impl<R: Runtime> Tensor<R> {
    fn checked_dim(&self, dim: isize) -> Result<usize> {
        self.layout()
            .normalize_dim(dim)
            .ok_or(Error::InvalidDimension {
                dim,
                ndim: self.ndim(),
            })
    }
}

impl<R: Runtime> Geometry for Tensor<R> {
    fn shape(&self) -> &[usize] {
        self.layout().shape()
    }

    fn numel(&self) -> usize {
        self.layout().elem_count()
    }

    fn strides(&self) -> Result<&[isize]> {
        Ok(self.layout().strides())
    }

    fn stride(&self, dim: isize) -> Result<isize> {
        let idx = self.checked_dim(dim)?;
        Ok(self.layout().strides()[idx])
    }

    fn storage_offset(&self) -> Result<usize> {
        Ok(self.layout().offset())
    }

    fn is_contiguous(&self) -> Result<bool> {
        Ok(self.layout().is_contiguous())
    }

    fn set_size(&mut self, dim: isize, size: usize) -> Result<()> {
        let idx = self.checked_dim(dim)?;
        let layout = self
            .layout()
            .with_size(idx, size)
            .ok_or_else(|| Error::Internal(format!("dimension {idx} vanished")))?;
        self.set_layout(layout)
    }

    fn set_stride(&mut self, dim: isize, stride: isize) -> Result<()> {
        let idx = self.checked_dim(dim)?;
        let layout = self
            .layout()
            .with_stride(idx, stride)
            .ok_or_else(|| Error::Internal(format!("dimension {idx} vanished")))?;
        self.set_layout(layout)
    }

    fn set_storage_offset(&mut self, offset: usize) -> Result<()> {
        let layout = self.layout().with_offset(offset);
        self.set_layout(layout)
    }
}
