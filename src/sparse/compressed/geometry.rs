//! Dense geometry queries rejected for compressed sparse matrices

use super::SparseCompressedMatrix;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::Geometry;

impl<R: Runtime> SparseCompressedMatrix<R> {
    fn unsupported<T>(&self, operation: &'static str) -> Result<T> {
        Err(Error::UnsupportedOperation {
            layout: self.layout.upper_name(),
            operation,
        })
    }
}

/// Only the logical shape is meaningful; the entries are not addressable
/// through strides, so every stride and offset query fails.
impl<R: Runtime> Geometry for SparseCompressedMatrix<R> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn numel(&self) -> usize {
        self.numel
    }

    fn strides(&self) -> Result<&[isize]> {
        self.unsupported("strides")
    }

    fn stride(&self, _dim: isize) -> Result<isize> {
        self.unsupported("strides")
    }

    fn storage_offset(&self) -> Result<usize> {
        self.unsupported("storage_offset")
    }

    fn is_contiguous(&self) -> Result<bool> {
        self.unsupported("is_contiguous")
    }

    fn set_size(&mut self, _dim: isize, _size: usize) -> Result<()> {
        self.unsupported("set_size")
    }

    fn set_stride(&mut self, _dim: isize, _stride: isize) -> Result<()> {
        self.unsupported("set_stride")
    }

    fn set_storage_offset(&mut self, _offset: usize) -> Result<()> {
        self.unsupported("set_storage_offset")
    }
}
