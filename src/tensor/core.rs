//! Core Tensor type

use super::{Layout, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use std::fmt;

/// N-dimensional buffer stored on a compute device
///
/// `Tensor` is the dense building block sparse tensors are made of. It
/// consists of:
/// - **Storage**: Reference-counted device memory
/// - **Layout**: Shape, strides, and offset defining the view into storage
/// - **DType**: Element type (determined at runtime)
///
/// Cloning a tensor shares its storage. `narrow` creates a view into the same
/// storage, so `fill_` on a view writes through to every sharer.
///
/// # Example
///
/// ```ignore
/// use numr_compressed::prelude::*;
///
/// let device = CpuDevice::new();
/// let mut crow = Tensor::<CpuRuntime>::from_slice(&[0i64, 2, 5], &[3], &device);
/// crow.resize_(&[5])?;
/// crow.narrow(-1, 3, 2)?.fill_(5.0)?;
/// assert_eq!(crow.to_vec::<i64>(), [0, 2, 5, 5, 5]);
/// ```
pub struct Tensor<R: Runtime> {
    /// Device memory
    storage: Storage<R>,
    /// Shape, strides, offset
    layout: Layout,
}

impl<R: Runtime> Tensor<R> {
    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        Self::try_from_slice(data, shape, device).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    ///
    /// Returns an error if `data.len()` does not equal the product of the `shape` dimensions,
    /// or if memory allocation fails.
    pub fn try_from_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let expected_len = checked_len(shape)?;
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        let storage = Storage::from_slice(data, device)?;
        let layout = Layout::contiguous(shape);

        Ok(Self { storage, layout })
    }

    /// Create a tensor whose contents are unspecified
    ///
    /// Callers must write before reading. (The CPU backend happens to hand
    /// out zeroed memory; other backends do not.)
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        Self::try_empty(shape, dtype, device).expect("Tensor::empty failed")
    }

    /// Create a tensor whose contents are unspecified (fallible version)
    pub fn try_empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let len = checked_len(shape)?;
        let storage = Storage::new(len, dtype, device)?;
        let layout = Layout::contiguous(shape);

        Ok(Self { storage, layout })
    }

    /// Allocate a fresh tensor with the shape, dtype and device of `other`
    ///
    /// Content is not copied.
    pub fn try_empty_like(other: &Self) -> Result<Self> {
        Self::try_empty(other.shape(), other.dtype(), other.device())
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        Self::try_zeros(shape, dtype, device).expect("Tensor::zeros failed")
    }

    /// Create a tensor filled with zeros (fallible version)
    pub fn try_zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        Self::try_full_scalar(shape, dtype, 0.0, device)
    }

    /// Create a tensor filled with a scalar value
    ///
    /// The scalar is converted to the target dtype.
    pub fn full_scalar(shape: &[usize], dtype: DType, value: f64, device: &R::Device) -> Self {
        Self::try_full_scalar(shape, dtype, value, device).expect("Tensor::full_scalar failed")
    }

    /// Create a tensor filled with a scalar value (fallible version)
    pub fn try_full_scalar(
        shape: &[usize],
        dtype: DType,
        value: f64,
        device: &R::Device,
    ) -> Result<Self> {
        let len = checked_len(shape)?;
        if len == 0 {
            return Self::try_empty(shape, dtype, device);
        }

        let bytes = scalar_bytes(dtype, value).repeat(len);
        let storage = Storage::from_bytes(&bytes, dtype, device)?;
        let layout = Layout::contiguous(shape);

        Ok(Self { storage, layout })
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Get size along a dimension (supports negative indexing)
    pub fn size(&self, dim: isize) -> Option<usize> {
        self.layout.dim(dim)
    }

    /// Size in bytes of the viewed elements
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.numel() * self.dtype().size_in_bytes()
    }

    // ===== Views =====

    /// Narrow a dimension (zero-copy slice)
    ///
    /// Returns a view of `length` elements along `dim` starting at `start`.
    /// The view shares storage with `self`.
    pub fn narrow(&self, dim: isize, start: usize, length: usize) -> Result<Self> {
        let dim_idx = self
            .layout
            .normalize_dim(dim)
            .ok_or(Error::InvalidDimension {
                dim,
                ndim: self.ndim(),
            })?;

        let new_layout =
            self.layout
                .narrow(dim_idx, start, length)
                .ok_or_else(|| Error::ShapeMismatch {
                    expected: vec![self.shape()[dim_idx]],
                    got: vec![start, length],
                })?;

        Ok(Self {
            storage: self.storage.clone(),
            layout: new_layout,
        })
    }

    // ===== In-place mutation =====

    /// Resize in place to `shape`, keeping the storage offset
    ///
    /// The tensor becomes a contiguous view of `shape`. Elements already in
    /// storage keep their flat positions, so a 1-D resize preserves the
    /// prefix. When the storage is too small a larger buffer is allocated
    /// and the old contents copied over; other tensors sharing the old
    /// buffer keep it. New elements are unspecified.
    ///
    /// Fails with [`Error::InvalidArgument`] if `shape` (plus the offset)
    /// is too large to address; the tensor is then left unchanged.
    pub fn resize_(&mut self, shape: &[usize]) -> Result<()> {
        let offset = self.layout.offset();
        let needed = checked_len(shape)?
            .checked_add(offset)
            .filter(|&n| n <= isize::MAX as usize / self.dtype().size_in_bytes())
            .ok_or_else(|| {
                Error::invalid_argument(
                    "shape",
                    format!("{shape:?} at offset {offset} exceeds the addressable size"),
                )
            })?;

        if needed > self.storage.len() {
            self.storage = self.storage.grow(needed)?;
        }
        self.layout = Layout::contiguous_at(shape, offset);
        Ok(())
    }

    /// Fill every viewed element with `value` (converted to the dtype)
    ///
    /// Writes through to the shared storage.
    pub fn fill_(&mut self, value: f64) -> Result<()> {
        let numel = self.numel();
        if numel == 0 {
            return Ok(());
        }

        let elem = scalar_bytes(self.dtype(), value);
        let elem_size = elem.len();
        let base = self.storage.ptr();
        let device = self.storage.device();

        if self.is_contiguous() {
            let dst = base + (self.layout.offset() * elem_size) as u64;
            R::copy_to_device(&elem.repeat(numel), dst, device)
        } else {
            for offset in self.layout.offsets() {
                R::copy_to_device(&elem, base + (offset * elem_size) as u64, device)?;
            }
            Ok(())
        }
    }

    /// Fill every viewed element with zero
    pub fn zero_(&mut self) -> Result<()> {
        self.fill_(0.0)
    }

    /// Replace the layout after checking it stays within the storage
    pub(crate) fn set_layout(&mut self, layout: Layout) -> Result<()> {
        if let Some((lo, hi)) = layout.span() {
            if lo < 0 || hi as usize > self.storage.len() {
                return Err(Error::invalid_argument(
                    "layout",
                    format!(
                        "view {:?} addresses elements [{}, {}) outside storage of {} elements",
                        layout,
                        lo,
                        hi,
                        self.storage.len()
                    ),
                ));
            }
        }
        self.layout = layout;
        Ok(())
    }

    // ===== Data Access =====

    /// Copy tensor data to a Vec on the host
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the tensor's dtype or the device copy
    /// fails. For a fallible alternative, use [`Self::try_to_vec`].
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.try_to_vec().expect("Tensor::to_vec failed")
    }

    /// Copy tensor data to a Vec on the host (fallible version)
    ///
    /// Non-contiguous views are gathered element by element in row-major
    /// index order.
    pub fn try_to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype() {
            return Err(Error::TypeMismatch {
                arg: "to_vec element type",
                expected: self.dtype(),
                got: T::DTYPE,
            });
        }

        let numel = self.numel();
        let mut result = vec![T::zeroed(); numel];
        if numel == 0 {
            return Ok(result);
        }

        let elem_size = std::mem::size_of::<T>();
        let base = self.storage.ptr();
        let device = self.storage.device();

        if self.is_contiguous() {
            let src = base + (self.layout.offset() * elem_size) as u64;
            R::copy_from_device(src, bytemuck::cast_slice_mut(&mut result), device)?;
        } else {
            for (slot, offset) in result.iter_mut().zip(self.layout.offsets()) {
                let src = base + (offset * elem_size) as u64;
                R::copy_from_device(src, bytemuck::bytes_of_mut(slot), device)?;
            }
        }
        Ok(result)
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    /// Clone creates a new tensor sharing the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("device", self.device())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}

impl<R: Runtime> fmt::Display for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor({:?}, dtype={}, device={})",
            self.shape(),
            self.dtype(),
            self.device().name()
        )
    }
}

/// Element count of a contiguous `shape`, rejecting overflow
fn checked_len(shape: &[usize]) -> Result<usize> {
    Layout::checked_elem_count(shape).ok_or_else(|| {
        Error::invalid_argument("shape", format!("{shape:?} has too many elements to address"))
    })
}

/// Encode one element of `dtype` holding `value`
fn scalar_bytes(dtype: DType, value: f64) -> Vec<u8> {
    fn encode<T: Element>(value: f64) -> Vec<u8> {
        bytemuck::bytes_of(&T::from_f64(value)).to_vec()
    }

    match dtype {
        DType::F64 => encode::<f64>(value),
        DType::F32 => encode::<f32>(value),
        #[cfg(feature = "f16")]
        DType::F16 => encode::<half::f16>(value),
        #[cfg(feature = "f16")]
        DType::BF16 => encode::<half::bf16>(value),
        #[cfg(not(feature = "f16"))]
        DType::F16 | DType::BF16 => half_from_f32(value as f32, dtype).to_ne_bytes().to_vec(),
        DType::I64 => encode::<i64>(value),
        DType::I32 => encode::<i32>(value),
        DType::I16 => encode::<i16>(value),
        DType::I8 => encode::<i8>(value),
        DType::U64 => encode::<u64>(value),
        DType::U32 => encode::<u32>(value),
        DType::U16 => encode::<u16>(value),
        DType::U8 => encode::<u8>(value),
        DType::Bool => vec![u8::from(value != 0.0)],
    }
}

/// Convert f32 to half-precision bit representation
///
/// Handles the common cases only. For full IEEE 754 compliance, enable the
/// `f16` feature (uses the `half` crate).
#[cfg(not(feature = "f16"))]
fn half_from_f32(value: f32, dtype: DType) -> u16 {
    let bits = value.to_bits();
    let sign = (bits >> 31) & 1;
    let exp = ((bits >> 23) & 0xFF) as i32;
    let frac = bits & 0x7FFFFF;

    if dtype == DType::BF16 {
        // BF16: truncate mantissa, keep exponent
        ((bits >> 16) & 0xFFFF) as u16
    } else if exp == 0 {
        // Zero or subnormal
        (sign << 15) as u16
    } else if exp == 0xFF {
        // Inf or NaN
        ((sign << 15) | 0x7C00 | if frac != 0 { 0x200 } else { 0 }) as u16
    } else {
        let new_exp = exp - 127 + 15;
        if new_exp <= 0 {
            (sign << 15) as u16
        } else if new_exp >= 31 {
            ((sign << 15) | 0x7C00) as u16
        } else {
            ((sign << 15) | ((new_exp as u32) << 10) | (frac >> 13)) as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_from_slice() {
        let device = CpuDevice::new();
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 3], &device);

        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.dtype(), DType::F32);
        assert!(tensor.is_contiguous());
        assert_eq!(tensor.numel(), 6);

        let result: Vec<f32> = tensor.to_vec();
        assert_eq!(result, data);
    }

    #[test]
    fn test_from_slice_shape_mismatch() {
        let device = CpuDevice::new();
        let result = Tensor::<CpuRuntime>::try_from_slice(&[1i64, 2, 3], &[2, 2], &device);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_empty_like() {
        let device = CpuDevice::with_id(3);
        let src = Tensor::<CpuRuntime>::from_slice(&[1i32, 2, 3, 4], &[2, 2], &device);
        let like = Tensor::try_empty_like(&src).unwrap();

        assert_eq!(like.shape(), &[2, 2]);
        assert_eq!(like.dtype(), DType::I32);
        assert_eq!(like.device(), &device);
        assert!(!like.storage().same_buffer(src.storage()));
    }

    #[test]
    fn test_full_scalar() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::full_scalar(&[2, 2], DType::I32, 42.0, &device);

        let result: Vec<i32> = tensor.to_vec();
        assert_eq!(result, [42, 42, 42, 42]);

        let zeros = Tensor::<CpuRuntime>::zeros(&[3], DType::F64, &device);
        assert_eq!(zeros.to_vec::<f64>(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_display_names_device() {
        let tensor = Tensor::<CpuRuntime>::zeros(&[2, 3], DType::F32, &CpuDevice::with_id(1));
        assert_eq!(tensor.to_string(), "Tensor([2, 3], dtype=f32, device=cpu:1)");
    }

    #[test]
    fn test_resize_grow_preserves_prefix() {
        let device = CpuDevice::new();
        let mut tensor = Tensor::<CpuRuntime>::from_slice(&[0i64, 2, 5], &[3], &device);
        tensor.resize_(&[5]).unwrap();

        assert_eq!(tensor.shape(), &[5]);
        let values: Vec<i64> = tensor.to_vec();
        assert_eq!(&values[..3], &[0, 2, 5]);
    }

    #[test]
    fn test_resize_overflow_rejected() {
        let device = CpuDevice::new();
        let mut tensor = Tensor::<CpuRuntime>::from_slice(&[1i64, 2], &[2], &device);

        let result = tensor.resize_(&[usize::MAX / 2, 4]);
        assert!(matches!(result, Err(Error::InvalidArgument { arg: "shape", .. })));
        assert_eq!(tensor.shape(), &[2]);
        assert_eq!(tensor.to_vec::<i64>(), [1, 2]);

        assert!(Tensor::<CpuRuntime>::try_empty(&[usize::MAX, 2], DType::F32, &device).is_err());
    }

    #[test]
    fn test_resize_shrink_keeps_storage() {
        let device = CpuDevice::new();
        let mut tensor = Tensor::<CpuRuntime>::from_slice(&[1i64, 2, 3, 4], &[4], &device);
        let shared = tensor.clone();

        tensor.resize_(&[2]).unwrap();
        assert_eq!(tensor.to_vec::<i64>(), [1, 2]);
        assert!(tensor.storage().same_buffer(shared.storage()));
    }

    #[test]
    fn test_resize_grow_detaches_sharers() {
        let device = CpuDevice::new();
        let mut tensor = Tensor::<CpuRuntime>::from_slice(&[1i64, 2], &[2], &device);
        let shared = tensor.clone();

        tensor.resize_(&[2, 3]).unwrap();
        assert_eq!(tensor.shape(), &[2, 3]);
        assert!(!tensor.storage().same_buffer(shared.storage()));
        assert_eq!(shared.to_vec::<i64>(), [1, 2]);
    }

    #[test]
    fn test_narrow_fill_writes_through() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[0i64, 1, 2, 3, 4, 5], &[2, 3], &device);

        let mut last_col = tensor.narrow(-1, 2, 1).unwrap();
        assert_eq!(last_col.shape(), &[2, 1]);
        last_col.fill_(9.0).unwrap();

        assert_eq!(tensor.to_vec::<i64>(), [0, 1, 9, 3, 4, 9]);
        assert_eq!(last_col.to_vec::<i64>(), [9, 9]);
    }

    #[test]
    fn test_zero() {
        let device = CpuDevice::new();
        let mut tensor = Tensor::<CpuRuntime>::from_slice(&[3i32, 1, 4], &[3], &device);
        tensor.zero_().unwrap();
        assert_eq!(tensor.to_vec::<i32>(), [0, 0, 0]);
    }

    #[test]
    fn test_narrow_invalid() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[0i64, 1, 2], &[3], &device);
        assert!(matches!(
            tensor.narrow(1, 0, 1),
            Err(Error::InvalidDimension { dim: 1, ndim: 1 })
        ));
        assert!(matches!(
            tensor.narrow(0, 2, 2),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_to_vec_dtype_mismatch() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[1i32, 2], &[2], &device);
        assert!(matches!(
            tensor.try_to_vec::<i64>(),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
