//! Storage: device memory management with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::runtime::Runtime;
use std::sync::Arc;

/// Storage for tensor data on a device
///
/// Storage wraps device memory with reference counting, so several tensors
/// (and several sparse tensors) can share one buffer until one of them
/// replaces it.
///
/// Memory is automatically deallocated when the last reference is dropped.
pub struct Storage<R: Runtime> {
    inner: Arc<StorageInner<R>>,
}

struct StorageInner<R: Runtime> {
    /// Raw device pointer (GPU address or CPU ptr cast to u64)
    ptr: u64,
    /// Number of elements (not bytes)
    len: usize,
    /// Element type
    dtype: DType,
    /// Device where memory is allocated
    device: R::Device,
}

impl<R: Runtime> Storage<R> {
    /// Create new storage with allocated memory
    ///
    /// Allocates `len` elements of type `dtype` on the specified device.
    pub fn new(len: usize, dtype: DType, device: &R::Device) -> Result<Self> {
        let size_bytes = len * dtype.size_in_bytes();
        let ptr = R::allocate(size_bytes, device)?;

        Ok(Self::wrap(ptr, len, dtype, device))
    }

    /// Create storage from existing data with inferred dtype
    ///
    /// Copies `data` to the device. The dtype is inferred from the Element type.
    pub fn from_slice<T: Element>(data: &[T], device: &R::Device) -> Result<Self> {
        Self::from_bytes(bytemuck::cast_slice(data), T::DTYPE, device)
    }

    /// Create storage from raw bytes with explicit dtype
    pub fn from_bytes(data: &[u8], dtype: DType, device: &R::Device) -> Result<Self> {
        let len = data.len() / dtype.size_in_bytes();
        let ptr = R::allocate(data.len(), device)?;

        R::copy_to_device(data, ptr, device)?;

        Ok(Self::wrap(ptr, len, dtype, device))
    }

    fn wrap(ptr: u64, len: usize, dtype: DType, device: &R::Device) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device: device.clone(),
            }),
        }
    }

    /// Allocate a larger storage holding a copy of this one's elements
    ///
    /// The first `self.len()` elements are copied; the rest is fresh memory.
    /// Sharers of `self` keep the old buffer.
    pub fn grow(&self, len: usize) -> Result<Self> {
        let grown = Self::new(len, self.dtype(), self.device())?;
        let keep = self.len().min(len) * self.dtype().size_in_bytes();
        R::copy_within_device(self.ptr(), grown.ptr(), keep, self.device())?;
        Ok(grown)
    }

    /// Get the raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.inner.ptr
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.inner.device
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Check if two storages share the same buffer
    #[inline]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<R: Runtime> Clone for Storage<R> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Runtime> Drop for StorageInner<R> {
    fn drop(&mut self) {
        if self.ptr != 0 {
            R::deallocate(
                self.ptr,
                self.len * self.dtype.size_in_bytes(),
                &self.device,
            );
        }
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
