//! CPU runtime implementation

use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// Alignment of every host allocation (AVX-512 width)
const ALIGN: usize = 64;

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;

        let ptr = unsafe { alloc_zeroed(layout) };

        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        // Same layout that allocate() accepted, so this cannot fail
        if let Ok(layout) = AllocLayout::from_size_align(size_bytes, ALIGN) {
            unsafe {
                dealloc(ptr as *mut u8, layout);
            }
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        if dst == 0 {
            return Err(Error::Internal(
                "copy_to_device: null destination".to_string(),
            ));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        if src == 0 {
            return Err(Error::Internal("copy_from_device: null source".to_string()));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn copy_within_device(
        src: u64,
        dst: u64,
        size_bytes: usize,
        _device: &Self::Device,
    ) -> Result<()> {
        if size_bytes == 0 {
            return Ok(());
        }
        if src == 0 || dst == 0 {
            return Err(Error::Internal(
                "copy_within_device: null handle".to_string(),
            ));
        }

        unsafe {
            // Use copy (not copy_nonoverlapping) in case src and dst overlap
            std::ptr::copy(src as *const u8, dst as *mut u8, size_bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed_roundtrip() {
        let device = CpuDevice::new();
        let ptr = CpuRuntime::allocate(16, &device).unwrap();
        assert_ne!(ptr, 0);

        let mut out = [0xFFu8; 16];
        CpuRuntime::copy_from_device(ptr, &mut out, &device).unwrap();
        assert_eq!(out, [0u8; 16]);

        CpuRuntime::copy_to_device(&[1, 2, 3, 4], ptr + 4, &device).unwrap();
        CpuRuntime::copy_within_device(ptr + 4, ptr, 4, &device).unwrap();
        CpuRuntime::copy_from_device(ptr, &mut out, &device).unwrap();
        assert_eq!(&out[..8], &[1, 2, 3, 4, 1, 2, 3, 4]);

        CpuRuntime::deallocate(ptr, 16, &device);
    }

    #[test]
    fn test_zero_sized_allocation() {
        let device = CpuDevice::new();
        assert_eq!(CpuRuntime::allocate(0, &device).unwrap(), 0);
        // No-op on the null handle
        CpuRuntime::deallocate(0, 0, &device);
        CpuRuntime::copy_to_device(&[], 0, &device).unwrap();
    }

    #[test]
    fn test_null_handle_rejected() {
        let device = CpuDevice::new();
        let mut out = [0u8; 4];
        assert!(CpuRuntime::copy_from_device(0, &mut out, &device).is_err());
    }
}
