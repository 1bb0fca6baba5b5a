//! Core trait for compute backends

use crate::error::Result;

/// Core trait for compute backends
///
/// `Runtime` abstracts over the memory of a compute device. Buffers hold
/// opaque `u64` handles returned by [`Runtime::allocate`]; all reads and
/// writes go through the copy functions so the same buffer code works for
/// host and device memory.
///
/// # Example
///
/// ```ignore
/// let device = CpuDevice::new();
/// let ptr = CpuRuntime::allocate(1024, &device)?;
/// // ... use memory ...
/// CpuRuntime::deallocate(ptr, 1024, &device);
/// ```
pub trait Runtime: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Device identifier type
    type Device: super::Device;

    /// Allocate zero-initialized device memory
    ///
    /// Returns a device pointer (u64). Zero-sized requests return the null
    /// handle `0`. Returns `Err(OutOfMemory)` if allocation fails.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy data from device to host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Copy data within device (device to device)
    ///
    /// Source and destination may overlap.
    fn copy_within_device(
        src: u64,
        dst: u64,
        size_bytes: usize,
        device: &Self::Device,
    ) -> Result<()>;
}
