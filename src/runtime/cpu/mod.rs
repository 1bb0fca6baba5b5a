//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation. Allocations are
//! zero-initialized and 64-byte aligned.

mod device;
mod runtime;

pub use device::CpuDevice;
pub use runtime::CpuRuntime;
