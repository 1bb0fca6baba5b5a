//! Runtime traits for compute backend abstraction

pub mod device;
pub mod runtime;

pub use device::Device;
pub use runtime::Runtime;
