//! Runtime backends for buffer storage
//!
//! This module defines the `Runtime` trait and provides the CPU
//! implementation. Sparse tensors are generic over the runtime, so every
//! buffer of one tensor is allocated by the same backend while still being
//! free to live on different devices of that backend.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (identifies a specific compute unit)
//! └── allocate / deallocate / copy_* (raw memory services)
//! ```

mod traits;

pub mod cpu;

pub use traits::{Device, Runtime};
