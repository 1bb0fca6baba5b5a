//! # numr-compressed
//!
//! **Compressed sparse tensors (CSR, CSC, BSR, BSC) with batch dimensions.**
//!
//! numr-compressed provides the structural layer of compressed sparse
//! tensors: three device buffers (compressed indices, plain indices, values)
//! plus layout and shape metadata, kept mutually consistent under every
//! mutation. Numeric kernels build on top of it without re-validating.
//!
//! ## Features
//!
//! - **Layouts**: CSR, CSC and their block variants BSR, BSC
//! - **Batching**: any number of leading batch dimensions
//! - **Dense tails**: trailing dense dimensions for block layouts
//! - **Mutation**: shape-preserving resize, destructive resize, re-templating
//!   and bulk member replacement, all validated before writing
//! - **Backends**: buffers live on any [`Runtime`](runtime::Runtime); a CPU
//!   runtime ships by default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use numr_compressed::prelude::*;
//!
//! let device = CpuDevice::new();
//! let devices = DeviceMap::single(DispatchKey::SparseCompressedCpu, device.clone())?;
//! let ctx = CompressedContext::<CpuRuntime>::new(devices);
//!
//! let mut csr = SparseCompressedMatrix::empty(
//!     &ctx,
//!     DispatchKey::SparseCompressedCpu,
//!     CompressedLayout::Csr,
//!     DType::F32,
//! )?;
//! csr.resize_and_clear(2, &[4, 4])?;
//! assert!(csr.strides().is_err());
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend in the prelude
//! - `f16`: Half-precision floats (F16, BF16)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod runtime;
pub mod sparse;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::{Device, Runtime};
    pub use crate::sparse::{
        BetaNotice, CompressedAxis, CompressedContext, CompressedLayout, DeviceMap, DispatchKey,
        NnzPolicy, SparseCompressedMatrix,
    };
    pub use crate::tensor::{Geometry, Layout, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuDevice, CpuRuntime};
}
