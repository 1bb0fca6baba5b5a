//! Sparse compressed tensor support
//!
//! This module provides the compressed layout family for batched sparse
//! matrices:
//!
//! - **CSR** (Compressed Sparse Row): row pointers + column indices
//! - **CSC** (Compressed Sparse Column): column pointers + row indices
//! - **BSR** / **BSC**: the same over a grid of dense blocks
//!
//! A [`SparseCompressedMatrix`] keeps its three buffers consistent under
//! construction, resizing and member replacement. Numeric kernels are not
//! part of this module.
//!
//! # Example
//!
//! ```
//! use numr_compressed::prelude::*;
//!
//! # fn main() -> numr_compressed::error::Result<()> {
//! let device = CpuDevice::new();
//! let devices = DeviceMap::single(DispatchKey::SparseCompressedCpu, device.clone())?;
//! let ctx = CompressedContext::<CpuRuntime>::new(devices);
//!
//! let mut csr = SparseCompressedMatrix::from_slices(
//!     &ctx, &[0i64, 2, 5], &[0i64, 2, 0, 1, 2], &[1.0f32, 2.0, 3.0, 4.0, 5.0],
//!     [2, 3], None, CompressedLayout::Csr, &device,
//! )?;
//! csr.resize(5, &[4, 3])?;
//! assert_eq!(csr.compressed_indices().to_vec::<i64>(), [0, 2, 5, 5, 5]);
//! assert_eq!(csr.numel(), 12);
//! # Ok(())
//! # }
//! ```

mod advisory;
mod compressed;
mod context;
mod dispatch;
mod layout;

pub use advisory::BetaNotice;
pub use compressed::SparseCompressedMatrix;
pub use context::{CompressedContext, NnzPolicy};
pub use dispatch::{DeviceMap, DispatchKey};
pub use layout::{CompressedAxis, CompressedLayout};
