//! Tensor types
//!
//! This module provides the dense `Tensor` type, an n-dimensional buffer
//! stored on a compute device, plus the [`Geometry`] trait shared with the
//! sparse tensor kinds.

mod core;
mod geometry;
mod layout;
mod storage;

pub use core::Tensor;
pub use geometry::Geometry;
pub use layout::{Layout, Shape, Strides};
pub use storage::Storage;
