//! Compressed sparse matrix (CSR, CSC, BSR, BSC)
//!
//! Split by concern:
//! - `core`: struct, construction, accessors, buffer shape checks
//! - `resize`: `resize`, `resize_and_clear`, `resize_as`
//! - `members`: `set_members`
//! - `validate`: host-side index validation
//! - `geometry`: dense geometry rejections

mod core;
mod geometry;
mod members;
mod resize;
mod validate;

pub use core::SparseCompressedMatrix;
