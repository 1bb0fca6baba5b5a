//! Error types for numr-compressed

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using the crate's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or mutating tensors
#[derive(Error, Debug)]
pub enum Error {
    /// Dispatch key does not resolve to a supported backend device
    #[error("Cannot construct sparse compressed tensor with dispatch key {key}")]
    InvalidDeviceTag {
        /// The unresolvable key
        key: String,
    },

    /// Buffers that must share a device live on different devices
    #[error("Device mismatch: {lhs} and {rhs} need to be on the same device")]
    DeviceMismatch {
        /// Left-hand side buffer name
        lhs: &'static str,
        /// Right-hand side buffer name
        rhs: &'static str,
    },

    /// Buffer dtype does not match the dtype it is required to have
    #[error("dtype of {arg} ({got}) must match {expected}")]
    TypeMismatch {
        /// The offending buffer
        arg: &'static str,
        /// Required dtype
        expected: DType,
        /// Actual dtype
        got: DType,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Operation needs concrete sizes but the tensor has a symbolic shape
    #[error("{op} called on tensor with symbolic shape")]
    UnsupportedOnSymbolicShape {
        /// The operation name
        op: &'static str,
    },

    /// Dense-only geometry query issued against a sparse tensor
    #[error("Sparse {layout} tensors do not have {operation}")]
    UnsupportedOperation {
        /// Upper-case layout name (e.g. "CSR")
        layout: &'static str,
        /// The rejected query or mutator
        operation: &'static str,
    },

    /// Shape mismatch between a buffer and the shape it must have
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: isize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
