//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::Pod;

/// Trait for types that can be stored in a buffer
///
/// Connects Rust's type system to the runtime dtype tag. Host slices of an
/// `Element` type can be uploaded with `Tensor::from_slice` and read back
/// with `Tensor::to_vec`.
///
/// # Bounds
/// - `Pod` - buffers are moved to and from devices as raw bytes (bytemuck)
/// - `Send + Sync + 'static` - buffers are shared through `Arc`
pub trait Element: Copy + Send + Sync + Pod + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert from f64 to this type (saturating `as` semantics for integers)
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_primitive_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $ty
                }
            }
        )*
    };
}

impl_primitive_element! {
    f64 => F64,
    f32 => F32,
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
}

// bool is not Pod; boolean buffers are written as u8.

#[cfg(feature = "f16")]
impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::f16::from_f64(v)
    }
}

#[cfg(feature = "f16")]
impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn from_f64(v: f64) -> Self {
        half::bf16::from_f64(v)
    }
}
