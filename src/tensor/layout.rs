//! Layout: shape, strides, and offset for tensor memory layout

use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each dimension
/// Signed to support negative strides
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Layout describes the memory layout of a tensor
///
/// A tensor's elements are stored in a flat buffer, but not necessarily
/// in row-major order. The layout specifies how to compute the memory address
/// of any element given its indices.
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting element index in the underlying storage
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use numr_compressed::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        Self::contiguous_at(shape, 0)
    }

    /// Create a contiguous layout starting at `offset` elements into storage
    pub fn contiguous_at(shape: &[usize], offset: usize) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Compute contiguous strides for a given shape (row-major order)
    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        if shape.is_empty() {
            return SmallVec::new();
        }

        let mut strides: Strides = SmallVec::with_capacity(shape.len());
        let mut stride = 1isize;

        // Compute strides from last dimension to first
        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride *= dim as isize;
        }

        strides.reverse();
        strides
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Element count of `shape`, or `None` if a contiguous layout of it
    /// cannot be addressed
    ///
    /// Zero-sized dims still count as 1 toward the bound, because the
    /// contiguous strides multiply every other dim.
    pub fn checked_elem_count(shape: &[usize]) -> Option<usize> {
        let extent = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim.max(1)))?;
        if extent > isize::MAX as usize {
            return None;
        }
        Some(if shape.contains(&0) { 0 } else { extent })
    }

    /// Check if the tensor is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if elements are laid out densely in row-major order
    ///
    /// The storage offset does not matter: a narrowed slice of the leading
    /// dimension is still contiguous.
    pub fn is_contiguous(&self) -> bool {
        if self.is_scalar() {
            return true;
        }

        // Strides of size-1 dims never affect addressing
        let expected = Self::compute_contiguous_strides(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(expected.iter()))
            .all(|(&size, (&have, &want))| size <= 1 || have == want)
    }

    /// Get size along a specific dimension
    ///
    /// Supports negative indexing: -1 is the last dimension
    pub fn dim(&self, d: isize) -> Option<usize> {
        let idx = self.normalize_dim(d)?;
        Some(self.shape[idx])
    }

    /// Get stride along a specific dimension
    pub fn stride(&self, d: isize) -> Option<isize> {
        let idx = self.normalize_dim(d)?;
        Some(self.strides[idx])
    }

    /// Normalize a dimension index (handle negative indices)
    pub fn normalize_dim(&self, d: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let idx = if d < 0 { ndim + d } else { d };
        if idx >= 0 && idx < ndim {
            Some(idx as usize)
        } else {
            None
        }
    }

    /// Create a narrowed layout: `length` elements of dimension `dim` starting at `start`
    ///
    /// Returns None if `dim` is out of range or the window exceeds the dimension.
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Option<Self> {
        if dim >= self.ndim() || start.checked_add(length)? > self.shape[dim] {
            return None;
        }

        let mut new_shape = self.shape.clone();
        new_shape[dim] = length;

        let offset = self.offset as isize + start as isize * self.strides[dim];
        if offset < 0 {
            return None;
        }

        Some(Self::new(new_shape, self.strides.clone(), offset as usize))
    }

    /// Layout with the size of dimension `dim` replaced
    pub fn with_size(&self, dim: usize, size: usize) -> Option<Self> {
        if dim >= self.ndim() {
            return None;
        }
        let mut new = self.clone();
        new.shape[dim] = size;
        Some(new)
    }

    /// Layout with the stride of dimension `dim` replaced
    pub fn with_stride(&self, dim: usize, stride: isize) -> Option<Self> {
        if dim >= self.ndim() {
            return None;
        }
        let mut new = self.clone();
        new.strides[dim] = stride;
        Some(new)
    }

    /// Layout with the storage offset replaced
    pub fn with_offset(&self, offset: usize) -> Self {
        let mut new = self.clone();
        new.offset = offset;
        new
    }

    /// Range of storage elements this layout can address, as `[lo, hi)`
    ///
    /// Returns None for layouts with zero elements, which address nothing.
    pub fn span(&self) -> Option<(isize, isize)> {
        if self.elem_count() == 0 {
            return None;
        }

        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        for (&size, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let reach = (size as isize - 1) * stride;
            if reach < 0 {
                lo += reach;
            } else {
                hi += reach;
            }
        }

        Some((lo, hi + 1))
    }

    /// Storage element offsets of every element, in row-major index order
    pub fn offsets(&self) -> Vec<usize> {
        let numel = self.elem_count();
        let mut out = Vec::with_capacity(numel);
        if numel == 0 {
            return out;
        }

        let mut indices = vec![0usize; self.ndim()];
        for _ in 0..numel {
            let mut linear = self.offset as isize;
            for (&idx, &stride) in indices.iter().zip(self.strides.iter()) {
                linear += idx as isize * stride;
            }
            out.push(linear as usize);

            // Increment indices (row-major order)
            for dim in (0..self.ndim()).rev() {
                indices[dim] += 1;
                if indices[dim] < self.shape[dim] {
                    break;
                }
                indices[dim] = 0;
            }
        }

        out
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(&[2, 3, 4]);
        assert_eq!(layout.shape(), &[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert_eq!(layout.elem_count(), 24);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_checked_elem_count() {
        assert_eq!(Layout::checked_elem_count(&[2, 3, 4]), Some(24));
        assert_eq!(Layout::checked_elem_count(&[]), Some(1));
        assert_eq!(Layout::checked_elem_count(&[5, 0]), Some(0));
        assert_eq!(Layout::checked_elem_count(&[usize::MAX / 2, 4]), None);
        // Strides of the trailing dims would overflow even with a zero dim
        assert_eq!(Layout::checked_elem_count(&[0, usize::MAX / 2, 4]), None);
    }

    #[test]
    fn test_narrow_last_dim() {
        // Tail of each row of a [2, 5] buffer
        let layout = Layout::contiguous(&[2, 5]);
        let tail = layout.narrow(1, 3, 2).unwrap();
        assert_eq!(tail.shape(), &[2, 2]);
        assert_eq!(tail.offset(), 3);
        assert!(!tail.is_contiguous());
        assert_eq!(tail.offsets(), vec![3, 4, 8, 9]);

        assert!(layout.narrow(1, 4, 2).is_none());
        assert!(layout.narrow(2, 0, 1).is_none());
    }

    #[test]
    fn test_narrow_leading_dim_stays_contiguous() {
        let layout = Layout::contiguous(&[4, 3]);
        let rows = layout.narrow(0, 1, 2).unwrap();
        assert!(rows.is_contiguous());
        assert_eq!(rows.offset(), 3);
        assert_eq!(rows.span(), Some((3, 9)));
    }

    #[test]
    fn test_with_size_stride_offset() {
        let layout = Layout::contiguous(&[2, 3]);

        let resized = layout.with_size(1, 2).unwrap();
        assert_eq!(resized.shape(), &[2, 2]);
        assert_eq!(resized.strides(), &[3, 1]);

        let restrided = layout.with_stride(0, 1).unwrap();
        assert_eq!(restrided.strides(), &[1, 1]);
        assert!(!restrided.is_contiguous());

        assert_eq!(layout.with_offset(5).offset(), 5);
        assert!(layout.with_size(2, 1).is_none());
    }

    #[test]
    fn test_span() {
        assert_eq!(Layout::contiguous(&[2, 3]).span(), Some((0, 6)));
        assert_eq!(Layout::contiguous(&[0, 3]).span(), None);

        let negative = Layout::new(SmallVec::from_slice(&[3]), SmallVec::from_slice(&[-1]), 2);
        assert_eq!(negative.span(), Some((0, 3)));
    }

    #[test]
    fn test_offsets_scalar() {
        let layout = Layout::contiguous(&[]);
        assert_eq!(layout.elem_count(), 1);
        assert_eq!(layout.offsets(), vec![0]);
    }
}
