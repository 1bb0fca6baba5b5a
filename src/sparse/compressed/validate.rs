//! Host-side structural validation

use super::SparseCompressedMatrix;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::Tensor;

impl<R: Runtime> SparseCompressedMatrix<R> {
    /// Check the content of the index buffers
    ///
    /// For every batch: the compressed indices start at 0, never decrease,
    /// and end at the stored count; every plain index lies within the plain
    /// structural dim (in blocks for block layouts).
    ///
    /// # Note
    ///
    /// Both index buffers are copied to host memory. Construction and member
    /// replacement only check buffer shapes, so call this when the index
    /// content comes from an untrusted source.
    pub fn validate_structure(&self) -> Result<()> {
        let compressed_name = self.layout.compressed_indices_name();
        let plain_name = self.layout.plain_indices_name();

        let compressed = index_values(&self.compressed_indices)?;
        let plain = index_values(&self.plain_indices)?;

        let batch_dim = self.batch_dim();
        let batches: usize = self.shape[..batch_dim].iter().product();
        let groups_len = self.compressed_indices.size(-1).unwrap_or(0);
        let nse = self.nse();

        let plain_axis = self.layout.compressed_axis().plain_index();
        let plain_bound = match self.block_shape() {
            Some(block) => self.shape[batch_dim + plain_axis] / block[plain_axis],
            None => self.shape[batch_dim + plain_axis],
        };

        for batch in 0..batches {
            let groups = &compressed[batch * groups_len..(batch + 1) * groups_len];
            let entries = &plain[batch * nse..(batch + 1) * nse];

            if groups.first().is_some_and(|&first| first != 0) {
                return Err(Error::invalid_argument(
                    compressed_name,
                    format!("batch {batch} must start at 0, got {}", groups[0]),
                ));
            }
            if let Some(pos) = groups.windows(2).position(|w| w[1] < w[0]) {
                return Err(Error::invalid_argument(
                    compressed_name,
                    format!(
                        "batch {batch} decreases at position {}: {} -> {}",
                        pos + 1,
                        groups[pos],
                        groups[pos + 1]
                    ),
                ));
            }
            if let Some(&last) = groups.last() {
                if last != nse as i64 {
                    return Err(Error::invalid_argument(
                        compressed_name,
                        format!("batch {batch} ends at {last}, expected nse {nse}"),
                    ));
                }
            }
            if let Some(&bad) = entries
                .iter()
                .find(|&&idx| idx < 0 || idx as usize >= plain_bound)
            {
                return Err(Error::invalid_argument(
                    plain_name,
                    format!("batch {batch} holds index {bad} outside 0..{plain_bound}"),
                ));
            }
        }

        Ok(())
    }
}

/// Copy an I32 or I64 index buffer to host as i64
fn index_values<R: Runtime>(indices: &Tensor<R>) -> Result<Vec<i64>> {
    match indices.dtype() {
        DType::I64 => indices.try_to_vec::<i64>(),
        DType::I32 => Ok(indices
            .try_to_vec::<i32>()?
            .into_iter()
            .map(i64::from)
            .collect()),
        other => Err(Error::TypeMismatch {
            arg: "indices",
            expected: DType::I64,
            got: other,
        }),
    }
}
