//! Common test utilities
#![allow(dead_code)]

use numr_compressed::runtime::cpu::{CpuDevice, CpuRuntime};
use numr_compressed::sparse::{BetaNotice, CompressedContext, DeviceMap, DispatchKey};
use numr_compressed::tensor::Tensor;
use std::sync::Arc;

/// Create a context mapping the CPU dispatch key to the default CPU device
///
/// Each context gets its own beta notice so tests do not observe each other.
pub fn create_cpu_context() -> (CompressedContext<CpuRuntime>, CpuDevice) {
    let device = CpuDevice::new();
    let devices = DeviceMap::single(DispatchKey::SparseCompressedCpu, device.clone())
        .expect("CPU key is a sparse compressed key");
    let ctx = CompressedContext::new(devices).with_notice(Arc::new(BetaNotice::new()));
    (ctx, device)
}

/// Build an I64 index tensor
pub fn index_tensor(data: &[i64], shape: &[usize], device: &CpuDevice) -> Tensor<CpuRuntime> {
    Tensor::from_slice(data, shape, device)
}

/// Read an I64 index tensor back to host
pub fn read_index(tensor: &Tensor<CpuRuntime>) -> Vec<i64> {
    tensor.to_vec::<i64>()
}

/// Assert the cross-buffer invariants every public operation must keep
///
/// - one device for all three buffers
/// - values carry the declared dtype
/// - compressed length is groups + 1
/// - values hold nse entries (whole blocks for block layouts)
pub fn assert_invariants(matrix: &numr_compressed::sparse::SparseCompressedMatrix<CpuRuntime>) {
    use numr_compressed::runtime::Device;

    let values = matrix.values();
    let compressed = matrix.compressed_indices();
    let plain = matrix.plain_indices();
    assert!(values.device().is_same(compressed.device()));
    assert!(values.device().is_same(plain.device()));
    assert!(values.device().is_same(matrix.device()));
    assert_eq!(values.dtype(), matrix.dtype());

    let batch_dim = matrix.batch_dim();
    let shape = matrix.shape();
    assert!(shape.len() >= 2);
    assert_eq!(&compressed.shape()[..batch_dim], &shape[..batch_dim]);
    assert_eq!(&plain.shape()[..batch_dim], &shape[..batch_dim]);
    assert_eq!(&values.shape()[..batch_dim], &shape[..batch_dim]);

    let axis = matrix.layout().compressed_axis().index();
    let mut groups = shape[batch_dim + axis];
    if let Some(block) = matrix.block_shape() {
        groups /= block[axis];
        assert_eq!(&values.shape()[batch_dim + 1..batch_dim + 3], &block[..]);
    } else {
        assert_eq!(matrix.dense_dim(), 0);
    }
    assert_eq!(compressed.shape()[batch_dim], groups + 1);
    assert_eq!(values.shape()[batch_dim], matrix.nse());
    assert_eq!(matrix.numel(), shape.iter().product::<usize>());
}
