//! Integration tests for compressed sparse matrices
//!
//! Walks matrices of every layout through construction and each mutator,
//! checking the cross-buffer invariants after every step.

mod common;

use common::{assert_invariants, create_cpu_context, index_tensor, read_index};
use numr_compressed::dtype::DType;
use numr_compressed::error::Error;
use numr_compressed::runtime::cpu::{CpuDevice, CpuRuntime};
use numr_compressed::sparse::{
    BetaNotice, CompressedContext, CompressedLayout, DeviceMap, DispatchKey, NnzPolicy,
    SparseCompressedMatrix,
};
use numr_compressed::tensor::{Geometry, Tensor};
use std::sync::Arc;

/// Matrix:
/// [1.0, 0.0, 2.0]
/// [0.0, 3.0, 0.0]
/// [4.0, 0.0, 5.0]
fn create_test_csr_3x3(
    ctx: &CompressedContext<CpuRuntime>,
    device: &CpuDevice,
) -> SparseCompressedMatrix<CpuRuntime> {
    SparseCompressedMatrix::from_slices(
        ctx,
        &[0i64, 2, 3, 5],
        &[0i64, 2, 1, 0, 2],
        &[1.0f32, 2.0, 3.0, 4.0, 5.0],
        [3, 3],
        None,
        CompressedLayout::Csr,
        device,
    )
    .unwrap()
}

/// 2 batches of a 4x4 BSR with 2x2 blocks and a dense tail of 3
fn create_test_batched_bsr(
    ctx: &CompressedContext<CpuRuntime>,
    device: &CpuDevice,
) -> SparseCompressedMatrix<CpuRuntime> {
    SparseCompressedMatrix::new(
        ctx,
        index_tensor(&[0, 1, 2, 0, 2, 2], &[2, 3], device),
        index_tensor(&[0, 1, 0, 1], &[2, 2], device),
        Tensor::full_scalar(&[2, 2, 2, 2, 3], DType::F32, 1.0, device),
        &[2, 4, 4, 3],
        CompressedLayout::Bsr,
    )
    .unwrap()
}

#[test]
fn test_empty_construction_every_layout() {
    let (ctx, device) = create_cpu_context();

    for layout in CompressedLayout::ALL {
        let matrix =
            SparseCompressedMatrix::empty(&ctx, DispatchKey::SparseCompressedCpu, layout, DType::F64)
                .unwrap();

        assert_eq!(matrix.layout(), layout);
        assert_eq!(matrix.device(), &device);
        assert_eq!(matrix.shape(), &[0, 0]);
        assert_eq!(read_index(matrix.compressed_indices()), [0]);
        assert_eq!(matrix.plain_indices().shape(), &[0]);
        assert_eq!(matrix.values().shape()[0], 0);
        assert_invariants(&matrix);
    }
}

#[test]
fn test_empty_construction_resolves_registered_device() {
    let cuda_like = CpuDevice::with_id(7);
    let mut devices = DeviceMap::<CpuRuntime>::new();
    devices
        .register(DispatchKey::SparseCompressedCpu, CpuDevice::new())
        .unwrap();
    devices
        .register(DispatchKey::SparseCompressedCuda, cuda_like.clone())
        .unwrap();
    let ctx = CompressedContext::new(devices).with_notice(Arc::new(BetaNotice::new()));

    let matrix = SparseCompressedMatrix::empty(
        &ctx,
        DispatchKey::SparseCompressedCuda,
        CompressedLayout::Csc,
        DType::F32,
    )
    .unwrap();
    assert_eq!(matrix.device(), &cuda_like);
    assert_eq!(matrix.values().device(), &cuda_like);

    let result = SparseCompressedMatrix::empty(
        &ctx,
        DispatchKey::SparseCompressedWgpu,
        CompressedLayout::Csc,
        DType::F32,
    );
    assert!(matches!(result, Err(Error::InvalidDeviceTag { .. })));
}

#[test]
fn test_full_construction_invariants() {
    let (ctx, device) = create_cpu_context();

    let csr = create_test_csr_3x3(&ctx, &device);
    assert_invariants(&csr);
    assert_eq!(csr.nnz(), 5);

    let bsr = create_test_batched_bsr(&ctx, &device);
    assert_invariants(&bsr);
    assert_eq!(bsr.batch_dim(), 1);
    assert_eq!(bsr.dense_dim(), 1);
    assert_eq!(bsr.nse(), 2);
    assert_eq!(bsr.nnz(), 8);
    bsr.validate_structure().unwrap();
}

#[test]
fn test_beta_notice_once_per_notice() {
    let notice = Arc::new(BetaNotice::new());
    let (ctx, device) = create_cpu_context();
    let ctx = ctx.with_notice(Arc::clone(&notice));

    create_test_csr_3x3(&ctx, &device);
    assert!(notice.has_fired());
    assert!(!notice.emit(CompressedLayout::Csr));

    // A fresh notice on another context is independent
    let (other_ctx, _) = create_cpu_context();
    assert!(!other_ctx.notice().has_fired());
}

#[test]
fn test_resize_last_entry_is_clamped_nnz() {
    let (ctx, device) = create_cpu_context();

    for (nnz, shape) in [(4usize, [3usize, 3]), (9, [3, 3]), (20, [3, 3]), (2, [5, 2])] {
        let mut csr = create_test_csr_3x3(&ctx, &device);
        csr.resize(nnz, &shape).unwrap();

        let crow = read_index(csr.compressed_indices());
        assert_eq!(crow.len(), shape[0] + 1);
        assert_eq!(*crow.last().unwrap() as usize, nnz.min(shape[0] * shape[1]));
        assert_invariants(&csr);
    }
}

#[test]
fn test_resize_grow_keeps_prefix() {
    let (ctx, device) = create_cpu_context();
    let mut csr = SparseCompressedMatrix::from_slices(
        &ctx,
        &[0i64, 2, 5],
        &[0i64, 1, 0, 1, 2],
        &[1.0f32; 5],
        [2, 3],
        None,
        CompressedLayout::Csr,
        &device,
    )
    .unwrap();

    csr.resize(5, &[4, 3]).unwrap();
    assert_eq!(read_index(csr.compressed_indices()), [0, 2, 5, 5, 5]);
    assert_eq!(read_index(csr.plain_indices()), [0, 1, 0, 1, 2]);
    csr.validate_structure().unwrap();
    assert_invariants(&csr);
}

#[test]
fn test_resize_keeps_dense_tail() {
    let (ctx, device) = create_cpu_context();
    let mut bsr = create_test_batched_bsr(&ctx, &device);

    bsr.resize(8, &[2, 6, 4, 3]).unwrap();
    assert_eq!(bsr.compressed_indices().shape(), &[2, 4]);
    assert_eq!(bsr.values().shape(), &[2, 2, 2, 2, 3]);
    assert_eq!(bsr.dense_dim(), 1);
    assert_invariants(&bsr);

    // Shape too short to hold the dense tail
    assert!(matches!(
        bsr.resize(4, &[4, 4]),
        Err(Error::InvalidArgument { arg: "shape", .. })
    ));
}

#[test]
fn test_block_resize_stays_within_block_grid() {
    let (ctx, device) = create_cpu_context();

    for (nnz, shape, groups, nse) in [
        (12usize, [2usize, 1, 4, 3], 0usize, 0usize),
        (12, [2, 3, 3, 3], 1, 1),
        (12, [2, 5, 4, 3], 2, 3),
    ] {
        let mut bsr = create_test_batched_bsr(&ctx, &device);
        bsr.resize(nnz, &shape).unwrap();

        assert_eq!(bsr.compressed_indices().shape(), &[2, groups + 1]);
        assert_eq!(bsr.nse(), nse);
        let crow = read_index(bsr.compressed_indices());
        assert_eq!(crow[groups] as usize, nse);
        assert_eq!(crow[0], 0);
        assert_invariants(&bsr);
    }
}

#[test]
fn test_reject_policy_leaves_matrix() {
    let (ctx, device) = create_cpu_context();
    let ctx = ctx.with_nnz_policy(NnzPolicy::Reject);
    let mut csr = create_test_csr_3x3(&ctx, &device);

    assert!(csr.resize(10, &[3, 3]).is_err());
    assert_eq!(read_index(csr.compressed_indices()), [0, 2, 3, 5]);
    csr.validate_structure().unwrap();
}

#[test]
fn test_resize_and_clear_discards_entries() {
    let (ctx, device) = create_cpu_context();

    let mut csr = create_test_csr_3x3(&ctx, &device);
    csr.resize_and_clear(2, &[6, 2]).unwrap();
    assert_eq!(read_index(csr.compressed_indices()), vec![0; 7]);
    assert_eq!(csr.plain_indices().shape(), &[0]);
    assert_eq!(csr.values().shape(), &[0]);
    csr.validate_structure().unwrap();
    assert_invariants(&csr);

    let mut bsr = create_test_batched_bsr(&ctx, &device);
    bsr.resize_and_clear(2, &[5, 5]).unwrap();
    assert_eq!(bsr.values().shape(), &[0, 2, 2]);
    assert_eq!(read_index(bsr.compressed_indices()), [0, 0, 0]);
    assert_eq!(bsr.batch_dim(), 0);
    assert_eq!(bsr.dense_dim(), 0);
}

#[test]
fn test_resize_and_clear_shared_buffer_writes_through() {
    let (ctx, device) = create_cpu_context();
    let csr = create_test_csr_3x3(&ctx, &device);

    // The clone shares buffers; clearing to a smaller structure reuses them
    let mut cleared = csr.clone();
    cleared.resize_and_clear(2, &[2, 3]).unwrap();
    assert!(
        cleared
            .compressed_indices()
            .storage()
            .same_buffer(csr.compressed_indices().storage())
    );
    assert_eq!(read_index(csr.compressed_indices()), [0, 0, 0, 5]);
}

#[test]
fn test_resize_as_templates_structure() {
    let (ctx, device) = create_cpu_context();
    let source = create_test_batched_bsr(&ctx, &device);
    let mut target = create_test_csr_3x3(&ctx, &device);

    target.resize_as(&source).unwrap();
    assert_eq!(target.layout(), CompressedLayout::Bsr);
    assert_eq!(target.shape(), source.shape());
    assert_eq!(target.values().shape(), source.values().shape());
    assert_eq!(target.block_shape(), Some([2, 2]));
    assert_invariants(&target);
}

#[test]
fn test_set_members_round() {
    let (ctx, device) = create_cpu_context();
    let mut csr = create_test_csr_3x3(&ctx, &device);
    let before = read_index(csr.compressed_indices());

    // Wrong value dtype: nothing changes
    let result = csr.set_members(
        index_tensor(&[0, 1], &[2], &device),
        index_tensor(&[0], &[1], &device),
        Tensor::from_slice(&[1i32], &[1], &device),
        &[1, 1],
    );
    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    assert_eq!(read_index(csr.compressed_indices()), before);
    assert_eq!(csr.shape(), &[3, 3]);

    // Values on another device
    let result = csr.set_members(
        index_tensor(&[0, 1], &[2], &device),
        index_tensor(&[0], &[1], &device),
        Tensor::from_slice(&[1.0f32], &[1], &CpuDevice::with_id(1)),
        &[1, 1],
    );
    assert!(matches!(result, Err(Error::DeviceMismatch { .. })));

    csr.set_members(
        index_tensor(&[0, 1], &[2], &device),
        index_tensor(&[0], &[1], &device),
        Tensor::from_slice(&[9.0f32], &[1], &device),
        &[1, 1],
    )
    .unwrap();
    assert_eq!(csr.values().to_vec::<f32>(), [9.0]);
    assert_invariants(&csr);
}

#[test]
fn test_geometry_is_polymorphic() {
    fn describe<G: Geometry>(g: &G) -> (Vec<usize>, bool) {
        (g.shape().to_vec(), g.strides().is_ok())
    }

    let (ctx, device) = create_cpu_context();
    let csr = create_test_csr_3x3(&ctx, &device);
    let dense = Tensor::<CpuRuntime>::zeros(&[3, 3], DType::F32, &device);

    assert_eq!(describe(&csr), (vec![3, 3], false));
    assert_eq!(describe(&dense), (vec![3, 3], true));

    let err = csr.strides().unwrap_err();
    assert_eq!(err.to_string(), "Sparse CSR tensors do not have strides");
}

#[test]
fn test_symbolic_shape_blocks_mutation() {
    let (ctx, device) = create_cpu_context();
    let mut csr = create_test_csr_3x3(&ctx, &device);
    csr.mark_symbolic_shape();
    assert!(csr.has_symbolic_shape());

    assert!(matches!(
        csr.resize(1, &[3, 3]),
        Err(Error::UnsupportedOnSymbolicShape { .. })
    ));
    assert!(matches!(
        csr.resize_and_clear(2, &[3, 3]),
        Err(Error::UnsupportedOnSymbolicShape { .. })
    ));
    assert!(matches!(
        csr.set_members(
            index_tensor(&[0, 0], &[2], &device),
            index_tensor(&[], &[0], &device),
            Tensor::from_slice(&[] as &[f32], &[0], &device),
            &[1, 1],
        ),
        Err(Error::UnsupportedOnSymbolicShape { .. })
    ));
    assert_eq!(read_index(csr.compressed_indices()), [0, 2, 3, 5]);
}
