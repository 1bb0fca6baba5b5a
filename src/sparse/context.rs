//! Construction-time configuration for compressed sparse tensors

use super::{BetaNotice, DeviceMap};
use crate::runtime::Runtime;
use std::sync::Arc;

/// What `resize` does when the requested nnz exceeds the matrix capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NnzPolicy {
    /// Clamp nnz to `rows * cols` (logged at debug level)
    #[default]
    Clamp,
    /// Fail with `InvalidArgument`
    Reject,
}

/// Everything a compressed sparse tensor needs from its surroundings
///
/// Carries the dispatch-key-to-device map used by empty construction, the
/// beta notice emitted by full construction, and the nnz policy copied into
/// every tensor built with it.
///
/// # Example
///
/// ```ignore
/// let devices = DeviceMap::single(DispatchKey::SparseCompressedCpu, CpuDevice::new())?;
/// let ctx = CompressedContext::<CpuRuntime>::new(devices)
///     .with_nnz_policy(NnzPolicy::Reject)
///     .with_notice(Arc::new(BetaNotice::new()));
/// ```
#[derive(Debug, Clone)]
pub struct CompressedContext<R: Runtime> {
    devices: DeviceMap<R>,
    notice: Arc<BetaNotice>,
    nnz_policy: NnzPolicy,
}

impl<R: Runtime> CompressedContext<R> {
    /// Create a context using the process-wide beta notice and clamping nnz
    pub fn new(devices: DeviceMap<R>) -> Self {
        Self {
            devices,
            notice: BetaNotice::global(),
            nnz_policy: NnzPolicy::default(),
        }
    }

    /// Replace the nnz policy
    pub fn with_nnz_policy(mut self, policy: NnzPolicy) -> Self {
        self.nnz_policy = policy;
        self
    }

    /// Replace the beta notice
    pub fn with_notice(mut self, notice: Arc<BetaNotice>) -> Self {
        self.notice = notice;
        self
    }

    /// The dispatch-key-to-device map
    pub fn devices(&self) -> &DeviceMap<R> {
        &self.devices
    }

    /// The beta notice
    pub fn notice(&self) -> &BetaNotice {
        &self.notice
    }

    /// The nnz policy
    pub fn nnz_policy(&self) -> NnzPolicy {
        self.nnz_policy
    }
}
