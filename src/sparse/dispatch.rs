//! Dispatch keys and the explicit key-to-device map

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::collections::HashMap;
use std::fmt;

/// Backend/representation tag a tensor is constructed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    /// Sparse compressed tensor on the host
    SparseCompressedCpu,
    /// Sparse compressed tensor on an NVIDIA GPU
    SparseCompressedCuda,
    /// Sparse compressed tensor on a WebGPU adapter
    SparseCompressedWgpu,
    /// Sparse coordinate-format tensor
    SparseCoo,
    /// Dense strided tensor
    Dense,
}

impl DispatchKey {
    /// Returns true for keys that select the compressed sparse representation
    #[inline]
    pub fn is_sparse_compressed(&self) -> bool {
        matches!(
            self,
            DispatchKey::SparseCompressedCpu
                | DispatchKey::SparseCompressedCuda
                | DispatchKey::SparseCompressedWgpu
        )
    }

    /// Returns the key name
    pub fn name(&self) -> &'static str {
        match self {
            DispatchKey::SparseCompressedCpu => "SparseCompressedCpu",
            DispatchKey::SparseCompressedCuda => "SparseCompressedCuda",
            DispatchKey::SparseCompressedWgpu => "SparseCompressedWgpu",
            DispatchKey::SparseCoo => "SparseCoo",
            DispatchKey::Dense => "Dense",
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Explicit mapping from dispatch keys to the devices of one runtime
///
/// Construction resolves its key through this map instead of a global
/// backend registry. Only sparse compressed keys can be registered.
#[derive(Clone)]
pub struct DeviceMap<R: Runtime> {
    devices: HashMap<DispatchKey, R::Device>,
}

impl<R: Runtime> DeviceMap<R> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
        }
    }

    /// Create a map with a single registration
    pub fn single(key: DispatchKey, device: R::Device) -> Result<Self> {
        let mut map = Self::new();
        map.register(key, device)?;
        Ok(map)
    }

    /// Register `device` for `key`, replacing any earlier registration
    ///
    /// Fails with [`Error::InvalidDeviceTag`] for keys that do not select the
    /// compressed sparse representation.
    pub fn register(&mut self, key: DispatchKey, device: R::Device) -> Result<()> {
        if !key.is_sparse_compressed() {
            return Err(Error::InvalidDeviceTag {
                key: key.to_string(),
            });
        }
        self.devices.insert(key, device);
        Ok(())
    }

    /// Look up the device registered for `key`
    pub fn resolve(&self, key: DispatchKey) -> Result<&R::Device> {
        self.devices.get(&key).ok_or_else(|| Error::InvalidDeviceTag {
            key: key.to_string(),
        })
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<R: Runtime> Default for DeviceMap<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> fmt::Debug for DeviceMap<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.devices.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_resolve_registered() {
        let map =
            DeviceMap::<CpuRuntime>::single(DispatchKey::SparseCompressedCpu, CpuDevice::new())
                .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.resolve(DispatchKey::SparseCompressedCpu).unwrap(),
            &CpuDevice::new()
        );
    }

    #[test]
    fn test_resolve_unregistered() {
        let map =
            DeviceMap::<CpuRuntime>::single(DispatchKey::SparseCompressedCpu, CpuDevice::new())
                .unwrap();
        let err = map.resolve(DispatchKey::SparseCompressedCuda).unwrap_err();
        assert!(matches!(err, Error::InvalidDeviceTag { .. }));
        assert_eq!(
            err.to_string(),
            "Cannot construct sparse compressed tensor with dispatch key SparseCompressedCuda"
        );
    }

    #[test]
    fn test_register_non_sparse_key() {
        let mut map = DeviceMap::<CpuRuntime>::new();
        assert!(matches!(
            map.register(DispatchKey::Dense, CpuDevice::new()),
            Err(Error::InvalidDeviceTag { .. })
        ));
        assert!(map.is_empty());
        assert!(!DispatchKey::SparseCoo.is_sparse_compressed());
    }
}
