//! CPU device implementation

use crate::runtime::Device;

/// CPU device
///
/// The host is device `0`. Additional ids name logical host devices (for
/// example memory pinned to another NUMA node); buffers on different ids are
/// treated as residing on different devices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Create the default CPU device
    pub fn new() -> Self {
        Self { id: 0 }
    }

    /// Create a logical CPU device with an explicit id
    pub fn with_id(id: usize) -> Self {
        Self { id }
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        if self.id == 0 {
            "cpu".to_string()
        } else {
            format!("cpu:{}", self.id)
        }
    }
}
