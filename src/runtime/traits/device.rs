//! Trait for device identification

/// Trait for device identification
///
/// Buffers compare devices through [`Device::is_same`]; two buffers of the
/// same runtime type still live on different devices when their ids differ.
pub trait Device: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}
