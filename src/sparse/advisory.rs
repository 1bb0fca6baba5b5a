//! One-time beta status notice

use super::CompressedLayout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Emit-once advisory that compressed sparse support is in beta
///
/// Every full construction calls [`BetaNotice::emit`]; only the first call on
/// a given notice logs. Share one notice through an `Arc` to get
/// emit-once-per-process behaviour, or give each context its own.
#[derive(Debug, Default)]
pub struct BetaNotice {
    fired: AtomicBool,
}

impl BetaNotice {
    /// Create a notice that has not fired yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide notice
    pub fn global() -> Arc<BetaNotice> {
        static GLOBAL: OnceLock<Arc<BetaNotice>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(BetaNotice::new())))
    }

    /// Log the advisory for `layout` unless this notice already fired
    ///
    /// Returns true if this call logged.
    pub fn emit(&self, layout: CompressedLayout) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        log::warn!(
            target: "sparse_compressed",
            "Sparse {} tensor support is in beta state. Missing functionality should be reported as a feature request.",
            layout.upper_name()
        );
        true
    }

    /// Whether the advisory has been logged
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Re-arm the notice
    pub fn reset(&self) {
        self.fired.store(false, Ordering::Release);
    }
}
