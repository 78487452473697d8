use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop request shared between a worker loop and its supervisor.
///
/// Loops check the flag once per iteration; raising it never interrupts an
/// action that is already running.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    raised: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag for every clone.
    pub fn trigger(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been raised.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
