//! Process-wide cancellation token
//!
//! A `StopFlag` is cloned into every worker, the driver, the keyboard
//! monitor and the interrupt handler. It only ever goes from clear to set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Monotonic one-way stop signal shared by reference
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    inner: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Setting an already-set flag is a no-op.
    pub fn set(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Lock-free read used by every polling loop
    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_clear() {
        assert!(!StopFlag::new().is_set());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = StopFlag::new();
        let other = flag.clone();
        other.set();
        assert!(flag.is_set());
        // Setting twice keeps it set
        flag.set();
        assert!(other.is_set());
    }

    #[test]
    fn test_visible_across_threads() {
        let flag = StopFlag::new();
        let remote = flag.clone();
        std::thread::spawn(move || remote.set()).join().unwrap();
        assert!(flag.is_set());
    }
}
