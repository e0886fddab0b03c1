//! Session liveness
//!
//! Asynchronous continuations check liveness before committing any state
//! change, so a response arriving after teardown is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "Is the owner still active?"
pub trait Liveness: Send + Sync {
    fn is_active(&self) -> bool;

    /// Mark the owner as torn down; irreversible
    fn deactivate(&self);
}

/// Atomic-flag liveness: active from creation until `deactivate`
#[derive(Debug, Clone)]
pub struct MountGuard {
    active: Arc<AtomicBool>,
}

impl MountGuard {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness for MountGuard {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_until_deactivated() {
        let guard = MountGuard::new();
        assert!(guard.is_active());

        guard.deactivate();
        assert!(!guard.is_active());

        guard.deactivate();
        assert!(!guard.is_active());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = MountGuard::new();
        let observer = guard.clone();

        guard.deactivate();
        assert!(!observer.is_active());
    }
}
