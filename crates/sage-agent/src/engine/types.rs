//! Engine concurrency guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::EngineError;

/// Guard that clears the `sending` flag on drop, ensuring it is always
/// released even if the future is cancelled or an early return occurs.
pub(super) struct SendGuard {
    flag: Arc<AtomicBool>,
}

impl SendGuard {
    /// Attempt to acquire the flag. Returns `Err` while another send is
    /// in flight.
    pub(super) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, EngineError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(EngineError::Busy);
        }
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
