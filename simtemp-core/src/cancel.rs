use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::state::DeviceCell;

/// External cancellation signal for blocking reads.
///
/// Cancelling wakes every read currently blocked with this token; they fail
/// with `DeviceError::Interrupted`. A cancelled token stays cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    listeners: Mutex<Vec<Weak<DeviceCell>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let listeners = std::mem::take(&mut *self.inner.listeners.lock());
        for cell in listeners.iter().filter_map(Weak::upgrade) {
            cell.wake_waiters();
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Makes sure `cancel()` will wake readers blocked on `cell`.
    pub(crate) fn subscribe(&self, cell: &Arc<DeviceCell>) {
        let mut listeners = self.inner.listeners.lock();
        listeners.retain(|known| known.strong_count() > 0);
        if !listeners
            .iter()
            .any(|known| std::ptr::eq(known.as_ptr(), Arc::as_ptr(cell)))
        {
            listeners.push(Arc::downgrade(cell));
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
