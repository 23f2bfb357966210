mod coordinator;
mod escape;
mod lifecycle;

pub use coordinator::{CoordinatorConfig, OverlayCoordinator, OverlayInfo};
pub use escape::EscapeRouter;
pub use lifecycle::OverlayLifecycle;

use std::sync::{Arc, Mutex};

/// Stable identity of one open overlay within a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(u64);

impl OverlayId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Per-overlay behavior flags. Everything defaults to on; opting out is the
/// exception (e.g. a tooltip that should not claim the Escape key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFlags {
    pub trap_focus: bool,
    pub close_on_escape: bool,
    pub lock_scroll: bool,
}

impl Default for OverlayFlags {
    fn default() -> Self {
        Self {
            trap_focus: true,
            close_on_escape: true,
            lock_scroll: true,
        }
    }
}

pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// Mutable cell holding the most recently supplied close handler.
///
/// The coordinator never captures a close handler directly; it captures the
/// cell, and the owning component refreshes the handler every render. Escape
/// routing therefore always invokes the latest handler, never a stale one.
#[derive(Clone, Default)]
pub struct CloseCell {
    inner: Arc<Mutex<Option<CloseHandler>>>,
}

impl CloseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, handler: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(Arc::new(handler));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = None;
        }
    }

    /// Invoke the current handler, if any. The handler is cloned out before
    /// the call so it may re-enter (set, clear, unregister) freely.
    pub fn invoke(&self) -> bool {
        let handler = match self.inner.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        let Some(handler) = handler else {
            return false;
        };
        handler();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn close_cell_runs_latest_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cell = CloseCell::new();
        assert!(!cell.invoke());

        let first = Arc::clone(&counter);
        cell.set(move || {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = Arc::clone(&counter);
        cell.set(move || {
            second.fetch_add(10, Ordering::SeqCst);
        });

        assert!(cell.invoke());
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        cell.clear();
        assert!(!cell.invoke());
    }

    #[test]
    fn close_cell_handler_may_reset_the_cell() {
        let cell = CloseCell::new();
        let reentrant = cell.clone();
        cell.set(move || {
            reentrant.clear();
        });
        assert!(cell.invoke());
        assert!(!cell.invoke());
    }
}
