use super::{CloseCell, OverlayCoordinator, OverlayFlags, OverlayId};

/// Per-overlay glue between an owning component and the coordinator.
///
/// Construction mints the stable id; `set_open` transitions drive
/// registration and unregistration, and dropping the adapter unregisters so
/// a torn-down component can never leave a stale stack entry behind. The
/// close handler lives in a [`CloseCell`] the owner refreshes every render.
pub struct OverlayLifecycle {
    coordinator: OverlayCoordinator,
    id: OverlayId,
    flags: OverlayFlags,
    close: CloseCell,
    open: bool,
}

impl OverlayLifecycle {
    pub fn new(coordinator: &OverlayCoordinator) -> Self {
        Self::with_flags(coordinator, OverlayFlags::default())
    }

    pub fn with_flags(coordinator: &OverlayCoordinator, flags: OverlayFlags) -> Self {
        Self {
            coordinator: coordinator.clone(),
            id: coordinator.mint_id(),
            flags,
            close: CloseCell::new(),
            open: false,
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn flags(&self) -> OverlayFlags {
        self.flags
    }

    /// Replace the close handler Escape routing will invoke. Call this every
    /// render so the handler never captures stale state.
    pub fn set_on_close(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.close.set(handler);
    }

    pub fn set_open(&mut self, open: bool) {
        if self.open == open {
            return;
        }
        self.open = open;
        if open {
            self.coordinator
                .register(self.id, self.flags, self.close.clone());
        } else {
            self.coordinator.unregister(self.id);
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether this overlay sits at the stack top (default interaction
    /// priority, not platform input focus).
    pub fn is_active(&self) -> bool {
        self.coordinator.active() == Some(self.id)
    }

    /// Coordinator-assigned z-order, or the base value while closed.
    pub fn z_index(&self) -> u32 {
        self.coordinator.z_index(self.id)
    }
}

impl Drop for OverlayLifecycle {
    fn drop(&mut self) {
        if self.open {
            self.coordinator.unregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn open_transitions_register_and_unregister() {
        let coordinator = OverlayCoordinator::new();
        let mut lifecycle = OverlayLifecycle::new(&coordinator);
        assert!(!lifecycle.is_open());
        assert!(coordinator.is_empty());

        lifecycle.set_open(true);
        assert!(coordinator.contains(lifecycle.id()));
        // repeated opens are absorbed
        lifecycle.set_open(true);
        assert_eq!(coordinator.len(), 1);

        lifecycle.set_open(false);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn drop_unregisters_open_overlays() {
        let coordinator = OverlayCoordinator::new();
        {
            let mut lifecycle = OverlayLifecycle::new(&coordinator);
            lifecycle.set_open(true);
            assert_eq!(coordinator.len(), 1);
        }
        assert!(coordinator.is_empty());
    }

    #[test]
    fn is_active_tracks_the_stack_top() {
        let coordinator = OverlayCoordinator::new();
        let mut below = OverlayLifecycle::new(&coordinator);
        let mut above = OverlayLifecycle::new(&coordinator);
        below.set_open(true);
        above.set_open(true);
        assert!(!below.is_active());
        assert!(above.is_active());
        assert!(above.z_index() > below.z_index());

        above.set_open(false);
        assert!(below.is_active());
    }

    #[test]
    fn escape_invokes_the_latest_close_handler() {
        let coordinator = OverlayCoordinator::new();
        let mut lifecycle = OverlayLifecycle::new(&coordinator);
        let stale = Arc::new(AtomicUsize::new(0));
        let fresh = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&stale);
        lifecycle.set_on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        lifecycle.set_open(true);

        // a later render swaps in a new handler; the registration keeps up
        let counter = Arc::clone(&fresh);
        lifecycle.set_on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(coordinator.handle_escape());
        assert_eq!(stale.load(Ordering::SeqCst), 0);
        assert_eq!(fresh.load(Ordering::SeqCst), 1);
    }
}
