use std::sync::{Arc, Mutex};

use super::{CloseCell, OverlayFlags, OverlayId};

/// Z-order allocation for the overlay stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub z_base: u32,
    pub z_step: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            z_base: 1000,
            z_step: 10,
        }
    }
}

struct OverlayEntry {
    id: OverlayId,
    flags: OverlayFlags,
    close: CloseCell,
    z_index: u32,
}

/// Read-only view of one stack member, in stack order (bottom first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayInfo {
    pub id: OverlayId,
    pub flags: OverlayFlags,
    pub z_index: u32,
}

struct CoordinatorState {
    stack: Vec<OverlayEntry>,
    next_overlay_seq: u64,
    config: CoordinatorConfig,
}

impl CoordinatorState {
    fn reassign_z(&mut self) {
        for (idx, entry) in self.stack.iter_mut().enumerate() {
            entry.z_index = self
                .config
                .z_base
                .saturating_add(self.config.z_step.saturating_mul(idx as u32));
        }
    }
}

/// Tracks the ordered set of open overlays for one runtime root.
///
/// The stack, not any single overlay, owns z-order and Escape priority;
/// overlays open and close independently and in arbitrary combinations
/// (a popover inside a dialog, say), so purely local logic cannot keep
/// layering correct or stop two overlays from reacting to one Escape press.
/// Cloning the handle shares the stack.
#[derive(Clone)]
pub struct OverlayCoordinator {
    inner: Arc<Mutex<CoordinatorState>>,
}

impl Default for OverlayCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CoordinatorState {
                stack: Vec::new(),
                next_overlay_seq: 0,
                config,
            })),
        }
    }

    /// Mint a stable unique id for a prospective stack member.
    pub fn mint_id(&self) -> OverlayId {
        let Ok(mut state) = self.inner.lock() else {
            return OverlayId(u64::MAX);
        };
        let id = OverlayId(state.next_overlay_seq);
        state.next_overlay_seq = state.next_overlay_seq.saturating_add(1);
        id
    }

    /// Append to the stack top and assign a z-order slot.
    ///
    /// A duplicate id is a no-op (returns false): duplicate calls arise
    /// naturally from lifecycle races and are tolerated here, unlike in the
    /// kernel registries.
    pub fn register(&self, id: OverlayId, flags: OverlayFlags, close: CloseCell) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        if state.stack.iter().any(|entry| entry.id == id) {
            return false;
        }
        let z_index = state
            .config
            .z_base
            .saturating_add(state.config.z_step.saturating_mul(state.stack.len() as u32));
        state.stack.push(OverlayEntry {
            id,
            flags,
            close,
            z_index,
        });
        tracing::debug!(overlay_id = ?id, z = z_index, depth = state.stack.len(), "registered overlay");
        true
    }

    /// Remove by id and close the z-order gap it leaves. Unknown ids are a
    /// silent no-op; unregister routinely races component teardown.
    pub fn unregister(&self, id: OverlayId) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        let before = state.stack.len();
        state.stack.retain(|entry| entry.id != id);
        if state.stack.len() != before {
            state.reassign_z();
            tracing::debug!(overlay_id = ?id, depth = state.stack.len(), "unregistered overlay");
        }
    }

    /// Stack top, the overlay with default interaction priority. This is not
    /// platform input focus.
    pub fn active(&self) -> Option<OverlayId> {
        let Ok(state) = self.inner.lock() else {
            return None;
        };
        state.stack.last().map(|entry| entry.id)
    }

    /// Assigned z-order, or the configured base for an unknown id so callers
    /// may query speculatively before registration completes.
    pub fn z_index(&self, id: OverlayId) -> u32 {
        let Ok(state) = self.inner.lock() else {
            return CoordinatorConfig::default().z_base;
        };
        state
            .stack
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.z_index)
            .unwrap_or(state.config.z_base)
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.inner
            .lock()
            .map(|state| state.stack.iter().any(|entry| entry.id == id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|state| state.stack.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fresh snapshot of the stack, bottom first.
    pub fn overlays(&self) -> Vec<OverlayInfo> {
        let Ok(state) = self.inner.lock() else {
            return Vec::new();
        };
        state
            .stack
            .iter()
            .map(|entry| OverlayInfo {
                id: entry.id,
                flags: entry.flags,
                z_index: entry.z_index,
            })
            .collect()
    }

    /// Route one Escape press: scan top-down for the first member with
    /// `close_on_escape` set and invoke its close handler, then stop.
    /// Exactly one overlay reacts, always the highest eligible one, even if
    /// an ineligible overlay sits above it. Returns whether a handler fired.
    pub fn handle_escape(&self) -> bool {
        let target = {
            let Ok(state) = self.inner.lock() else {
                return false;
            };
            state
                .stack
                .iter()
                .rev()
                .find(|entry| entry.flags.close_on_escape)
                .map(|entry| (entry.id, entry.close.clone()))
        };
        // lock released above so the handler may re-enter the coordinator
        let Some((id, close)) = target else {
            return false;
        };
        tracing::debug!(overlay_id = ?id, "escape routed to overlay");
        close.invoke()
    }

    /// Logical OR of `lock_scroll` across the stack: the lock is a
    /// document-wide side effect and must hold until the last requester
    /// closes.
    pub fn should_lock_scroll(&self) -> bool {
        self.inner
            .lock()
            .map(|state| state.stack.iter().any(|entry| entry.flags.lock_scroll))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cell(counter: &Arc<AtomicUsize>) -> CloseCell {
        let cell = CloseCell::new();
        let counter = Arc::clone(counter);
        cell.set(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        cell
    }

    #[test]
    fn z_order_is_contiguous_from_base() {
        let coordinator = OverlayCoordinator::new();
        let ids: Vec<_> = (0..4).map(|_| coordinator.mint_id()).collect();
        for &id in &ids {
            assert!(coordinator.register(id, OverlayFlags::default(), CloseCell::new()));
        }
        for (k, &id) in ids.iter().enumerate() {
            assert_eq!(coordinator.z_index(id), 1000 + 10 * k as u32);
        }
    }

    #[test]
    fn unregister_reassigns_shifted_slots() {
        let coordinator = OverlayCoordinator::with_config(CoordinatorConfig {
            z_base: 100,
            z_step: 5,
        });
        let ids: Vec<_> = (0..4).map(|_| coordinator.mint_id()).collect();
        for &id in &ids {
            coordinator.register(id, OverlayFlags::default(), CloseCell::new());
        }
        coordinator.unregister(ids[1]);
        let snapshot = coordinator.overlays();
        assert_eq!(snapshot.len(), 3);
        for (j, info) in snapshot.iter().enumerate() {
            assert_eq!(info.z_index, 100 + 5 * j as u32);
        }
        assert_eq!(snapshot[1].id, ids[2]);
    }

    #[test]
    fn duplicate_register_is_a_noop() {
        let coordinator = OverlayCoordinator::new();
        let id = coordinator.mint_id();
        assert!(coordinator.register(id, OverlayFlags::default(), CloseCell::new()));
        assert!(!coordinator.register(id, OverlayFlags::default(), CloseCell::new()));
        assert_eq!(coordinator.len(), 1);
    }

    #[test]
    fn unknown_ids_fail_soft() {
        let coordinator = OverlayCoordinator::new();
        let phantom = coordinator.mint_id();
        coordinator.unregister(phantom);
        assert_eq!(coordinator.z_index(phantom), 1000);
        assert!(!coordinator.contains(phantom));
        assert_eq!(coordinator.active(), None);
    }

    #[test]
    fn escape_fires_only_the_top_eligible_handler() {
        let coordinator = OverlayCoordinator::new();
        let fired_a = Arc::new(AtomicUsize::new(0));
        let fired_b = Arc::new(AtomicUsize::new(0));
        let fired_c = Arc::new(AtomicUsize::new(0));
        let eligible = |on: bool| OverlayFlags {
            close_on_escape: on,
            ..OverlayFlags::default()
        };

        coordinator.register(coordinator.mint_id(), eligible(false), counting_cell(&fired_a));
        let b = coordinator.mint_id();
        coordinator.register(b, eligible(true), counting_cell(&fired_b));
        coordinator.register(coordinator.mint_id(), eligible(false), counting_cell(&fired_c));

        assert!(coordinator.handle_escape());
        assert_eq!(fired_a.load(Ordering::SeqCst), 0);
        assert_eq!(fired_b.load(Ordering::SeqCst), 1);
        assert_eq!(fired_c.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn escape_handler_may_unregister_reentrantly() {
        let coordinator = OverlayCoordinator::new();
        let id = coordinator.mint_id();
        let cell = CloseCell::new();
        let reentrant = coordinator.clone();
        cell.set(move || {
            reentrant.unregister(id);
        });
        coordinator.register(id, OverlayFlags::default(), cell);

        assert!(coordinator.handle_escape());
        assert!(coordinator.is_empty());
        assert!(!coordinator.handle_escape());
    }

    #[test]
    fn scroll_lock_is_an_or_across_the_stack() {
        let coordinator = OverlayCoordinator::new();
        let quiet = OverlayFlags {
            lock_scroll: false,
            ..OverlayFlags::default()
        };
        let a = coordinator.mint_id();
        let b = coordinator.mint_id();
        coordinator.register(a, quiet, CloseCell::new());
        assert!(!coordinator.should_lock_scroll());
        coordinator.register(b, OverlayFlags::default(), CloseCell::new());
        assert!(coordinator.should_lock_scroll());
        coordinator.unregister(b);
        assert!(!coordinator.should_lock_scroll());
    }

    #[test]
    fn active_tracks_the_stack_top() {
        let coordinator = OverlayCoordinator::new();
        let a = coordinator.mint_id();
        let b = coordinator.mint_id();
        coordinator.register(a, OverlayFlags::default(), CloseCell::new());
        coordinator.register(b, OverlayFlags::default(), CloseCell::new());
        assert_eq!(coordinator.active(), Some(b));
        coordinator.unregister(b);
        assert_eq!(coordinator.active(), Some(a));
    }

    #[test]
    fn overlay_snapshots_are_independent() {
        let coordinator = OverlayCoordinator::new();
        let id = coordinator.mint_id();
        coordinator.register(id, OverlayFlags::default(), CloseCell::new());
        let first = coordinator.overlays();
        let second = coordinator.overlays();
        assert_eq!(first, second);
        assert_ne!(first.as_ptr(), second.as_ptr());
    }
}
