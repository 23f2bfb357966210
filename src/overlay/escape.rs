use std::sync::{Arc, Mutex};

use crossterm::event::{Event, KeyCode, KeyEventKind};

use super::OverlayCoordinator;

/// The single process-wide Escape listener.
///
/// The host event loop feeds every input event through `handle_event`; only
/// Escape press events (not repeats or releases) reach the installed
/// coordinator. Installed once when the overlay module mounts and removed
/// once when it unmounts, regardless of how many overlays come and go in
/// between. While uninstalled the router is inert.
#[derive(Clone, Default)]
pub struct EscapeRouter {
    inner: Arc<Mutex<Option<OverlayCoordinator>>>,
}

impl EscapeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, coordinator: OverlayCoordinator) {
        if let Ok(mut slot) = self.inner.lock() {
            tracing::debug!("installed escape listener");
            *slot = Some(coordinator);
        }
    }

    pub fn remove(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            if slot.take().is_some() {
                tracing::debug!("removed escape listener");
            }
        }
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Returns true when the event was an Escape press consumed by an
    /// overlay's close handler.
    pub fn handle_event(&self, event: &Event) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        if key.code != KeyCode::Esc || key.kind != KeyEventKind::Press {
            return false;
        }
        let coordinator = match self.inner.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        let Some(coordinator) = coordinator else {
            return false;
        };
        coordinator.handle_escape()
    }
}
