mod dialog;
mod popover;

pub use dialog::{
    Acknowledgement, Confirmation, DialogCallback, DialogController, DialogOptions, DialogRequest,
};
pub use popover::{PopoverController, PopoverOptions, PopoverRequest};

use std::sync::{Arc, Mutex};

/// Stable identity of one controller request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One open request: the minted id plus whatever options the capability
/// carries (content, callbacks, display hints).
#[derive(Clone)]
pub struct OverlayRequest<T> {
    pub id: RequestId,
    pub options: T,
}

type Listener<T> = Arc<dyn Fn(&[OverlayRequest<T>]) + Send + Sync>;

struct ControllerState<T> {
    entries: Vec<OverlayRequest<T>>,
    listeners: Vec<(u64, Listener<T>)>,
    next_request: u64,
    next_listener: u64,
}

impl<T: Clone> ControllerState<T> {
    fn listener_snapshot(&self) -> Vec<Listener<T>> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// A reusable, concurrency-free request queue for imperative overlay
/// lifecycles. Each capability (dialog, popover) instantiates one with its
/// own options payload; cloning the handle shares the queue.
///
/// Notifications are synchronous and in listener registration order, and
/// every notification passes a fresh snapshot, never the live collection, so
/// a listener may trigger further open/close calls without corrupting the
/// iteration (or deadlocking on the internal lock, which is released before
/// listeners run).
pub struct OverlayController<T> {
    inner: Arc<Mutex<ControllerState<T>>>,
}

impl<T> Clone for OverlayController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> Default for OverlayController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> OverlayController<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControllerState {
                entries: Vec::new(),
                listeners: Vec::new(),
                // id 0 stays unminted so a poisoned-lock fallback can never
                // collide with a live request
                next_request: 1,
                next_listener: 1,
            })),
        }
    }

    /// Insert a new entry and notify subscribers.
    pub fn open(&self, options: T) -> RequestId {
        self.open_with(|_| options)
    }

    /// Like [`OverlayController::open`], but the options may capture the
    /// minted id (confirm/alert wire their auto-close callbacks this way).
    pub fn open_with(&self, build: impl FnOnce(RequestId) -> T) -> RequestId {
        let id = {
            let Ok(mut state) = self.inner.lock() else {
                return RequestId(0);
            };
            let id = RequestId(state.next_request);
            state.next_request = state.next_request.saturating_add(1);
            id
        };
        let options = build(id);
        let (snapshot, listeners) = {
            let Ok(mut state) = self.inner.lock() else {
                return id;
            };
            state.entries.push(OverlayRequest { id, options });
            (state.entries.clone(), state.listener_snapshot())
        };
        tracing::debug!(request_id = ?id, open = snapshot.len(), "opened overlay request");
        notify(&snapshot, &listeners);
        id
    }

    /// Remove by id. Unknown ids are silent and notify nobody.
    pub fn close(&self, id: RequestId) {
        let removed = {
            let Ok(mut state) = self.inner.lock() else {
                return;
            };
            let before = state.entries.len();
            state.entries.retain(|entry| entry.id != id);
            if state.entries.len() == before {
                None
            } else {
                Some((state.entries.clone(), state.listener_snapshot()))
            }
        };
        let Some((snapshot, listeners)) = removed else {
            return;
        };
        tracing::debug!(request_id = ?id, open = snapshot.len(), "closed overlay request");
        notify(&snapshot, &listeners);
    }

    /// Clear the queue. An already-empty queue notifies nobody.
    pub fn close_all(&self) {
        let cleared = {
            let Ok(mut state) = self.inner.lock() else {
                return;
            };
            if state.entries.is_empty() {
                None
            } else {
                state.entries.clear();
                Some(state.listener_snapshot())
            }
        };
        let Some(listeners) = cleared else {
            return;
        };
        tracing::debug!("closed all overlay requests");
        notify(&[], &listeners);
    }

    /// Fresh snapshot of the open entries, in open order.
    pub fn entries(&self) -> Vec<OverlayRequest<T>> {
        self.inner
            .lock()
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.inner
            .lock()
            .map(|state| state.entries.iter().any(|entry| entry.id == id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a listener for every subsequent queue change. The returned
    /// subscription must be cancelled explicitly; dropping it keeps the
    /// listener installed.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[OverlayRequest<T>]) + Send + Sync + 'static,
    ) -> Subscription<T> {
        let key = {
            let Ok(mut state) = self.inner.lock() else {
                return Subscription {
                    controller: self.clone(),
                    key: 0,
                };
            };
            let key = state.next_listener;
            state.next_listener = state.next_listener.saturating_add(1);
            state.listeners.push((key, Arc::new(listener)));
            key
        };
        Subscription {
            controller: self.clone(),
            key,
        }
    }
}

fn notify<T>(snapshot: &[OverlayRequest<T>], listeners: &[Listener<T>]) {
    for listener in listeners {
        listener(snapshot);
    }
}

/// Handle for removing a listener registered with
/// [`OverlayController::subscribe`].
pub struct Subscription<T> {
    controller: OverlayController<T>,
    key: u64,
}

impl<T> Subscription<T> {
    pub fn cancel(self) {
        if let Ok(mut state) = self.controller.inner.lock() {
            state.listeners.retain(|(key, _)| *key != self.key);
        }
    }
}
