use super::{OverlayController, OverlayRequest, RequestId, Subscription};
use std::sync::{Arc, Mutex};

/// Shared callback slot for dialog buttons.
pub type DialogCallback = Arc<dyn Fn() + Send + Sync>;

/// Payload for one modal dialog. Labels fall back to "OK"/"Cancel" when
/// unset; callbacks are optional and fire on the matching button.
#[derive(Clone, Default)]
pub struct DialogOptions {
    pub title: String,
    pub body: String,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
    pub width: Option<u16>,
    pub on_confirm: Option<DialogCallback>,
    pub on_cancel: Option<DialogCallback>,
}

impl DialogOptions {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn confirm_label(&self) -> &str {
        self.confirm_label.as_deref().unwrap_or("OK")
    }

    pub fn cancel_label(&self) -> &str {
        self.cancel_label.as_deref().unwrap_or("Cancel")
    }
}

pub type DialogRequest = OverlayRequest<DialogOptions>;

/// Pollable outcome of [`DialogController::confirm`]. Stays `None` until the
/// user picks a button; the first resolution wins and later ones are ignored.
#[derive(Clone, Default)]
pub struct Confirmation {
    outcome: Arc<Mutex<Option<bool>>>,
}

impl Confirmation {
    fn resolve(&self, accepted: bool) {
        if let Ok(mut outcome) = self.outcome.lock() {
            if outcome.is_none() {
                *outcome = Some(accepted);
            }
        }
    }

    pub fn resolved(&self) -> Option<bool> {
        self.outcome.lock().ok().and_then(|outcome| *outcome)
    }
}

/// Pollable outcome of [`DialogController::alert`].
#[derive(Clone, Default)]
pub struct Acknowledgement {
    seen: Arc<Mutex<bool>>,
}

impl Acknowledgement {
    fn acknowledge(&self) {
        if let Ok(mut seen) = self.seen.lock() {
            *seen = true;
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.seen.lock().map(|seen| *seen).unwrap_or(false)
    }
}

/// Imperative dialog queue. `open` takes the options verbatim; `confirm` and
/// `alert` additionally wrap the button callbacks so the dialog closes itself
/// and settles a pollable cell. Wrapping runs the caller's callback first,
/// then removes the entry, then resolves, so the cell never reads as settled
/// while the dialog is still in the queue.
#[derive(Clone, Default)]
pub struct DialogController {
    inner: OverlayController<DialogOptions>,
}

impl std::fmt::Debug for DialogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogController").finish_non_exhaustive()
    }
}

impl DialogController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, options: DialogOptions) -> RequestId {
        self.inner.open(options)
    }

    pub fn close(&self, id: RequestId) {
        self.inner.close(id);
    }

    pub fn close_all(&self) {
        self.inner.close_all();
    }

    pub fn dialogs(&self) -> Vec<DialogRequest> {
        self.inner.entries()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.inner.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&[DialogRequest]) + Send + Sync + 'static,
    ) -> Subscription<DialogOptions> {
        self.inner.subscribe(listener)
    }

    /// Open a two-button dialog whose outcome can be polled.
    pub fn confirm(&self, options: DialogOptions) -> Confirmation {
        let confirmation = Confirmation::default();
        let controller = self.inner.clone();
        let cell = confirmation.clone();
        self.inner.open_with(move |id| {
            let mut options = options;
            let user_confirm = options.on_confirm.take();
            let accept_controller = controller.clone();
            let accept_cell = cell.clone();
            options.on_confirm = Some(Arc::new(move || {
                if let Some(callback) = &user_confirm {
                    callback();
                }
                accept_controller.close(id);
                accept_cell.resolve(true);
            }));
            let user_cancel = options.on_cancel.take();
            options.on_cancel = Some(Arc::new(move || {
                if let Some(callback) = &user_cancel {
                    callback();
                }
                controller.close(id);
                cell.resolve(false);
            }));
            options
        });
        confirmation
    }

    /// Open a single-button dialog whose dismissal can be polled.
    pub fn alert(&self, options: DialogOptions) -> Acknowledgement {
        let acknowledgement = Acknowledgement::default();
        let controller = self.inner.clone();
        let cell = acknowledgement.clone();
        self.inner.open_with(move |id| {
            let mut options = options;
            let user_confirm = options.on_confirm.take();
            // alerts render a single button
            options.on_cancel = None;
            options.cancel_label = None;
            options.on_confirm = Some(Arc::new(move || {
                if let Some(callback) = &user_confirm {
                    callback();
                }
                controller.close(id);
                cell.acknowledge();
            }));
            options
        });
        acknowledgement
    }
}
