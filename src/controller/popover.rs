use super::{OverlayController, OverlayRequest, RequestId, Subscription};
use crate::geometry::{CellRect, Placement};
use crate::placement::{PanelPosition, resolve_placement};

/// Payload for one anchored popover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopoverOptions {
    pub content: String,
    pub anchor: CellRect,
    pub placement: Placement,
    pub gap: u16,
    pub arrow: bool,
    pub width: Option<u16>,
    pub height: Option<u16>,
}

impl Default for PopoverOptions {
    fn default() -> Self {
        Self {
            content: String::new(),
            anchor: CellRect::default(),
            placement: Placement::default(),
            gap: 1,
            arrow: true,
            width: None,
            height: None,
        }
    }
}

impl PopoverOptions {
    pub fn new(content: impl Into<String>, anchor: CellRect) -> Self {
        Self {
            content: content.into(),
            anchor,
            ..Self::default()
        }
    }

    /// Where a panel of the given size lands relative to the stored anchor.
    pub fn position(&self, panel: CellRect) -> PanelPosition {
        resolve_placement(self.anchor, panel, self.placement, self.gap, self.arrow)
    }
}

pub type PopoverRequest = OverlayRequest<PopoverOptions>;

/// Imperative popover queue. Pure bookkeeping; sizing and drawing stay with
/// the host, which calls [`PopoverOptions::position`] once it knows the
/// panel dimensions.
#[derive(Clone, Default)]
pub struct PopoverController {
    inner: OverlayController<PopoverOptions>,
}

impl PopoverController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, options: PopoverOptions) -> RequestId {
        self.inner.open(options)
    }

    pub fn close(&self, id: RequestId) {
        self.inner.close(id);
    }

    pub fn close_all(&self) {
        self.inner.close_all();
    }

    pub fn popovers(&self) -> Vec<PopoverRequest> {
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
        listener: impl Fn(&[PopoverRequest]) + Send + Sync + 'static,
    ) -> Subscription<PopoverOptions> {
        self.inner.subscribe(listener)
    }
}
