use std::sync::{Arc, Mutex};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use overlay_wm::kernel::Runtime;
use overlay_wm::modules::{OVERLAY_MODULE, OverlayModule};
use overlay_wm::overlay::{
    CloseCell, EscapeRouter, OverlayCoordinator, OverlayFlags, OverlayId, OverlayLifecycle,
};

fn mounted() -> (Runtime, OverlayCoordinator, EscapeRouter) {
    let module = OverlayModule::new();
    let router = module.router();
    let runtime = Runtime::mount(vec![Box::new(module)]).unwrap();
    let coordinator = runtime
        .kernel()
        .require::<OverlayCoordinator>(OVERLAY_MODULE)
        .unwrap()
        .clone();
    (runtime, coordinator, router)
}

fn escape_press() -> Event {
    Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
}

/// Register an overlay whose close handler logs a label and removes the
/// overlay, the way a host reconciler would.
fn self_closing(
    coordinator: &OverlayCoordinator,
    flags: OverlayFlags,
    log: &Arc<Mutex<Vec<&'static str>>>,
    label: &'static str,
) -> OverlayId {
    let id = coordinator.mint_id();
    let cell = CloseCell::new();
    let inner = coordinator.clone();
    let sink = Arc::clone(log);
    cell.set(move || {
        if let Ok(mut log) = sink.lock() {
            log.push(label);
        }
        inner.unregister(id);
    });
    coordinator.register(id, flags, cell);
    id
}

#[test]
fn escape_unwinds_the_stack_top_down() {
    let (_runtime, coordinator, router) = mounted();
    let log = Arc::new(Mutex::new(Vec::new()));
    self_closing(&coordinator, OverlayFlags::default(), &log, "bottom");
    self_closing(&coordinator, OverlayFlags::default(), &log, "middle");
    self_closing(&coordinator, OverlayFlags::default(), &log, "top");

    assert!(router.handle_event(&escape_press()));
    assert!(router.handle_event(&escape_press()));
    assert!(router.handle_event(&escape_press()));
    assert_eq!(*log.lock().unwrap(), ["top", "middle", "bottom"]);

    // the stack is spent, further presses find no responder
    assert!(coordinator.is_empty());
    assert!(!router.handle_event(&escape_press()));
}

#[test]
fn tooltips_skip_escape_but_still_layer() {
    let (_runtime, coordinator, router) = mounted();
    let log = Arc::new(Mutex::new(Vec::new()));
    let tooltip_flags = OverlayFlags {
        close_on_escape: false,
        lock_scroll: false,
        ..OverlayFlags::default()
    };
    let dialog = self_closing(&coordinator, OverlayFlags::default(), &log, "dialog");
    let tooltip = self_closing(&coordinator, tooltip_flags, &log, "tooltip");

    // tooltip sits on top yet the dialog answers the press
    assert_eq!(coordinator.active(), Some(tooltip));
    assert!(router.handle_event(&escape_press()));
    assert_eq!(*log.lock().unwrap(), ["dialog"]);
    assert!(!coordinator.contains(dialog));

    // the survivor slides down to the base slot
    assert_eq!(coordinator.z_index(tooltip), 1000);
    assert!(!router.handle_event(&escape_press()));
    assert!(coordinator.contains(tooltip));
}

#[test]
fn z_order_stays_contiguous_through_mixed_closes() {
    let (_runtime, coordinator, _router) = mounted();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = self_closing(&coordinator, OverlayFlags::default(), &log, "first");
    let second = self_closing(&coordinator, OverlayFlags::default(), &log, "second");
    let third = self_closing(&coordinator, OverlayFlags::default(), &log, "third");
    assert_eq!(coordinator.z_index(third), 1020);

    coordinator.unregister(second);
    assert_eq!(coordinator.z_index(first), 1000);
    assert_eq!(coordinator.z_index(third), 1010);
    assert_eq!(coordinator.active(), Some(third));
    assert_eq!(coordinator.len(), 2);
}

#[test]
fn scroll_lock_releases_with_the_last_locker() {
    let (_runtime, coordinator, _router) = mounted();
    let log = Arc::new(Mutex::new(Vec::new()));
    let tooltip_flags = OverlayFlags {
        lock_scroll: false,
        ..OverlayFlags::default()
    };
    let tooltip = self_closing(&coordinator, tooltip_flags, &log, "tooltip");
    assert!(!coordinator.should_lock_scroll());

    let dialog = self_closing(&coordinator, OverlayFlags::default(), &log, "dialog");
    assert!(coordinator.should_lock_scroll());

    coordinator.unregister(dialog);
    assert!(!coordinator.should_lock_scroll());
    coordinator.unregister(tooltip);
    assert!(coordinator.is_empty());
}

#[test]
fn lifecycle_views_register_through_the_kernel_coordinator() {
    let (_runtime, coordinator, _router) = mounted();
    let mut dialog = OverlayLifecycle::new(&coordinator);
    let mut popover = OverlayLifecycle::with_flags(
        &coordinator,
        OverlayFlags {
            lock_scroll: false,
            ..OverlayFlags::default()
        },
    );

    dialog.set_open(true);
    popover.set_open(true);
    assert!(popover.is_active());
    assert!(!dialog.is_active());
    assert_eq!(dialog.z_index(), 1000);
    assert_eq!(popover.z_index(), 1010);

    popover.set_open(false);
    assert!(dialog.is_active());
    drop(dialog);
    assert!(coordinator.is_empty());
}

#[test]
fn router_forwards_only_escape_presses() {
    let (mut runtime, coordinator, router) = mounted();
    let log = Arc::new(Mutex::new(Vec::new()));
    self_closing(&coordinator, OverlayFlags::default(), &log, "only");

    let release = Event::Key(KeyEvent::new_with_kind(
        KeyCode::Esc,
        KeyModifiers::NONE,
        KeyEventKind::Release,
    ));
    let other_key = Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
    assert!(!router.handle_event(&release));
    assert!(!router.handle_event(&other_key));
    assert!(!router.handle_event(&Event::FocusGained));
    assert!(log.lock().unwrap().is_empty());

    runtime.unmount();
    assert!(!router.handle_event(&escape_press()));
    assert!(log.lock().unwrap().is_empty());
}
