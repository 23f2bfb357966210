//! Stock modules: one per capability, each registering its service and
//! exposing the imperative handle under a stable name.

use crate::controller::{DialogController, PopoverController};
use crate::error::KernelError;
use crate::kernel::{Kernel, Module};
use crate::overlay::{CoordinatorConfig, EscapeRouter, OverlayCoordinator};

pub const OVERLAY_MODULE: &str = "overlay";
pub const DIALOG_MODULE: &str = "dialog";
pub const POPOVER_MODULE: &str = "popover";

/// Installs the shared [`OverlayCoordinator`] and keeps the escape router
/// pointed at it for the lifetime of the mount.
#[derive(Default)]
pub struct OverlayModule {
    config: CoordinatorConfig,
    router: EscapeRouter,
}

impl OverlayModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Handle the host feeds input events through. Inert until the module is
    /// mounted and again after unmount.
    pub fn router(&self) -> EscapeRouter {
        self.router.clone()
    }
}

impl Module for OverlayModule {
    fn name(&self) -> &str {
        OVERLAY_MODULE
    }

    fn setup(&mut self, kernel: &mut Kernel) -> Result<(), KernelError> {
        let coordinator = OverlayCoordinator::with_config(self.config);
        self.router.install(coordinator.clone());
        kernel.register(OVERLAY_MODULE, coordinator.clone())?;
        kernel.expose(OVERLAY_MODULE, coordinator);
        Ok(())
    }

    fn teardown(&mut self) {
        self.router.remove();
    }
}

/// Installs the [`DialogController`] capability.
#[derive(Default)]
pub struct DialogModule {
    controller: DialogController,
}

impl DialogModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self) -> DialogController {
        self.controller.clone()
    }
}

impl Module for DialogModule {
    fn name(&self) -> &str {
        DIALOG_MODULE
    }

    fn setup(&mut self, kernel: &mut Kernel) -> Result<(), KernelError> {
        kernel.register(DIALOG_MODULE, self.controller.clone())?;
        kernel.expose(DIALOG_MODULE, self.controller.clone());
        Ok(())
    }

    fn teardown(&mut self) {
        self.controller.close_all();
    }
}

/// Installs the [`PopoverController`] capability.
#[derive(Default)]
pub struct PopoverModule {
    controller: PopoverController,
}

impl PopoverModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self) -> PopoverController {
        self.controller.clone()
    }
}

impl Module for PopoverModule {
    fn name(&self) -> &str {
        POPOVER_MODULE
    }

    fn setup(&mut self, kernel: &mut Kernel) -> Result<(), KernelError> {
        kernel.register(POPOVER_MODULE, self.controller.clone())?;
        kernel.expose(POPOVER_MODULE, self.controller.clone());
        Ok(())
    }

    fn teardown(&mut self) {
        self.controller.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DialogOptions;
    use crate::kernel::Runtime;
    use crate::overlay::{CloseCell, OverlayFlags};
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stock_modules() -> Vec<Box<dyn Module>> {
        vec![
            Box::new(OverlayModule::new()),
            Box::new(DialogModule::new()),
            Box::new(PopoverModule::new()),
        ]
    }

    fn escape_press() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
    }

    #[test]
    fn mounting_the_trio_exposes_every_capability() {
        let runtime = Runtime::mount(stock_modules()).unwrap();
        let kernel = runtime.kernel();

        assert!(kernel.require::<OverlayCoordinator>(OVERLAY_MODULE).is_ok());
        assert!(kernel.require::<DialogController>(DIALOG_MODULE).is_ok());
        assert!(kernel.require::<PopoverController>(POPOVER_MODULE).is_ok());
        assert_eq!(kernel.modules(), ["overlay", "dialog", "popover"]);
    }

    #[test]
    fn overlay_module_honors_a_custom_z_config() {
        let module = OverlayModule::with_config(CoordinatorConfig {
            z_base: 500,
            z_step: 5,
        });
        let runtime = Runtime::mount(vec![Box::new(module)]).unwrap();
        let coordinator = runtime
            .kernel()
            .require::<OverlayCoordinator>(OVERLAY_MODULE)
            .unwrap();

        let id = coordinator.mint_id();
        coordinator.register(id, OverlayFlags::default(), CloseCell::new());
        assert_eq!(coordinator.z_index(id), 500);
    }

    #[test]
    fn router_routes_only_while_mounted() {
        let module = OverlayModule::new();
        let router = module.router();
        assert!(!router.handle_event(&escape_press()));

        let mut runtime = Runtime::mount(vec![Box::new(module)]).unwrap();
        let coordinator = runtime
            .kernel()
            .require::<OverlayCoordinator>(OVERLAY_MODULE)
            .unwrap()
            .clone();

        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let close = CloseCell::new();
        close.set(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        coordinator.register(coordinator.mint_id(), OverlayFlags::default(), close);

        assert!(router.handle_event(&escape_press()));
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        runtime.unmount();
        assert!(!router.handle_event(&escape_press()));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn controller_modules_clear_their_queues_on_unmount() {
        let dialog_module = DialogModule::new();
        let dialogs = dialog_module.controller();
        let mut runtime = Runtime::mount(vec![Box::new(dialog_module)]).unwrap();

        dialogs.open(DialogOptions::new("Pending", "Still here?"));
        assert_eq!(dialogs.len(), 1);

        runtime.unmount();
        assert!(dialogs.is_empty());
    }
}
