use super::Kernel;
use crate::error::KernelError;

/// A pluggable unit of runtime capability.
///
/// `setup` runs once when the runtime root mounts, `teardown` once when it
/// unmounts. Both run in mount-array order.
pub trait Module {
    fn name(&self) -> &str;

    fn setup(&mut self, kernel: &mut Kernel) -> Result<(), KernelError>;

    fn teardown(&mut self) {}
}

/// The runtime root: owns one kernel instance plus the modules mounted into
/// it. There is no process-wide singleton; independent roots (parallel test
/// suites, embedded hosts) each construct their own.
pub struct Runtime {
    kernel: Kernel,
    modules: Vec<Box<dyn Module>>,
    mounted: bool,
}

impl Runtime {
    /// Set up `modules` in array order against a fresh kernel.
    ///
    /// Duplicate module names fail before any setup runs. If a setup fails
    /// midway, the modules that already ran are torn down (in array order)
    /// before the error is returned.
    pub fn mount(mut modules: Vec<Box<dyn Module>>) -> Result<Self, KernelError> {
        for (idx, module) in modules.iter().enumerate() {
            let name = module.name();
            if modules[..idx].iter().any(|other| other.name() == name) {
                return Err(KernelError::DuplicateModule(name.to_string()));
            }
        }

        let mut kernel = Kernel::new();
        for idx in 0..modules.len() {
            let result = modules[idx].setup(&mut kernel);
            match result {
                Ok(()) => {
                    tracing::debug!(module = modules[idx].name(), "mounted module");
                }
                Err(err) => {
                    tracing::debug!(
                        module = modules[idx].name(),
                        error = %err,
                        "module setup failed, unwinding"
                    );
                    for module in &mut modules[..idx] {
                        module.teardown();
                    }
                    return Err(err);
                }
            }
        }

        Ok(Self {
            kernel,
            modules,
            mounted: true,
        })
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel {
        &mut self.kernel
    }

    /// Tear down every mounted module, in array order. Idempotent; also runs
    /// on drop.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        for module in &mut self.modules {
            tracing::debug!(module = module.name(), "unmounting module");
            module.teardown();
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.unmount();
    }
}
