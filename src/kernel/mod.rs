mod runtime;

pub use runtime::{Module, Runtime};

use std::any::Any;
use std::collections::HashMap;

use crate::error::KernelError;

type Service = Box<dyn Any + Send + Sync>;

/// Minimal service locator backing the runtime root.
///
/// Two registries, both keyed by name: internal services are write-once
/// (`register` fails loudly on a duplicate), exposed APIs tolerate overwrite
/// (`expose`) because controller-style singletons may legitimately be
/// refreshed. Lookup is typed; a name registered under a different type
/// reads back as absent.
#[derive(Default)]
pub struct Kernel {
    services: HashMap<String, Service>,
    exposed: HashMap<String, Service>,
    // insertion order of `register` calls; `services` keys are unordered
    registered: Vec<String>,
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write-once registration of a module-internal service.
    pub fn register<T: Any + Send + Sync>(
        &mut self,
        name: &str,
        service: T,
    ) -> Result<(), KernelError> {
        if self.services.contains_key(name) {
            return Err(KernelError::DuplicateService(name.to_string()));
        }
        tracing::debug!(service = name, "registered service");
        self.services.insert(name.to_string(), Box::new(service));
        self.registered.push(name.to_string());
        Ok(())
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.services
            .get(name)
            .and_then(|service| service.downcast_ref::<T>())
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Publish (or refresh) an exposed API under `name`.
    pub fn expose<T: Any + Send + Sync>(&mut self, name: &str, api: T) {
        tracing::debug!(api = name, "exposed api");
        self.exposed.insert(name.to_string(), Box::new(api));
    }

    pub fn exposed<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.exposed
            .get(name)
            .and_then(|api| api.downcast_ref::<T>())
    }

    /// Like [`Kernel::exposed`], for call sites where absence means the
    /// integrator forgot to mount a module.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> Result<&T, KernelError> {
        self.exposed(name)
            .ok_or_else(|| KernelError::MissingCapability(name.to_string()))
    }

    /// Names passed to `register`, in registration order.
    pub fn modules(&self) -> &[String] {
        &self.registered
    }

    pub fn is_ready(&self) -> bool {
        !self.registered.is_empty()
    }
}
