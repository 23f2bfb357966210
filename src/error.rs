use thiserror::Error;

/// Configuration errors surfaced by the kernel and runtime.
///
/// These name the offending module or service and are meant for the
/// integrator to fix; soft misses (unknown ids, absent services) are not
/// errors and come back as `Option` or no-ops instead.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("module `{0}` is already mounted")]
    DuplicateModule(String),
    #[error("service `{0}` is already registered")]
    DuplicateService(String),
    #[error("capability `{0}` is not installed; mount its module first")]
    MissingCapability(String),
}
