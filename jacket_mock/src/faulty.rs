//! Modules that fail on purpose.

use std::sync::Arc;

use jacket_core::{BoxError, Module};

pub trait Health: Module {
    fn check(&self) -> Result<(), BoxError>;
}

/// Builds fine, fails to close.
struct FaultyModule;

impl Health for FaultyModule {
    fn check(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Module for FaultyModule {
    fn close(&self) -> Result<(), BoxError> {
        Err("mock close error".into())
    }
}

/// Injects a [`Health`] whose `close` always fails.
pub fn inject_faulty_module() -> Arc<dyn Health> {
    Arc::new(FaultyModule)
}

/// Fails with `boom`.
///
/// # Errors
///
/// Always.
pub fn inject_failing_module() -> Result<Arc<dyn Health>, BoxError> {
    Err("boom".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faulty_module() {
        let module = inject_faulty_module();
        assert!(module.check().is_ok());
        assert_eq!(module.close().unwrap_err().to_string(), "mock close error");
    }

    #[test]
    fn test_failing_module() {
        let err = inject_failing_module().err().unwrap();
        assert_eq!(err.to_string(), "boom");
    }
}
