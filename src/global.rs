//! A process-wide container.
//!
//! The container is installed once, explicitly, at process start. Nothing here builds a
//! container on first access.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::container::Container;

static INSTALLED: OnceLock<Mutex<Container>> = OnceLock::new();

/// Installs `container` as the process-wide container.
///
/// # Errors
///
/// Gives `container` back if a container is already installed.
pub fn install(container: Container) -> Result<(), Container> {
    INSTALLED
        .set(Mutex::new(container))
        .map_err(|rejected| rejected.into_inner().unwrap_or_else(PoisonError::into_inner))
}

/// Returns the process-wide container, if one is installed.
pub fn installed() -> Option<&'static Mutex<Container>> {
    INSTALLED.get()
}

/// Locks the process-wide container, if one is installed. A poisoned lock is recovered.
pub fn lock() -> Option<MutexGuard<'static, Container>> {
    installed().map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
}

/// Runs `f` on the process-wide container, if one is installed.
pub fn with_installed<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Container) -> R,
{
    lock().map(|mut container| f(&mut container))
}
