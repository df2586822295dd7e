//! Close-order recording.

use std::sync::{Arc, Mutex, PoisonError};

use jacket_core::{BoxError, Module};

/// [`CloseLog`] collects the names of closed [`Tracked`] modules, in close order.
#[derive(Debug, Clone, Default)]
pub struct CloseLog(Arc<Mutex<Vec<String>>>);

impl CloseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a module recording `name` into this log when closed.
    pub fn tracked(&self, name: impl Into<String>) -> Tracked {
        Tracked {
            name: name.into(),
            log: self.clone(),
            fails: false,
        }
    }

    /// Like [`tracked`](Self::tracked), but closing records `name` and then fails.
    pub fn failing(&self, name: impl Into<String>) -> Tracked {
        Tracked {
            fails: true,
            ..self.tracked(name)
        }
    }

    pub fn closed(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, name: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_owned());
    }
}

#[derive(Debug)]
pub struct Tracked {
    name: String,
    log: CloseLog,
    fails: bool,
}

impl Tracked {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Module for Tracked {
    fn close(&self) -> Result<(), BoxError> {
        self.log.record(&self.name);
        if self.fails {
            return Err(format!("failed to close `{}`", self.name).into());
        }
        Ok(())
    }
}
