//! Mock database.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jacket_config::Config;
use jacket_core::{BoxError, Module};

/// Address used when the `address` key is not set.
pub const DEFAULT_ADDRESS: &str = "localhost:3306";

pub trait Database: Module {
    fn connect(&self) -> Result<(), BoxError>;

    /// The configured address.
    fn address(&self) -> String;

    fn is_connected(&self) -> bool;
}

/// [`MockDatabase`] connects to nothing; it only reads its address from the config.
pub struct MockDatabase {
    config: Arc<dyn Config>,
    connected: AtomicBool,
}

impl MockDatabase {
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self {
            config,
            connected: AtomicBool::new(false),
        }
    }
}

impl Database for MockDatabase {
    fn connect(&self) -> Result<(), BoxError> {
        debug!(address = %self.address(), "connect");
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn address(&self) -> String {
        self.config.get_string("address", DEFAULT_ADDRESS)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Module for MockDatabase {
    fn close(&self) -> Result<(), BoxError> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

/// Injects a [`MockDatabase`].
///
/// # Errors
///
/// Never fails.
pub fn inject_mock_database(config: Arc<dyn Config>) -> Result<Arc<dyn Database>, BoxError> {
    Ok(Arc::new(MockDatabase::new(config)))
}

#[cfg(test)]
mod tests {
    use jacket_config::LayeredConfig;

    use super::*;

    #[test]
    fn test_inject_mock_database() {
        let config = Arc::new(LayeredConfig::empty());
        let db = inject_mock_database(config).unwrap();
        assert_eq!(db.address(), DEFAULT_ADDRESS);
        assert!(!db.is_connected());

        db.connect().unwrap();
        assert!(db.is_connected());

        db.close().unwrap();
        assert!(!db.is_connected());
    }

    #[test]
    fn test_configured_address() {
        let config = Arc::new(LayeredConfig::empty().with_value("address", "db.internal:3307"));
        let db = MockDatabase::new(config);
        assert_eq!(db.address(), "db.internal:3307");
    }
}
