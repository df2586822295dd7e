//! Mock servers exposing a [`Blockchain`].

use std::sync::Arc;

use jacket_config::Config;
use jacket_core::{BoxError, Module};

use crate::blockchain::Blockchain;

pub trait ExplorerServer: Module {
    fn serve(&self) -> Result<(), BoxError>;

    /// The listen address, `explorer_address` in the config.
    fn address(&self) -> String;

    /// The data of every block, oldest first.
    fn all_block_data(&self) -> Vec<String>;
}

pub trait RestApiServer: Module {
    fn serve(&self) -> Result<(), BoxError>;

    fn paths(&self) -> Vec<String>;

    fn block_count(&self) -> usize;
}

pub struct MockExplorerServer {
    config: Arc<dyn Config>,
    blockchain: Arc<dyn Blockchain>,
}

impl ExplorerServer for MockExplorerServer {
    fn serve(&self) -> Result<(), BoxError> {
        Ok(())
    }

    fn address(&self) -> String {
        self.config.get_string("explorer_address", ":4000")
    }

    fn all_block_data(&self) -> Vec<String> {
        self.blockchain
            .blocks()
            .iter()
            .map(|block| block.data().to_owned())
            .collect()
    }
}

impl Module for MockExplorerServer {
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

pub struct MockRestApiServer {
    config: Arc<dyn Config>,
    blockchain: Arc<dyn Blockchain>,
}

impl RestApiServer for MockRestApiServer {
    fn serve(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// `["/"]`, or the `rest_paths` list from the config.
    fn paths(&self) -> Vec<String> {
        self.config.get_string_slice("rest_paths", &["/"])
    }

    fn block_count(&self) -> usize {
        self.blockchain.blocks().len()
    }
}

impl Module for MockRestApiServer {
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Injects a [`MockExplorerServer`].
///
/// # Errors
///
/// Never fails.
pub fn inject_mock_explorer_server(
    config: Arc<dyn Config>,
    blockchain: Arc<dyn Blockchain>,
) -> Result<Arc<dyn ExplorerServer>, BoxError> {
    Ok(Arc::new(MockExplorerServer { config, blockchain }))
}

pub fn inject_mock_rest_api_server(
    config: Arc<dyn Config>,
    blockchain: Arc<dyn Blockchain>,
) -> Arc<dyn RestApiServer> {
    Arc::new(MockRestApiServer { config, blockchain })
}
