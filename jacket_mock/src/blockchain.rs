//! Mock blockchain.

use std::sync::{Arc, Mutex, PoisonError};

use jacket_core::{BoxError, Module};

use crate::database::Database;

/// Data of the first block added by [`Blockchain::init`].
pub const GENESIS_BLOCK_DATA: &str = "Genesis Block Data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: String,
}

impl Block {
    pub fn data(&self) -> &str {
        &self.data
    }
}

pub trait Blockchain: Module {
    /// Connects the database and adds the genesis block.
    fn init(&self) -> Result<(), BoxError>;

    fn add_block(&self, data: &str) -> Result<(), BoxError>;

    /// All blocks, oldest first.
    fn blocks(&self) -> Vec<Block>;
}

/// [`MockBlockchain`] keeps its blocks in memory.
pub struct MockBlockchain {
    db: Arc<dyn Database>,
    blocks: Mutex<Vec<Block>>,
}

impl MockBlockchain {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            blocks: Mutex::new(Vec::new()),
        }
    }
}

impl Blockchain for MockBlockchain {
    fn init(&self) -> Result<(), BoxError> {
        self.db.connect()?;
        self.add_block(GENESIS_BLOCK_DATA)
    }

    fn add_block(&self, data: &str) -> Result<(), BoxError> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Block {
                data: data.to_owned(),
            });
        Ok(())
    }

    fn blocks(&self) -> Vec<Block> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Module for MockBlockchain {
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

pub fn inject_mock_blockchain(db: Arc<dyn Database>) -> Arc<dyn Blockchain> {
    Arc::new(MockBlockchain::new(db))
}

#[cfg(test)]
mod tests {
    use jacket_config::LayeredConfig;

    use super::*;
    use crate::database::inject_mock_database;

    #[test]
    fn test_inject_mock_blockchain() {
        let db = inject_mock_database(Arc::new(LayeredConfig::empty())).unwrap();
        let chain = inject_mock_blockchain(Arc::clone(&db));

        chain.init().unwrap();
        assert!(db.is_connected());

        chain.add_block("test data").unwrap();
        let blocks = chain.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].data(), GENESIS_BLOCK_DATA);
        assert_eq!(blocks[1].data(), "test data");
        assert!(chain.close().is_ok());
    }
}
