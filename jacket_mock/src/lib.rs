//! Mock modules and their injectors, for exercising `jacket` containers.
//!
//! The modules form a small chain: a [`Database`] configured from the `address` key, a
//! [`Blockchain`] stored in it, and two servers exposing the chain. [`faulty`] holds modules
//! that fail on purpose and [`tracked`] records close order.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
pub(crate) mod macros;

pub mod blockchain;
pub mod database;
pub mod faulty;
pub mod server;
pub mod tracked;

pub use blockchain::{Block, Blockchain, GENESIS_BLOCK_DATA, MockBlockchain, inject_mock_blockchain};
pub use database::{DEFAULT_ADDRESS, Database, MockDatabase, inject_mock_database};
pub use faulty::{Health, inject_failing_module, inject_faulty_module};
pub use server::{
    ExplorerServer, MockExplorerServer, MockRestApiServer, RestApiServer,
    inject_mock_explorer_server, inject_mock_rest_api_server,
};
pub use tracked::{CloseLog, Tracked};
