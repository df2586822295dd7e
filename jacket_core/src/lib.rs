//! Core types shared by the `jacket` dependency injection crates.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub mod contract;
pub mod erased;
pub mod module;

pub use contract::Contract;
pub use erased::Erased;
pub use module::{BoxError, Module, ModuleValue, ReturnValue, Returns};
