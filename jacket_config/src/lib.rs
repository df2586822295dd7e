//! Layered configuration for `jacket` containers and their modules.
//!
//! Values come from a config file overlaid by the process environment, with `${VAR}` expansion
//! on strings. See [`LayeredConfig`].
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
pub(crate) mod macros;

pub mod args;
pub mod config;
pub mod error;
pub mod expand;
pub mod layered;

pub use args::{ConfigArgs, default_config_file};
pub use config::Config;
pub use error::{ConfigError, Result};
pub use layered::LayeredConfig;

#[doc(no_inline)]
pub use figment::value::{Dict, Value};
