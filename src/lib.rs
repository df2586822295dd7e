//! Runtime dependency injection for applications assembled from configuration.
//!
//! Modules are registered as injectors, functions from their dependencies to the module, under
//! a module name. A [`Container`] builds the modules named in its [`Activation`], resolving
//! each injector parameter by its type, and closes them on shutdown. Swapping an
//! implementation, e.g. for a mock, is a matter of activating another module name.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
pub(crate) mod macros;

pub mod activation;
pub mod container;
pub mod error;
pub mod global;
pub mod injector;
pub mod registry;

#[doc(inline)]
pub use jacket_config as config;
pub use jacket_core::{BoxError, Contract, Erased, Module, ModuleValue, ReturnValue, Returns};

pub use activation::{Activation, BOOTSTRAP_MODULE};
pub use container::{Container, ContainerBuilder};
pub use error::{Error, Result};
pub use injector::{Injector, InjectorObject};
pub use registry::{InjectorMap, Instance};
