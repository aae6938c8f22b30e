//! Configuration-driven build delegation for Wakil.

pub mod config;
pub mod container;
pub mod delegate;
pub mod descriptor;
pub mod error;
pub(crate) mod graph;
pub mod key;
pub mod module;
pub mod path;
pub(crate) mod registry;
pub mod settings;

pub use config::{ConfigMap, ConfigValue};
pub use container::prelude;
pub use delegate::{BuildDelegator, ResolutionRequest, resolve_request};
pub use error::{Result, WakilError};
pub use key::DottedKey;
