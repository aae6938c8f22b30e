//! Bootstrap-time registration of factories.
//!
//! A [`Module`] contributes factories to a container while the
//! application starts. [`BuildDelegatorModule`] is the one this crate
//! ships: for every key listed in `wakil.build_delegator.keys`, it binds
//! each child entry to the delegate factory.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wakil_container::prelude::*;
//!
//! let config: ConfigValue = serde_json::from_str(r#"{
//!     "wakil": {"build_delegator": {"keys": ["acl.adapters"]}},
//!     "acl": {"adapters": {"default": "acl.memory"}}
//! }"#).unwrap();
//!
//! let module = BuildDelegatorModule::new(Arc::new(config)).unwrap();
//! let manager = ServiceManager::builder()
//!     .service("acl.memory", String::from("memory adapter"))
//!     .add_module(&module)
//!     .build()
//!     .unwrap();
//!
//! let adapter: Arc<String> = get_as(&manager, "acl.adapters.default").unwrap();
//! assert_eq!(adapter.as_str(), "memory adapter");
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::ConfigValue;
use crate::container::FactoryFn;
use crate::delegate::{BuildDelegator, resolve_request};
use crate::error::{Result, WakilError};
use crate::graph::DelegationGraph;
use crate::key::DottedKey;
use crate::path;
use crate::settings::DelegatorSettings;

/// A group of factory registrations performed at bootstrap.
///
/// This decoupling lets modules be tested against any registry.
pub trait Module: Send + Sync {
    /// Register factories. Called once while the application starts.
    fn on_bootstrap(&self, registry: &mut dyn FactoryRegistry) -> Result<()>;

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interface that modules use to register factories.
pub trait FactoryRegistry {
    /// Bind `name` to `factory`.
    fn register_factory(&mut self, name: String, factory: FactoryFn) -> Result<()>;
}

/// Computes the delegated binding names for `keys`.
///
/// Every key must resolve to a mapping; each non-null child of that
/// mapping yields `<key>.<child>`. The result is sorted and free of
/// duplicates, so it does not depend on mapping iteration order.
///
/// # Errors
/// - [`WakilError::PathNotFound`] if a key does not resolve
/// - [`WakilError::InvalidSetting`] if a key resolves to a non-mapping
///
/// # Examples
/// ```
/// use wakil_container::module::binding_names;
///
/// let root = serde_json::from_str(r#"{"x": {"y": {"q": 2, "p": 1}}}"#).unwrap();
/// let names: Vec<String> = binding_names(&root, &["x.y"])
///     .unwrap()
///     .into_iter()
///     .map(String::from)
///     .collect();
/// assert_eq!(names, ["x.y.p", "x.y.q"]);
/// ```
pub fn binding_names(root: &ConfigValue, keys: &[impl AsRef<str>]) -> Result<Vec<DottedKey>> {
    let mut bindings = BTreeSet::new();

    for key in keys {
        let key = DottedKey::parse(key.as_ref())?;
        let entry = path::resolve_key(root, &key)?;

        let children = entry.as_map().ok_or_else(|| WakilError::InvalidSetting {
            key: key.to_string(),
            expected: "mapping",
            found: entry.kind(),
        })?;

        bindings.extend(
            children
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(child, _)| key.child(child)),
        );
    }

    Ok(bindings.into_iter().collect())
}

/// Registers a [`BuildDelegator`] for every configured child key.
#[derive(Debug, Clone)]
pub struct BuildDelegatorModule {
    config: Arc<ConfigValue>,
    settings: DelegatorSettings,
}

impl BuildDelegatorModule {
    /// Creates the module, reading its settings from `config`.
    ///
    /// # Errors
    /// [`WakilError::InvalidSetting`] for a malformed settings section.
    pub fn new(config: Arc<ConfigValue>) -> Result<Self> {
        let settings = DelegatorSettings::from_config(&config)?;
        Ok(Self { config, settings })
    }

    /// Creates the module with explicit settings.
    pub fn with_settings(config: Arc<ConfigValue>, settings: DelegatorSettings) -> Self {
        Self { config, settings }
    }

    pub fn settings(&self) -> &DelegatorSettings {
        &self.settings
    }

    /// Computes and validates the bindings this module registers.
    ///
    /// # Errors
    /// - anything [`binding_names`] reports
    /// - [`WakilError::CircularDelegation`] if bindings delegate in a loop
    /// - in strict mode, the first descriptor error of any binding
    pub fn bindings(&self) -> Result<Vec<DottedKey>> {
        let bindings = binding_names(&self.config, self.settings.keys.as_slice())?;

        DelegationGraph::new(&self.config, &bindings).validate()?;

        if self.settings.strict {
            for binding in &bindings {
                resolve_request(&self.config, binding.as_str())?;
            }
            debug!(count = bindings.len(), "All delegated descriptors are valid");
        }

        Ok(bindings)
    }
}

impl Module for BuildDelegatorModule {
    #[instrument(skip_all, fields(keys = self.settings.keys.len(), strict = self.settings.strict))]
    fn on_bootstrap(&self, registry: &mut dyn FactoryRegistry) -> Result<()> {
        let bindings = self.bindings()?;
        let factory = BuildDelegator::new(Arc::clone(&self.config)).into_factory();

        for binding in &bindings {
            debug!(binding = %binding, "Binding build delegator");
            registry.register_factory(binding.to_string(), Arc::clone(&factory))?;
        }

        info!(count = bindings.len(), "Registered build delegators");
        Ok(())
    }

    fn name(&self) -> &str {
        "build_delegator"
    }
}
