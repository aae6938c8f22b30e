//! # The service container
//!
//! [`ServiceContainer`] is the capability the delegate factory needs:
//! fetch a shared service by name, or build a fresh one with options.
//! It is always passed explicitly, never reached through global state.
//!
//! [`ServiceManager`] is a small in-memory implementation, enough to run
//! delegated services end to end.
//!
//! # Architecture
//! ```text
//! ServiceManagerBuilder ──build()──> ServiceManager ──configure()──> (bootstrap bindings)
//!                                         │
//!                                get() / build()
//!                                         │
//!                                         ▼
//!                               Arc<dyn Any + Send + Sync>
//! ```
//!
//! # Examples
//! ```rust
//! use wakil_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Mailer {
//!     host: String,
//! }
//!
//! let manager = ServiceManager::builder()
//!     .factory("mailer", |_, options| {
//!         let host = options
//!             .and_then(|o| o.get("host"))
//!             .and_then(ConfigValue::as_str)
//!             .unwrap_or("localhost");
//!         Ok(Mailer { host: host.to_string() })
//!     })
//!     .build()
//!     .expect("Failed to build manager");
//!
//! let shared: Arc<Mailer> = get_as(&manager, "mailer").expect("Failed to get");
//! assert_eq!(shared.host, "localhost");
//! ```

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};
use wakil_support::rendering::suggest_similar;

use crate::config::ConfigMap;
use crate::error::{
    AlreadyRegisteredError, CircularDelegationError, NotFoundError, Result, WakilError,
};
use crate::module::{FactoryRegistry, Module};
use crate::registry::{Producer, Registration, Registry};

/// A type-erased service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Type alias for factory functions.
///
/// A factory receives the container (to fetch its own dependencies), the
/// name it was requested under, and the build options. Options are `None`
/// for a shared `get` and `Some` for a `build`.
pub type FactoryFn =
    Arc<dyn Fn(&dyn ServiceContainer, &str, Option<&ConfigMap>) -> Result<Service> + Send + Sync>;

/// A named service container.
///
/// `get` and `build` differ in object identity: `get` returns the shared
/// instance for a name, `build` always produces a new one.
pub trait ServiceContainer: Send + Sync {
    /// Fetches the shared instance registered under `name`.
    fn get(&self, name: &str) -> Result<Service>;

    /// Builds a fresh instance of `name` with the given options.
    fn build(&self, name: &str, options: &ConfigMap) -> Result<Service>;

    /// Returns `true` if `name` can be fetched or built.
    fn has(&self, name: &str) -> bool;
}

// ═══════════════════════════════════════════
// ServiceManagerBuilder
// ═══════════════════════════════════════════

/// Builds a [`ServiceManager`].
///
/// Registration errors (duplicates, failing modules) are remembered and
/// reported by [`build()`](ServiceManagerBuilder::build).
pub struct ServiceManagerBuilder {
    registry: Registry,
    allow_override: bool,
    error: Option<WakilError>,
}

impl ServiceManagerBuilder {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            allow_override: false,
            error: None,
        }
    }

    /// Allow overriding previously registered services.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Register a pre-built value. `get` returns it; `build` is refused.
    pub fn service<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        let registration = Registration::instance(name, Arc::new(value));
        self.record(registration);
        self
    }

    /// Register a typed factory.
    ///
    /// Called once for the shared instance (cached), and on every `build`.
    pub fn factory<T: Send + Sync + 'static>(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&dyn ServiceContainer, Option<&ConfigMap>) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        let erased: FactoryFn = Arc::new(
            move |container: &dyn ServiceContainer, _: &str, options: Option<&ConfigMap>| {
                Ok(Arc::new(factory(container, options)?) as Service)
            },
        );
        self.record(Registration::factory(name, erased));
        self
    }

    /// Register a raw, type-erased factory.
    pub fn factory_fn(mut self, name: impl Into<String>, factory: FactoryFn) -> Self {
        self.record(Registration::factory(name, factory));
        self
    }

    /// Let a [`Module`] register its factories.
    pub fn add_module(mut self, module: &dyn Module) -> Self {
        debug!(module = module.name(), "Bootstrapping module");
        if let Err(err) = module.on_bootstrap(&mut self) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Build the manager.
    ///
    /// # Errors
    /// Returns the first error recorded during registration.
    #[instrument(skip(self), name = "service_manager_build")]
    pub fn build(self) -> Result<ServiceManager> {
        if let Some(err) = self.error {
            return Err(err);
        }

        info!(registered = self.registry.len(), "Service manager built");
        Ok(ServiceManager {
            registry: self.registry,
            allow_override: self.allow_override,
        })
    }

    fn record(&mut self, registration: Registration) {
        if let Err(err) = self.registry.register(registration, self.allow_override) {
            self.error.get_or_insert(err);
        }
    }
}

impl FactoryRegistry for ServiceManagerBuilder {
    fn register_factory(&mut self, name: String, factory: FactoryFn) -> Result<()> {
        self.registry
            .register(Registration::factory(name, factory), self.allow_override)
    }
}

// ═══════════════════════════════════════════
// ServiceManager
// ═══════════════════════════════════════════

/// Thread-safe, name-keyed service container.
///
/// Created by [`ServiceManagerBuilder::build()`]. Further factories can be
/// added afterwards with [`configure`](ServiceManager::configure).
pub struct ServiceManager {
    registry: Registry,
    allow_override: bool,
}

impl ServiceManager {
    /// Create a new builder.
    pub fn builder() -> ServiceManagerBuilder {
        ServiceManagerBuilder::new()
    }

    /// Register additional factories on a built manager.
    ///
    /// Returns how many factories were registered. Unless overriding is
    /// allowed, every name is checked before anything is registered, so a
    /// failed call leaves the manager unchanged.
    ///
    /// # Errors
    /// [`WakilError::AlreadyRegistered`] for the first name that is taken,
    /// or that appears twice in `factories`.
    pub fn configure(
        &self,
        factories: impl IntoIterator<Item = (String, FactoryFn)>,
    ) -> Result<usize> {
        let factories: Vec<(String, FactoryFn)> = factories.into_iter().collect();

        if !self.allow_override {
            let mut seen = HashSet::new();
            for (name, _) in &factories {
                if self.registry.contains(name) || !seen.insert(name.as_str()) {
                    return Err(WakilError::AlreadyRegistered(AlreadyRegisteredError {
                        name: name.clone(),
                    }));
                }
            }
        }

        let count = factories.len();
        for (name, factory) in factories {
            self.registry
                .register(Registration::factory(name, factory), self.allow_override)?;
        }
        debug!(count, "Configured factories");
        Ok(count)
    }

    /// Bootstrap a [`Module`] against the built manager.
    ///
    /// The module's factories are collected first and registered through
    /// [`configure`](ServiceManager::configure) in one step.
    pub fn bootstrap(&mut self, module: &dyn Module) -> Result<()> {
        debug!(module = module.name(), "Bootstrapping module");
        let mut pending = PendingFactories::default();
        module.on_bootstrap(&mut pending)?;
        self.configure(pending.factories).map(|_| ())
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn registration(&self, name: &str) -> Result<Registration> {
        self.registry.get(name).ok_or_else(|| {
            let names = self.registry.names();
            let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
            WakilError::NotFound(NotFoundError {
                name: name.to_string(),
                suggestions: suggest_similar(name, &candidates, 3),
            })
        })
    }
}

impl ServiceContainer for ServiceManager {
    fn get(&self, name: &str) -> Result<Service> {
        trace!(name, "Fetching shared service");
        let _guard = ResolutionGuard::enter(self, name)?;

        match self.registration(name)?.producer {
            Producer::Instance(service) => Ok(service),
            Producer::Factory { factory, shared } => shared
                .get_or_try_init(|| factory(self, name, None))
                .cloned(),
        }
    }

    fn build(&self, name: &str, options: &ConfigMap) -> Result<Service> {
        trace!(name, options = options.len(), "Building service");
        let _guard = ResolutionGuard::enter(self, name)?;

        match self.registration(name)?.producer {
            Producer::Instance(_) => Err(WakilError::build_failed(
                name,
                "service was registered as a pre-built instance and cannot be built with options",
            )),
            Producer::Factory { factory, .. } => factory(self, name, Some(options)),
        }
    }

    fn has(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}

/// Factories a module registered, not yet applied to a manager.
#[derive(Default)]
struct PendingFactories {
    factories: Vec<(String, FactoryFn)>,
}

impl FactoryRegistry for PendingFactories {
    fn register_factory(&mut self, name: String, factory: FactoryFn) -> Result<()> {
        self.factories.push((name, factory));
        Ok(())
    }
}

thread_local! {
    /// Names being resolved on this thread, tagged with their manager.
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a name as being resolved on the current thread.
///
/// A factory that asks for a name already on the stack would otherwise
/// recurse without end, or block on its own shared-instance cell.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(manager: &ServiceManager, name: &str) -> Result<Self> {
        let id = manager as *const ServiceManager as usize;

        RESOLVING.with_borrow_mut(|stack| {
            if let Some(start) = stack.iter().position(|(m, n)| *m == id && n == name) {
                let mut chain: Vec<String> =
                    stack[start..].iter().map(|(_, n)| n.clone()).collect();
                chain.push(name.to_string());

                warn!(cycle = ?chain, "Circular resolution detected");
                return Err(WakilError::CircularDelegation(CircularDelegationError { chain }));
            }

            stack.push((id, name.to_string()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceManager")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Typed helpers
// ═══════════════════════════════════════════

/// Fetch a shared service and downcast it.
///
/// ```rust,ignore
/// let mailer: Arc<Mailer> = get_as(&manager, "mailer")?;
/// ```
pub fn get_as<T: Send + Sync + 'static>(container: &dyn ServiceContainer, name: &str) -> Result<Arc<T>> {
    downcast(name, container.get(name)?)
}

/// Build a fresh service and downcast it.
pub fn build_as<T: Send + Sync + 'static>(
    container: &dyn ServiceContainer,
    name: &str,
    options: &ConfigMap,
) -> Result<Arc<T>> {
    downcast(name, container.build(name, options)?)
}

fn downcast<T: Send + Sync + 'static>(name: &str, service: Service) -> Result<Arc<T>> {
    service.downcast::<T>().map_err(|_| WakilError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{
        FactoryFn, Service, ServiceContainer, ServiceManager, ServiceManagerBuilder, build_as,
        get_as,
    };
    pub use crate::config::{ConfigMap, ConfigValue};
    pub use crate::delegate::{BuildDelegator, ResolutionRequest, resolve_request};
    pub use crate::error::{Result, WakilError};
    pub use crate::key::DottedKey;
    pub use crate::module::{BuildDelegatorModule, FactoryRegistry, Module};
    pub use crate::path::resolve;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
