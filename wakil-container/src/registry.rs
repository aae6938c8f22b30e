//! Service registry: the name-keyed store behind [`ServiceManager`].
//!
//! The registry maps service names to either a pre-built instance or a
//! factory that knows how to create one.
//!
//! [`ServiceManager`]: crate::container::ServiceManager

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::container::{FactoryFn, Service};
use crate::error::{AlreadyRegisteredError, WakilError};

/// How a registered service is produced.
#[derive(Clone)]
pub(crate) enum Producer {
    /// A value handed over at registration time.
    Instance(Service),
    /// A factory plus the cell caching its shared instance.
    Factory {
        factory: FactoryFn,
        shared: Arc<OnceCell<Service>>,
    },
}

/// Registration entry for a single service name.
#[derive(Clone)]
pub(crate) struct Registration {
    pub name: String,
    pub producer: Producer,
}

impl Registration {
    pub fn instance(name: impl Into<String>, service: Service) -> Self {
        Self {
            name: name.into(),
            producer: Producer::Instance(service),
        }
    }

    pub fn factory(name: impl Into<String>, factory: FactoryFn) -> Self {
        Self {
            name: name.into(),
            producer: Producer::Factory {
                factory,
                shared: Arc::new(OnceCell::new()),
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self.producer {
            Producer::Instance(_) => "instance",
            Producer::Factory { .. } => "factory",
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Stores all service registrations.
///
/// Safe to share between threads; lookups hand out clones so no map
/// guard is held while a factory runs.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    registrations: DashMap<String, Registration>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under its name.
    ///
    /// # Errors
    /// Returns [`WakilError::AlreadyRegistered`] if the name is taken
    /// and `allow_override` is false.
    pub fn register(
        &self,
        registration: Registration,
        allow_override: bool,
    ) -> Result<(), WakilError> {
        let name = registration.name.clone();

        match self.registrations.entry(name.clone()) {
            Entry::Occupied(_) if !allow_override => {
                Err(WakilError::AlreadyRegistered(AlreadyRegisteredError { name }))
            }
            Entry::Occupied(mut entry) => {
                debug!(name = %name, kind = registration.kind(), "Replaced service");
                entry.insert(registration);
                Ok(())
            }
            Entry::Vacant(entry) => {
                debug!(name = %name, kind = registration.kind(), "Registered service");
                entry.insert(registration);
                Ok(())
            }
        }
    }

    /// Looks up a registration by name.
    pub fn get(&self, name: &str) -> Option<Registration> {
        self.registrations.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
