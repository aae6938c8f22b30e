//! Build delegation.
//!
//! A delegated service name is a dotted key into the configuration. The
//! entry found there either names another service to fetch, or describes
//! a service to build with options:
//!
//! ```text
//! acl.list_adapter.default  ──>  "acl.adapter.memory"                       FetchExisting
//! acl.list_adapter.sql      ──>  {service: "acl.adapter.sql", options: {…}} BuildNew
//! ```
//!
//! [`resolve_request`] turns a name into a [`ResolutionRequest`] without
//! touching any container. [`BuildDelegator`] is the factory that carries
//! the request out against a [`ServiceContainer`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{ConfigMap, ConfigValue};
use crate::container::{FactoryFn, Service, ServiceContainer};
use crate::descriptor::{DescriptorDefect, OPTIONS_KEY, SERVICE_KEY, ServiceDescriptor};
use crate::error::{InvalidDescriptorError, Result, WakilError};
use crate::path;

/// What the container should do for a delegated service.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionRequest {
    /// Retrieve the shared service registered under `name`.
    FetchExisting { name: String },
    /// Construct a new instance of `name` with `options`.
    BuildNew { name: String, options: ConfigMap },
}

impl ResolutionRequest {
    /// The target service name.
    pub fn name(&self) -> &str {
        match self {
            ResolutionRequest::FetchExisting { name } | ResolutionRequest::BuildNew { name, .. } => {
                name
            }
        }
    }

    /// Hands the request to a container.
    pub fn execute(&self, container: &dyn ServiceContainer) -> Result<Service> {
        match self {
            ResolutionRequest::FetchExisting { name } => container.get(name),
            ResolutionRequest::BuildNew { name, options } => container.build(name, options),
        }
    }
}

impl fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionRequest::FetchExisting { name } => write!(f, "get({name:?})"),
            ResolutionRequest::BuildNew { name, options } => {
                write!(f, "build({name:?}, {})", ConfigValue::Map(options.clone()))
            }
        }
    }
}

/// Resolves `requested` against `root` into a [`ResolutionRequest`].
///
/// # Errors
/// - [`WakilError::ResolutionFailed`] if the key does not resolve
/// - [`WakilError::MissingServiceKey`] / [`WakilError::MissingOptionsKey`]
///   for an incomplete `{service, options}` mapping
/// - [`WakilError::InvalidDescriptorShape`] for anything else that is
///   neither a service name nor such a mapping
///
/// # Examples
/// ```
/// use wakil_container::delegate::{ResolutionRequest, resolve_request};
///
/// let root = serde_json::from_str(r#"{"a": {"b": "svcName"}}"#).unwrap();
/// assert_eq!(
///     resolve_request(&root, "a.b").unwrap(),
///     ResolutionRequest::FetchExisting { name: "svcName".into() },
/// );
/// ```
pub fn resolve_request(root: &ConfigValue, requested: &str) -> Result<ResolutionRequest> {
    let value = path::resolve(root, requested).map_err(|source| WakilError::ResolutionFailed {
        requested: requested.to_string(),
        source,
    })?;

    match ServiceDescriptor::classify(value) {
        ServiceDescriptor::Alias(name) => Ok(ResolutionRequest::FetchExisting {
            name: name.to_string(),
        }),
        ServiceDescriptor::Buildable { service, options } => Ok(ResolutionRequest::BuildNew {
            name: service.to_string(),
            options: options.clone(),
        }),
        ServiceDescriptor::Invalid(defect) => Err(defect_error(requested, defect)),
    }
}

/// Maps a descriptor defect to the error reported for `requested`.
pub(crate) fn defect_error(requested: &str, defect: DescriptorDefect) -> WakilError {
    let requested = requested.to_string();
    match defect {
        DescriptorDefect::MissingService => WakilError::MissingServiceKey { requested },
        DescriptorDefect::MissingOptions => WakilError::MissingOptionsKey { requested },
        DescriptorDefect::ServiceNotString { found } => {
            WakilError::InvalidDescriptorShape(InvalidDescriptorError {
                requested,
                field: Some(SERVICE_KEY),
                expected: "string",
                found,
            })
        }
        DescriptorDefect::OptionsNotMapping { found } => {
            WakilError::InvalidDescriptorShape(InvalidDescriptorError {
                requested,
                field: Some(OPTIONS_KEY),
                expected: "mapping",
                found,
            })
        }
        DescriptorDefect::UnsupportedShape { found } => {
            WakilError::InvalidDescriptorShape(InvalidDescriptorError {
                requested,
                field: None,
                expected: "service name or mapping",
                found,
            })
        }
    }
}

/// The delegate factory.
///
/// Holds an immutable configuration snapshot. Invoked with the name a
/// service was requested under, it resolves that name and fetches or
/// builds the target through the container it is given.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use wakil_container::prelude::*;
///
/// let config: ConfigValue =
///     serde_json::from_str(r#"{"mail": {"default": "mailer"}}"#).unwrap();
///
/// let manager = ServiceManager::builder()
///     .service("mailer", String::from("smtp"))
///     .build()
///     .unwrap();
///
/// let delegator = BuildDelegator::new(Arc::new(config));
/// let service = delegator.invoke(&manager, "mail.default").unwrap();
/// assert_eq!(service.downcast_ref::<String>().map(String::as_str), Some("smtp"));
/// ```
#[derive(Debug, Clone)]
pub struct BuildDelegator {
    config: Arc<ConfigValue>,
}

impl BuildDelegator {
    pub fn new(config: Arc<ConfigValue>) -> Self {
        Self { config }
    }

    /// Resolves `requested` without invoking any container.
    pub fn request(&self, requested: &str) -> Result<ResolutionRequest> {
        resolve_request(&self.config, requested)
    }

    /// Resolves `requested` and carries the request out on `container`.
    ///
    /// # Errors
    /// Resolution failures are wrapped in [`WakilError::ServiceNotCreated`]
    /// with the original error as its source. Errors from the container
    /// itself are returned unchanged.
    pub fn invoke(&self, container: &dyn ServiceContainer, requested: &str) -> Result<Service> {
        let request = self.request(requested).map_err(|source| {
            warn!(requested, error = %source, "Delegated service could not be resolved");
            WakilError::ServiceNotCreated {
                requested: requested.to_string(),
                source: Box::new(source),
            }
        })?;

        debug!(requested, %request, "Delegating service");
        let service = request.execute(container)?;
        trace!(requested, target = request.name(), "Delegated service ready");
        Ok(service)
    }

    /// Wraps this delegator as a factory for registration.
    ///
    /// Build options passed to the binding itself are ignored: the options
    /// come from the configuration entry.
    pub fn into_factory(self) -> FactoryFn {
        Arc::new(
            move |container: &dyn ServiceContainer, requested: &str, _: Option<&ConfigMap>| {
                self.invoke(container, requested)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceManager;
    use serde_json::json;
    use std::error::Error as _;
    use std::sync::Mutex;

    fn config(value: serde_json::Value) -> ConfigValue {
        serde_json::from_value(value).unwrap()
    }

    fn fixture() -> ConfigValue {
        config(json!({
            "one": {
                "two": {
                    "three": "service",
                    "four": {
                        "service": "service",
                        "options": {"option1": "value1"}
                    },
                    "five": {"service": "service"},
                    "six": {"options": {}},
                    "seven": true
                }
            }
        }))
    }

    /// Records every call it receives.
    #[derive(Default)]
    struct RecordingContainer {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingContainer {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ServiceContainer for RecordingContainer {
        fn get(&self, name: &str) -> Result<Service> {
            self.calls.lock().unwrap().push(format!("get {name}"));
            Ok(Arc::new(format!("shared {name}")))
        }

        fn build(&self, name: &str, options: &ConfigMap) -> Result<Service> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("build {name} {}", ConfigValue::Map(options.clone())));
            Ok(Arc::new(format!("built {name}")))
        }

        fn has(&self, _name: &str) -> bool {
            true
        }
    }

    #[test]
    fn alias_fetches_existing() {
        let root = config(json!({"a": {"b": "svcName"}}));
        assert_eq!(
            resolve_request(&root, "a.b").unwrap(),
            ResolutionRequest::FetchExisting { name: "svcName".into() }
        );
    }

    #[test]
    fn buildable_builds_new() {
        let root = config(json!({"a": {"b": {"service": "svcName", "options": {"k": "v"}}}}));
        let expected: ConfigMap = [("k".to_string(), ConfigValue::from("v"))].into();
        assert_eq!(
            resolve_request(&root, "a.b").unwrap(),
            ResolutionRequest::BuildNew { name: "svcName".into(), options: expected }
        );
    }

    #[test]
    fn empty_options_builds_new() {
        let root = config(json!({"a": {"b": {"service": "svcName", "options": {}}}}));
        assert_eq!(
            resolve_request(&root, "a.b").unwrap(),
            ResolutionRequest::BuildNew { name: "svcName".into(), options: ConfigMap::new() }
        );
    }

    #[test]
    fn missing_options_fails() {
        let root = config(json!({"a": {"b": {"service": "svcName"}}}));
        assert!(matches!(
            resolve_request(&root, "a.b"),
            Err(WakilError::MissingOptionsKey { requested }) if requested == "a.b"
        ));
    }

    #[test]
    fn missing_service_fails() {
        let root = config(json!({"a": {"b": {"options": {}}}}));
        assert!(matches!(
            resolve_request(&root, "a.b"),
            Err(WakilError::MissingServiceKey { requested }) if requested == "a.b"
        ));
    }

    #[test]
    fn scalar_is_invalid_shape() {
        let root = fixture();
        match resolve_request(&root, "one.two.seven").unwrap_err() {
            WakilError::InvalidDescriptorShape(e) => {
                assert_eq!(e.requested, "one.two.seven");
                assert_eq!(e.found, "bool");
                assert_eq!(e.field, None);
            }
            other => panic!("Expected InvalidDescriptorShape, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_key_is_resolution_failure() {
        let root = fixture();
        match resolve_request(&root, "one.two.abc").unwrap_err() {
            WakilError::ResolutionFailed { requested, source } => {
                assert_eq!(requested, "one.two.abc");
                assert_eq!(source.segment, "abc");
            }
            other => panic!("Expected ResolutionFailed, got: {other:?}"),
        }
    }

    #[test]
    fn empty_name_is_resolution_failure() {
        let root = fixture();
        assert!(matches!(
            resolve_request(&root, ""),
            Err(WakilError::ResolutionFailed { source, .. }) if source.is_empty_key()
        ));
    }

    #[test]
    fn invoke_without_build_options_fetches() {
        let container = RecordingContainer::default();
        let delegator = BuildDelegator::new(Arc::new(fixture()));

        let service = delegator.invoke(&container, "one.two.three").unwrap();

        assert_eq!(service.downcast_ref::<String>().unwrap(), "shared service");
        assert_eq!(container.calls(), vec!["get service"]);
    }

    #[test]
    fn invoke_with_build_options_builds() {
        let container = RecordingContainer::default();
        let delegator = BuildDelegator::new(Arc::new(fixture()));

        let service = delegator.invoke(&container, "one.two.four").unwrap();

        assert_eq!(service.downcast_ref::<String>().unwrap(), "built service");
        assert_eq!(
            container.calls(),
            vec![r#"build service {"option1": "value1"}"#]
        );
    }

    #[test]
    fn invoke_failures_are_not_created_and_touch_nothing() {
        let container = RecordingContainer::default();
        let delegator = BuildDelegator::new(Arc::new(fixture()));

        for requested in ["one.two.abc", "one.two.five", "one.two.six", "one.two.seven"] {
            let err = delegator.invoke(&container, requested).unwrap_err();
            match &err {
                WakilError::ServiceNotCreated { requested: name, .. } => assert_eq!(name, requested),
                other => panic!("Expected ServiceNotCreated, got: {other:?}"),
            }
            assert!(err.source().is_some());
        }

        assert!(container.calls().is_empty());
    }

    #[test]
    fn invoke_preserves_cause_chain() {
        let delegator = BuildDelegator::new(Arc::new(fixture()));
        let err = delegator
            .invoke(&RecordingContainer::default(), "one.two.abc")
            .unwrap_err();

        let cause = err.source().unwrap();
        assert!(cause.to_string().contains("Unable to traverse config"));
        let root_cause = cause.source().unwrap();
        assert!(root_cause.to_string().contains("\"abc\""));
    }

    #[test]
    fn container_errors_pass_through() {
        let manager = ServiceManager::builder().build().unwrap();
        let delegator = BuildDelegator::new(Arc::new(fixture()));

        let err = delegator.invoke(&manager, "one.two.three").unwrap_err();
        assert!(matches!(err, WakilError::NotFound(e) if e.name == "service"));
    }

    #[test]
    fn factory_uses_requested_name() {
        let container = RecordingContainer::default();
        let factory = BuildDelegator::new(Arc::new(fixture())).into_factory();

        factory(&container, "one.two.three", Some(&ConfigMap::new())).unwrap();
        assert_eq!(container.calls(), vec!["get service"]);
    }

    #[test]
    fn request_display() {
        let fetch = ResolutionRequest::FetchExisting { name: "a".into() };
        assert_eq!(fetch.to_string(), r#"get("a")"#);
        assert_eq!(fetch.name(), "a");

        let build = ResolutionRequest::BuildNew { name: "b".into(), options: ConfigMap::new() };
        assert_eq!(build.to_string(), r#"build("b", {})"#);
    }
}
