//! Service descriptors.
//!
//! A configuration entry that a delegated key points at is either the
//! name of another service, or a `{service, options}` mapping describing
//! how to build one. [`ServiceDescriptor::classify`] is the single place
//! that decides which.

use crate::config::{ConfigMap, ConfigValue};

/// Key holding the target service name in a buildable descriptor.
pub const SERVICE_KEY: &str = "service";

/// Key holding the build parameters in a buildable descriptor.
pub const OPTIONS_KEY: &str = "options";

/// Classification of a resolved configuration entry.
///
/// # Examples
/// ```
/// use wakil_container::config::ConfigValue;
/// use wakil_container::descriptor::ServiceDescriptor;
///
/// let value = ConfigValue::from("mailer.smtp");
/// assert_eq!(ServiceDescriptor::classify(&value), ServiceDescriptor::Alias("mailer.smtp"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceDescriptor<'a> {
    /// Fetch this service as-is.
    Alias(&'a str),

    /// Build `service` with `options`.
    Buildable {
        service: &'a str,
        options: &'a ConfigMap,
    },

    /// The entry cannot describe a service.
    Invalid(DescriptorDefect),
}

/// What exactly is wrong with an invalid descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorDefect {
    /// Mapping without a (non-null) `service` entry.
    MissingService,
    /// Mapping with `service` but without a (non-null) `options` entry.
    MissingOptions,
    /// `service` is present but not a string.
    ServiceNotString { found: &'static str },
    /// `options` is present but not a mapping.
    OptionsNotMapping { found: &'static str },
    /// Neither a string nor a mapping.
    UnsupportedShape { found: &'static str },
}

impl<'a> ServiceDescriptor<'a> {
    /// Classifies a resolved configuration entry.
    ///
    /// `service` is checked before `options`, so a mapping missing both
    /// reports [`DescriptorDefect::MissingService`].
    pub fn classify(value: &'a ConfigValue) -> Self {
        let map = match value {
            ConfigValue::String(name) => return ServiceDescriptor::Alias(name),
            ConfigValue::Map(map) => map,
            other => {
                return ServiceDescriptor::Invalid(DescriptorDefect::UnsupportedShape {
                    found: other.kind(),
                });
            }
        };

        let service = match map.get(SERVICE_KEY).filter(|v| !v.is_null()) {
            None => return ServiceDescriptor::Invalid(DescriptorDefect::MissingService),
            Some(ConfigValue::String(name)) => name.as_str(),
            Some(other) => {
                return ServiceDescriptor::Invalid(DescriptorDefect::ServiceNotString {
                    found: other.kind(),
                });
            }
        };

        let options = match map.get(OPTIONS_KEY).filter(|v| !v.is_null()) {
            None => return ServiceDescriptor::Invalid(DescriptorDefect::MissingOptions),
            Some(ConfigValue::Map(options)) => options,
            Some(other) => {
                return ServiceDescriptor::Invalid(DescriptorDefect::OptionsNotMapping {
                    found: other.kind(),
                });
            }
        };

        ServiceDescriptor::Buildable { service, options }
    }

    /// Name of the service this descriptor points at, if valid.
    pub fn target(&self) -> Option<&'a str> {
        match *self {
            ServiceDescriptor::Alias(name) => Some(name),
            ServiceDescriptor::Buildable { service, .. } => Some(service),
            ServiceDescriptor::Invalid(_) => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        !matches!(self, ServiceDescriptor::Invalid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn string_is_alias() {
        let value = config(json!("svcName"));
        let descriptor = ServiceDescriptor::classify(&value);
        assert_eq!(descriptor, ServiceDescriptor::Alias("svcName"));
        assert_eq!(descriptor.target(), Some("svcName"));
    }

    #[test]
    fn full_mapping_is_buildable() {
        let value = config(json!({"service": "svcName", "options": {"k": "v"}}));
        match ServiceDescriptor::classify(&value) {
            ServiceDescriptor::Buildable { service, options } => {
                assert_eq!(service, "svcName");
                assert_eq!(options.get("k").and_then(ConfigValue::as_str), Some("v"));
            }
            other => panic!("Expected Buildable, got: {other:?}"),
        }
    }

    #[test]
    fn empty_options_is_buildable() {
        let value = config(json!({"service": "svcName", "options": {}}));
        let descriptor = ServiceDescriptor::classify(&value);
        assert!(descriptor.is_valid());
        assert_eq!(descriptor.target(), Some("svcName"));
    }

    #[test]
    fn extra_keys_ignored() {
        let value = config(json!({"service": "s", "options": {}, "note": 1}));
        assert!(ServiceDescriptor::classify(&value).is_valid());
    }

    #[test]
    fn missing_options() {
        let value = config(json!({"service": "svcName"}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::MissingOptions)
        );
    }

    #[test]
    fn null_options_is_missing() {
        let value = config(json!({"service": "svcName", "options": null}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::MissingOptions)
        );
    }

    #[test]
    fn missing_service() {
        let value = config(json!({"options": {}}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::MissingService)
        );
    }

    #[test]
    fn missing_both_reports_service() {
        let value = config(json!({}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::MissingService)
        );
    }

    #[test]
    fn service_must_be_string() {
        let value = config(json!({"service": 3, "options": {}}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::ServiceNotString { found: "integer" })
        );
    }

    #[test]
    fn options_must_be_mapping() {
        let value = config(json!({"service": "s", "options": ["a"]}));
        assert_eq!(
            ServiceDescriptor::classify(&value),
            ServiceDescriptor::Invalid(DescriptorDefect::OptionsNotMapping { found: "list" })
        );
    }

    #[test]
    fn scalars_are_unsupported() {
        for (value, kind) in [
            (json!(true), "bool"),
            (json!(1), "integer"),
            (json!(2.5), "float"),
            (json!(["a"]), "list"),
            (json!(null), "null"),
        ] {
            let value = config(value);
            let descriptor = ServiceDescriptor::classify(&value);
            assert_eq!(
                descriptor,
                ServiceDescriptor::Invalid(DescriptorDefect::UnsupportedShape { found: kind })
            );
            assert_eq!(descriptor.target(), None);
        }
    }
}
