//! Delegator settings.
//!
//! The registration module reads its settings from the application
//! configuration itself, under `wakil.build_delegator`:
//!
//! ```json
//! {
//!   "wakil": {
//!     "build_delegator": {
//!       "keys": ["acl.list_adapter", "acl.resource_manager"],
//!       "strict": false
//!     }
//!   }
//! }
//! ```
//!
//! A missing section means "nothing to delegate".

use tracing::debug;

use crate::config::ConfigValue;
use crate::error::{Result, WakilError};
use crate::key::SEPARATOR;
use crate::path;

/// Top-level configuration key owned by this crate.
pub const CONFIG_ROOT_KEY: &str = "wakil";
/// Section of [`CONFIG_ROOT_KEY`] holding the delegator settings.
pub const CONFIG_MODULE_KEY: &str = "build_delegator";
/// List of dotted keys whose children become delegated services.
pub const CONFIG_KEYS_KEY: &str = "keys";
/// Validate every delegated descriptor at bootstrap.
pub const CONFIG_STRICT_KEY: &str = "strict";

/// Settings for the build delegator module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelegatorSettings {
    /// Dotted keys of the mappings whose children are delegated.
    pub keys: Vec<String>,
    /// Fail bootstrap on the first malformed descriptor instead of on
    /// first use.
    pub strict: bool,
}

impl DelegatorSettings {
    /// The dotted key of the settings section.
    pub fn section_key() -> String {
        format!("{CONFIG_ROOT_KEY}{SEPARATOR}{CONFIG_MODULE_KEY}")
    }

    /// Reads the settings from the application configuration.
    ///
    /// # Errors
    /// Returns [`WakilError::InvalidSetting`] if the section or one of its
    /// entries has the wrong shape.
    pub fn from_config(root: &ConfigValue) -> Result<Self> {
        let section_key = Self::section_key();
        let Ok(section) = path::resolve(root, &section_key) else {
            debug!(section = %section_key, "No delegator settings, using defaults");
            return Ok(Self::default());
        };

        if section.as_map().is_none() {
            return Err(invalid(&section_key, "mapping", section));
        }

        let keys = match section.get(CONFIG_KEYS_KEY) {
            None => Vec::new(),
            Some(ConfigValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        invalid(
                            &format!("{section_key}{SEPARATOR}{CONFIG_KEYS_KEY}[{i}]"),
                            "string",
                            item,
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(invalid(
                    &format!("{section_key}{SEPARATOR}{CONFIG_KEYS_KEY}"),
                    "list",
                    other,
                ));
            }
        };

        let strict = match section.get(CONFIG_STRICT_KEY) {
            None => false,
            Some(value) => value.as_bool().ok_or_else(|| {
                invalid(
                    &format!("{section_key}{SEPARATOR}{CONFIG_STRICT_KEY}"),
                    "bool",
                    value,
                )
            })?,
        };

        Ok(Self { keys, strict })
    }
}

fn invalid(key: &str, expected: &'static str, found: &ConfigValue) -> WakilError {
    WakilError::InvalidSetting {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
