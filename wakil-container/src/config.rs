//! Configuration values.
//!
//! [`ConfigValue`] is the read-only, recursively nested value the
//! delegator walks. It deserializes from any self-describing serde
//! format, so an application can hand over whatever it already loaded.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// A mapping from string keys to nested values.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A node of the application configuration tree.
///
/// # Examples
/// ```
/// use wakil_container::config::ConfigValue;
///
/// let value: ConfigValue = serde_json::from_str(r#"{"db": {"url": "postgres://"}}"#).unwrap();
/// assert_eq!(value.get("db").and_then(|db| db.get("url")).and_then(ConfigValue::as_str), Some("postgres://"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Returns the string if this is a terminal string value.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping if this is a mapping.
    #[inline]
    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    #[inline]
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Looks up a direct child of a mapping.
    ///
    /// A child that is present but `null` counts as absent, the same way
    /// dotted-key traversal treats it.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_map()
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "mapping",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::String(s) => write!(f, "{s:?}"),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ConfigValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Map(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(value: Vec<T>) -> Self {
        ConfigValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ConfigValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_json(value: serde_json::Value) -> ConfigValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserialize_every_shape() {
        let value = from_json(json!({
            "null": null,
            "bool": true,
            "int": 7,
            "float": 1.5,
            "string": "svc",
            "list": ["a", 1],
            "map": {"k": "v"}
        }));

        let map = value.as_map().unwrap();
        assert!(map["null"].is_null());
        assert_eq!(map["bool"], ConfigValue::Bool(true));
        assert_eq!(map["int"], ConfigValue::Integer(7));
        assert_eq!(map["float"], ConfigValue::Float(1.5));
        assert_eq!(map["string"].as_str(), Some("svc"));
        assert_eq!(map["list"].as_list().map(<[_]>::len), Some(2));
        assert_eq!(map["map"].get("k").and_then(ConfigValue::as_str), Some("v"));
    }

    #[test]
    fn get_treats_null_as_absent() {
        let value = from_json(json!({"a": null, "b": 1}));
        assert!(value.get("a").is_none());
        assert!(value.get("b").is_some());
        assert!(value.get("c").is_none());
    }

    #[test]
    fn get_on_scalar_is_none() {
        assert!(ConfigValue::from("x").get("x").is_none());
    }

    #[test]
    fn kind_names() {
        assert_eq!(ConfigValue::Null.kind(), "null");
        assert_eq!(ConfigValue::from(3i64).kind(), "integer");
        assert_eq!(ConfigValue::from(vec!["a"]).kind(), "list");
        assert_eq!(ConfigValue::from(ConfigMap::new()).kind(), "mapping");
    }

    #[test]
    fn from_iterator_builds_mapping() {
        let value: ConfigValue = [("k", "v")].into_iter().collect();
        assert_eq!(value.get("k").and_then(ConfigValue::as_str), Some("v"));
    }

    #[test]
    fn display_is_compact() {
        let value = from_json(json!({"a": [1, "x"], "b": null}));
        assert_eq!(format!("{value}"), r#"{"a": [1, "x"], "b": null}"#);
    }
}
